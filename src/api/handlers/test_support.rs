//! In-memory store doubles and a wired test application.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{AppState, router};
use crate::auth::{
    audit::RequestAuditLogger,
    hash::{self, HashParameters},
    identity::{CredentialRecord, CredentialStore},
    principal::Role,
};
use crate::store::messages::{MessageRow, MessageStore};
use crate::store::users::{CreateOutcome, UserRow, UserStore};

/// Fast parameters for tests; production defaults would make every login take
/// ~100ms of key derivation.
pub(crate) fn test_params() -> HashParameters {
    HashParameters::new(1000, 16).expect("valid test parameters")
}

#[derive(Debug, Clone)]
struct StoredUser {
    name: String,
    role: Role,
    password_hash: String,
}

#[derive(Default)]
pub(crate) struct MemoryUserStore {
    rows: Mutex<Vec<StoredUser>>,
}

impl MemoryUserStore {
    pub(crate) fn seed(&self, name: &str, role: Role, password: &str) -> Result<()> {
        let password_hash = hash::hash_password(password, &test_params())?;
        self.rows.lock().expect("user store lock").push(StoredUser {
            name: name.to_string(),
            role,
            password_hash,
        });
        Ok(())
    }

    pub(crate) fn password_hash_of(&self, name: &str) -> Option<String> {
        self.rows
            .lock()
            .expect("user store lock")
            .iter()
            .find(|row| row.name == name)
            .map(|row| row.password_hash.clone())
    }
}

#[async_trait]
impl CredentialStore for MemoryUserStore {
    async fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>> {
        let rows = self.rows.lock().expect("user store lock");
        let mut roles = BTreeSet::new();
        let mut password_hash = None;
        for row in rows.iter().filter(|row| row.name == username) {
            roles.insert(row.role);
            if password_hash.is_none() {
                password_hash = Some(row.password_hash.clone());
            }
        }
        Ok(password_hash.map(|password_hash| CredentialRecord {
            password_hash,
            roles,
        }))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> Result<Vec<UserRow>> {
        let rows = self.rows.lock().expect("user store lock");
        Ok(rows
            .iter()
            .map(|row| UserRow {
                name: row.name.clone(),
                role: row.role.as_str().to_string(),
            })
            .collect())
    }

    async fn create(&self, name: &str, role: Role, password_hash: &str) -> Result<CreateOutcome> {
        let mut rows = self.rows.lock().expect("user store lock");
        if rows.iter().any(|row| row.name == name) {
            return Ok(CreateOutcome::Conflict);
        }
        rows.push(StoredUser {
            name: name.to_string(),
            role,
            password_hash: password_hash.to_string(),
        });
        Ok(CreateOutcome::Created)
    }

    async fn update(&self, name: &str, role: Role, password_hash: Option<&str>) -> Result<()> {
        let mut rows = self.rows.lock().expect("user store lock");
        for row in rows.iter_mut().filter(|row| row.name == name) {
            row.role = role;
            if let Some(password_hash) = password_hash {
                row.password_hash = password_hash.to_string();
            }
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut rows = self.rows.lock().expect("user store lock");
        rows.retain(|row| row.name != name);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryMessageStore {
    rows: Mutex<Vec<MessageRow>>,
    pub(crate) fail: Mutex<bool>,
}

impl MemoryMessageStore {
    fn check_available(&self) -> Result<()> {
        if *self.fail.lock().expect("message store lock") {
            Err(anyhow!("message store unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn all(&self) -> Result<Vec<MessageRow>> {
        self.check_available()?;
        Ok(self.rows.lock().expect("message store lock").clone())
    }

    async fn search(&self, keyword: &str) -> Result<Vec<MessageRow>> {
        self.check_available()?;
        let rows = self.rows.lock().expect("message store lock");
        Ok(rows
            .iter()
            .filter(|row| row.message.contains(keyword))
            .cloned()
            .collect())
    }

    async fn create(&self, name: &str, message: &str) -> Result<()> {
        self.check_available()?;
        let mut rows = self.rows.lock().expect("message store lock");
        let id = i32::try_from(rows.len()).unwrap_or(i32::MAX) + 1;
        rows.push(MessageRow {
            id,
            name: name.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        self.check_available()?;
        self.rows.lock().expect("message store lock").clear();
        Ok(())
    }
}

/// Captures audit entries so tests can assert every access leaves a trail.
#[derive(Default)]
pub(crate) struct RecordingAuditLogger {
    pub(crate) entries: Mutex<Vec<(Option<String>, String, String)>>,
}

impl RequestAuditLogger for RecordingAuditLogger {
    fn record(&self, user: Option<&str>, addr: &str, target: &str) {
        self.entries.lock().expect("audit lock").push((
            user.map(str::to_string),
            addr.to_string(),
            target.to_string(),
        ));
    }
}

pub(crate) struct TestApp {
    pub(crate) router: Router,
    pub(crate) state: AppState,
    pub(crate) users: Arc<MemoryUserStore>,
    pub(crate) messages: Arc<MemoryMessageStore>,
    pub(crate) audit: Arc<RecordingAuditLogger>,
}

/// Wire the real router over in-memory stores seeded with one admin and two
/// plain users.
pub(crate) fn test_app() -> Result<TestApp> {
    let users = Arc::new(MemoryUserStore::default());
    users.seed("alice", Role::User, "password-alice")?;
    users.seed("bob", Role::User, "correct-password")?;
    users.seed("root", Role::Admin, "password-root1")?;

    let messages = Arc::new(MemoryMessageStore::default());
    let audit = Arc::new(RecordingAuditLogger::default());

    let state = AppState::new(
        users.clone(),
        messages.clone(),
        audit.clone(),
        test_params(),
        Duration::from_secs(60),
    )?;

    Ok(TestApp {
        router: router(state.clone()),
        state,
        users,
        messages,
        audit,
    })
}
