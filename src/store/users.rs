//! User rows: credential lookup and administrative maintenance.
//!
//! Backing table, one row per user with its role; `password` must be wide
//! enough for the encoded hash output:
//!
//! ```sql
//! create table users(
//!   name VARCHAR(30) PRIMARY KEY,
//!   role VARCHAR(30) NOT NULL,
//!   password VARCHAR(160) NOT NULL
//! );
//! ```
//!
//! Credential lookup still aggregates every role row found for a name, so a
//! schema that grants several roles per user keeps working unchanged.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgPool, Row};
use std::collections::BTreeSet;
use tracing::Instrument;
use utoipa::ToSchema;

use crate::auth::identity::{CredentialRecord, CredentialStore};
use crate::auth::principal::Role;

use super::is_unique_violation;

/// One user row as listed on the admin page. The stored hash never leaves
/// the store.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserRow {
    pub name: String,
    pub role: String,
}

/// Outcome when creating a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The name already exists; reported to the admin, not an error.
    Conflict,
}

/// Administrative user maintenance, consumed by the admin handlers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> Result<Vec<UserRow>>;
    async fn create(&self, name: &str, role: Role, password_hash: &str) -> Result<CreateOutcome>;
    /// Update role and, when `password_hash` is `Some`, the stored hash.
    /// `None` keeps the existing hash untouched.
    async fn update(&self, name: &str, role: Role, password_hash: Option<&str>) -> Result<()>;
    async fn delete(&self, name: &str) -> Result<()>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgUserStore {
    async fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>> {
        let query = "SELECT role, password FROM users WHERE name = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .bind(username)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup credentials")?;

        let mut roles = BTreeSet::new();
        let mut password_hash: Option<String> = None;
        for row in &rows {
            let role: String = row.get("role");
            // Role names outside the declared set grant nothing.
            if let Some(role) = Role::parse(&role) {
                roles.insert(role);
            }
            if password_hash.is_none() {
                password_hash = Some(row.get("password"));
            }
        }

        Ok(password_hash.map(|password_hash| CredentialRecord {
            password_hash,
            roles,
        }))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> Result<Vec<UserRow>> {
        let query = "SELECT name, role FROM users ORDER BY name";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list users")?;

        Ok(rows
            .into_iter()
            .map(|row| UserRow {
                name: row.get("name"),
                role: row.get("role"),
            })
            .collect())
    }

    async fn create(&self, name: &str, role: Role, password_hash: &str) -> Result<CreateOutcome> {
        let query = "INSERT INTO users(name, role, password) VALUES($1, $2, $3)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        match sqlx::query(query)
            .bind(name)
            .bind(role.as_str())
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
        {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err).context("failed to create user"),
        }
    }

    async fn update(&self, name: &str, role: Role, password_hash: Option<&str>) -> Result<()> {
        match password_hash {
            Some(password_hash) => {
                let query = "UPDATE users SET role = $2, password = $3 WHERE name = $1";
                let span = tracing::info_span!(
                    "db.query",
                    db.system = "postgresql",
                    db.operation = "UPDATE",
                    db.statement = query
                );
                sqlx::query(query)
                    .bind(name)
                    .bind(role.as_str())
                    .bind(password_hash)
                    .execute(&self.pool)
                    .instrument(span)
                    .await
                    .context("failed to update user")?;
            }
            None => {
                let query = "UPDATE users SET role = $2 WHERE name = $1";
                let span = tracing::info_span!(
                    "db.query",
                    db.system = "postgresql",
                    db.operation = "UPDATE",
                    db.statement = query
                );
                sqlx::query(query)
                    .bind(name)
                    .bind(role.as_str())
                    .execute(&self.pool)
                    .instrument(span)
                    .await
                    .context("failed to update user")?;
            }
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let query = "DELETE FROM users WHERE name = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(name)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete user")?;
        Ok(())
    }
}
