//! Message rows: the shared board itself.
//!
//! ```sql
//! create table messages(
//!   id SERIAL PRIMARY KEY,
//!   name VARCHAR(30) NOT NULL,
//!   message VARCHAR(140) NOT NULL
//! );
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use utoipa::ToSchema;

/// One board message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageRow {
    pub id: i32,
    pub name: String,
    pub message: String,
}

/// Board persistence, consumed by the message handlers.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn all(&self) -> Result<Vec<MessageRow>>;
    /// Contains-search over the message text.
    async fn search(&self, keyword: &str) -> Result<Vec<MessageRow>>;
    async fn create(&self, name: &str, message: &str) -> Result<()>;
    async fn delete_all(&self) -> Result<()>;
}

pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn rows_to_messages(rows: Vec<sqlx::postgres::PgRow>) -> Vec<MessageRow> {
    rows.into_iter()
        .map(|row| MessageRow {
            id: row.get("id"),
            name: row.get("name"),
            message: row.get("message"),
        })
        .collect()
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn all(&self) -> Result<Vec<MessageRow>> {
        let query = "SELECT id, name, message FROM messages ORDER BY id";
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
            .context("failed to load messages")?;
        Ok(rows_to_messages(rows))
    }

    async fn search(&self, keyword: &str) -> Result<Vec<MessageRow>> {
        let query = "SELECT id, name, message FROM messages WHERE message LIKE $1 ORDER BY id";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        // The wildcards are part of the bound value, never of the statement.
        let rows = sqlx::query(query)
            .bind(format!("%{keyword}%"))
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to search messages")?;
        Ok(rows_to_messages(rows))
    }

    async fn create(&self, name: &str, message: &str) -> Result<()> {
        let query = "INSERT INTO messages(name, message) VALUES($1, $2)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(name)
            .bind(message)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to create message")?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        let query = "DELETE FROM messages";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to clear messages")?;
        Ok(())
    }
}
