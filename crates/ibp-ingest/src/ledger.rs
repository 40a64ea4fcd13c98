//! Load-event ledger.
//!
//! One state-machine instance per ingestion attempt: STARTED, then exactly
//! one terminal transition to SUCCESS or FAILED. Multiple events may exist
//! per file (one per attempt); dedup only asks whether any attempt succeeded.
//!
//! Every statement here runs on its own pooled connection in autocommit, so a
//! FAILED audit row stays durable no matter what happens to the row writes,
//! and one file's failure cannot poison transaction state for the next file.
//!
//! The ledger does not guard against double finalization of the same event;
//! the loader finalizes exactly once per event on every exit path.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

/// Upper bound on stored failure messages.
pub const ERROR_MESSAGE_CAP: usize = 5000;

/// Terminal and non-terminal load-event states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Started,
    Success,
    Failed,
}

impl LoadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadStatus::Started => "STARTED",
            LoadStatus::Success => "SUCCESS",
            LoadStatus::Failed => "FAILED",
        }
    }
}

/// Records the lifecycle of ingestion attempts.
#[async_trait]
pub trait LoadEventLedger: Send + Sync {
    /// True iff any load event for this file reached SUCCESS. The sole dedup gate.
    async fn has_successful_attempt(&self, file_id: Uuid) -> Result<bool>;

    /// Create a STARTED event. Always permitted, including after prior
    /// failures or successes; the loader short-circuits on prior success
    /// before calling this.
    async fn begin(&self, file_id: Uuid, loader_version: &str) -> Result<Uuid>;

    /// Transition to SUCCESS, stamping completion time and clearing any error.
    async fn complete_success(
        &self,
        load_event_id: Uuid,
        rows_read: u64,
        rows_inserted: u64,
    ) -> Result<()>;

    /// Transition to FAILED, stamping completion time and storing the message
    /// truncated to [`ERROR_MESSAGE_CAP`].
    async fn complete_failure(
        &self,
        load_event_id: Uuid,
        rows_read: u64,
        rows_inserted: u64,
        error_message: &str,
    ) -> Result<()>;
}

/// Postgres-backed ledger over `bronze.load_event`.
pub struct PgLoadEventLedger {
    pool: PgPool,
}

impl PgLoadEventLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoadEventLedger for PgLoadEventLedger {
    async fn has_successful_attempt(&self, file_id: Uuid) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT 1
            FROM bronze.load_event
            WHERE file_id = $1 AND status = $2
            LIMIT 1
            "#,
        )
        .bind(file_id)
        .bind(LoadStatus::Success.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    async fn begin(&self, file_id: Uuid, loader_version: &str) -> Result<Uuid> {
        let load_event_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO bronze.load_event (file_id, status, loader_version)
            VALUES ($1, $2, $3)
            RETURNING load_event_id
            "#,
        )
        .bind(file_id)
        .bind(LoadStatus::Started.as_str())
        .bind(loader_version)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(%file_id, %load_event_id, loader_version, "Load event started");
        Ok(load_event_id)
    }

    async fn complete_success(
        &self,
        load_event_id: Uuid,
        rows_read: u64,
        rows_inserted: u64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE bronze.load_event
            SET status = $1,
                finished_at = now(),
                rows_read = $2,
                rows_inserted = $3,
                error_message = NULL
            WHERE load_event_id = $4
            "#,
        )
        .bind(LoadStatus::Success.as_str())
        .bind(rows_read as i64)
        .bind(rows_inserted as i64)
        .bind(load_event_id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(%load_event_id, rows_read, rows_inserted, "Load event succeeded");
        Ok(())
    }

    async fn complete_failure(
        &self,
        load_event_id: Uuid,
        rows_read: u64,
        rows_inserted: u64,
        error_message: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE bronze.load_event
            SET status = $1,
                finished_at = now(),
                rows_read = $2,
                rows_inserted = $3,
                error_message = $4
            WHERE load_event_id = $5
            "#,
        )
        .bind(LoadStatus::Failed.as_str())
        .bind(rows_read as i64)
        .bind(rows_inserted as i64)
        .bind(truncate_error(error_message))
        .bind(load_event_id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(%load_event_id, rows_read, rows_inserted, "Load event failed");
        Ok(())
    }
}

/// Cap a failure message at [`ERROR_MESSAGE_CAP`] characters, respecting
/// char boundaries.
pub fn truncate_error(message: &str) -> &str {
    match message.char_indices().nth(ERROR_MESSAGE_CAP) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}
