//! Content-addressed file registry.
//!
//! Maps a SHA-256 content digest to a stable `file_id`. Two byte-identical
//! files always resolve to the same identity regardless of filename or path;
//! the UNIQUE constraint on the hash column is the only guard against two
//! records racing into existence for the same content. Records are immutable
//! once created.

use async_trait::async_trait;
use sqlx::PgPool;
use std::path::Path;
use uuid::Uuid;

use crate::error::Result;

/// Resolves file identity by content digest.
#[async_trait]
pub trait FileRegistry: Send + Sync {
    /// Look up or create the registry record for a content hash.
    ///
    /// Returns the stable `file_id` and whether a new record was created.
    /// An existing record is never mutated.
    async fn identify(&self, hash: &str, filename: &str, size_bytes: i64)
        -> Result<(Uuid, bool)>;
}

/// Postgres-backed registry over `bronze.file_registry`.
pub struct PgFileRegistry {
    pool: PgPool,
}

impl PgFileRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRegistry for PgFileRegistry {
    async fn identify(
        &self,
        hash: &str,
        filename: &str,
        size_bytes: i64,
    ) -> Result<(Uuid, bool)> {
        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT file_id FROM bronze.file_registry WHERE file_hash_sha256 = $1",
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(file_id) = existing {
            tracing::debug!(%file_id, hash, "File already registered");
            return Ok((file_id, false));
        }

        let billing_period = detect_billing_period(filename);

        let file_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO bronze.file_registry
              (original_filename, file_hash_sha256, file_size_bytes, detected_billing_period)
            VALUES ($1, $2, $3, $4)
            RETURNING file_id
            "#,
        )
        .bind(filename)
        .bind(hash)
        .bind(size_bytes)
        .bind(billing_period.as_deref())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(%file_id, filename, size_bytes, ?billing_period, "Registered new file");
        Ok((file_id, true))
    }
}

/// Best-effort billing-period token from a filename.
///
/// Takes the final underscore-separated piece of the stem; accepts it verbatim
/// when it is all digits and exactly 6 or 8 characters (e.g. `082325` or
/// `20250823`). No calendar validation, no format disambiguation: the token is
/// opaque text for downstream interpretation.
pub fn detect_billing_period(filename: &str) -> Option<String> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    let last = stem.rsplit('_').next()?;

    let is_digits = !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit());
    if is_digits && (last.len() == 6 || last.len() == 8) {
        Some(last.to_string())
    } else {
        None
    }
}
