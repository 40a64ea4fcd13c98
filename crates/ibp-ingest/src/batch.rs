//! Idempotent batched row persistence.
//!
//! Rows land in `bronze.invoice_row` via one multi-row INSERT per batch with
//! `ON CONFLICT (load_event_id, row_number) DO NOTHING`: re-submitting a
//! batch neither fails nor duplicates rows. The returned count is the
//! driver's affected-row count, i.e. rows actually persisted after conflict
//! skipping.
//!
//! `raw_values` is bound as a single jsonb array of nullable strings, so even
//! a 244-column row costs four bind parameters and a full batch stays far
//! below Postgres's parameter limit.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::Result;

/// Default rows per INSERT. Bounds per-write memory and statement size.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// One normalized source row bound for insertion.
#[derive(Debug, Clone)]
pub struct BronzeRow {
    pub file_id: Uuid,
    pub load_event_id: Uuid,
    /// 1-based position in the source stream.
    pub row_number: i32,
    pub raw_values: Vec<Option<String>>,
}

/// Writes normalized rows to the bronze row ledger.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Persist a batch, skipping `(load_event_id, row_number)` conflicts.
    /// Returns the number of rows actually inserted.
    async fn write_batch(&self, rows: &[BronzeRow]) -> Result<u64>;
}

/// Postgres-backed sink over `bronze.invoice_row`.
pub struct PgRowSink {
    pool: PgPool,
}

impl PgRowSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RowSink for PgRowSink {
    async fn write_batch(&self, rows: &[BronzeRow]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO bronze.invoice_row (file_id, load_event_id, row_number, raw_values) ",
        );

        builder.push_values(rows, |mut b, row| {
            b.push_bind(row.file_id)
                .push_bind(row.load_event_id)
                .push_bind(row.row_number)
                .push_bind(Json(&row.raw_values));
        });
        builder.push(" ON CONFLICT (load_event_id, row_number) DO NOTHING");

        let result = builder.build().execute(&self.pool).await?;
        let inserted = result.rows_affected();

        if inserted < rows.len() as u64 {
            tracing::debug!(
                submitted = rows.len(),
                inserted,
                "Batch write skipped conflicting rows"
            );
        }

        Ok(inserted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ledger::{LoadEventLedger, PgLoadEventLedger};
    use crate::registry::{FileRegistry, PgFileRegistry};

    async fn seed_load_event(pool: &PgPool) -> (Uuid, Uuid) {
        let registry = PgFileRegistry::new(pool.clone());
        let (file_id, _) = registry
            .identify(&"0f".repeat(32), "INVOICE_20250823.xlsx", 2048)
            .await
            .unwrap();

        let ledger = PgLoadEventLedger::new(pool.clone());
        let load_event_id = ledger.begin(file_id, "v1").await.unwrap();
        (file_id, load_event_id)
    }

    fn rows(
        file_id: Uuid,
        load_event_id: Uuid,
        numbers: std::ops::RangeInclusive<i32>,
    ) -> Vec<BronzeRow> {
        numbers
            .map(|n| BronzeRow {
                file_id,
                load_event_id,
                row_number: n,
                raw_values: vec![Some(format!("cell {}", n)), None],
            })
            .collect()
    }

    async fn row_count(pool: &PgPool, load_event_id: Uuid) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM bronze.invoice_row WHERE load_event_id = $1",
        )
        .bind(load_event_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_reissued_batch_inserts_nothing(pool: PgPool) {
        let sink = PgRowSink::new(pool.clone());
        let (file_id, load_event_id) = seed_load_event(&pool).await;
        let batch = rows(file_id, load_event_id, 1..=5);

        assert_eq!(sink.write_batch(&batch).await.unwrap(), 5);
        assert_eq!(sink.write_batch(&batch).await.unwrap(), 0);
        assert_eq!(row_count(&pool, load_event_id).await, 5);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_overlapping_batch_inserts_only_new_rows(pool: PgPool) {
        let sink = PgRowSink::new(pool.clone());
        let (file_id, load_event_id) = seed_load_event(&pool).await;

        let first = rows(file_id, load_event_id, 1..=5);
        let overlap = rows(file_id, load_event_id, 4..=8);

        assert_eq!(sink.write_batch(&first).await.unwrap(), 5);
        assert_eq!(sink.write_batch(&overlap).await.unwrap(), 3);
        assert_eq!(row_count(&pool, load_event_id).await, 8);
    }
}
