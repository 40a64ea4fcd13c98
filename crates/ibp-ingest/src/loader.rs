//! Ingestion orchestrator.
//!
//! Composes the content hasher, file registry, load-event ledger, and row
//! sink into one per-file operation. The flow is hash → identify → dedup
//! check → begin event → stream rows in batches → finalize, with exactly one
//! terminal ledger transition per event on every exit path.
//!
//! On prior success for the same content the loader returns
//! [`IngestOutcome::Skipped`] without creating an event or touching rows:
//! re-ingesting a byte-identical file is a safe no-op even under a different
//! name or path. On failure after `begin`, the FAILED audit row is written
//! best-effort before the original error propagates; an audit write failure
//! is logged and never masks the real error.

use std::path::Path;
use uuid::Uuid;

use ibp_common::checksum;

use crate::batch::{BronzeRow, RowSink, DEFAULT_BATCH_SIZE};
use crate::error::{IngestError, Result};
use crate::excel;
use crate::ledger::LoadEventLedger;
use crate::registry::FileRegistry;

/// Default fixed row width for invoice exports.
pub const DEFAULT_EXPECTED_COLS: usize = 244;

/// Default minimum populated cells for a row to count as data.
pub const DEFAULT_MIN_NON_NULL: usize = 1;

/// Loader version stamped on every load event.
pub const LOADER_VERSION: &str = "v1";

/// Tuning knobs for one loader instance, constructed once at startup.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Rows are padded or truncated to this width.
    pub expected_cols: usize,
    /// Rows with fewer populated cells are filtered upstream.
    pub min_non_null: usize,
    /// Rows per batch write.
    pub batch_size: usize,
    /// Version tag recorded on each load event.
    pub loader_version: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            expected_cols: DEFAULT_EXPECTED_COLS,
            min_non_null: DEFAULT_MIN_NON_NULL,
            batch_size: DEFAULT_BATCH_SIZE,
            loader_version: LOADER_VERSION.to_string(),
        }
    }
}

/// Result of one per-file ingestion operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The file's content already has a successful load; nothing was written.
    Skipped { file_id: Uuid },
    /// A fresh load completed.
    Loaded {
        file_id: Uuid,
        load_event_id: Uuid,
        rows_read: u64,
        rows_inserted: u64,
    },
}

/// Identity of a file as seen by the registry: content digest plus metadata.
#[derive(Debug, Clone)]
struct FileIdentity {
    hash: String,
    filename: String,
    size_bytes: i64,
}

impl FileIdentity {
    fn from_path(path: &Path) -> Result<Self> {
        let hash = checksum::sha256_file(path)?;
        let size_bytes = std::fs::metadata(path)?.len() as i64;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            hash,
            filename,
            size_bytes,
        })
    }
}

/// Outcome of draining the row stream, carrying partial counts on failure.
struct PumpOutcome {
    rows_read: u64,
    rows_inserted: u64,
    error: Option<IngestError>,
}

/// The only component callers invoke directly.
pub struct BronzeLoader<'a> {
    registry: &'a dyn FileRegistry,
    ledger: &'a dyn LoadEventLedger,
    sink: &'a dyn RowSink,
    options: IngestOptions,
}

impl<'a> BronzeLoader<'a> {
    pub fn new(
        registry: &'a dyn FileRegistry,
        ledger: &'a dyn LoadEventLedger,
        sink: &'a dyn RowSink,
        options: IngestOptions,
    ) -> Self {
        Self {
            registry,
            ledger,
            sink,
            options,
        }
    }

    /// Ingest one spreadsheet file into the bronze layer.
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest(&self, path: &Path) -> Result<IngestOutcome> {
        let identity = FileIdentity::from_path(path)?;
        self.ingest_identified(identity, || {
            excel::read_invoice_rows(path, self.options.expected_cols, self.options.min_non_null)
        })
        .await
    }

    /// Core flow, parameterized over the row source so the streaming and
    /// finalization logic is testable without real workbooks.
    async fn ingest_identified<I, F>(
        &self,
        identity: FileIdentity,
        open_rows: F,
    ) -> Result<IngestOutcome>
    where
        I: Iterator<Item = std::result::Result<Vec<Option<String>>, calamine::Error>>,
        F: FnOnce() -> std::result::Result<I, calamine::Error>,
    {
        let (file_id, was_created) = self
            .registry
            .identify(&identity.hash, &identity.filename, identity.size_bytes)
            .await?;

        // Dedup guardrail: byte-identical content with a prior successful
        // load is never reprocessed, regardless of filename.
        if self.ledger.has_successful_attempt(file_id).await? {
            tracing::info!(%file_id, filename = %identity.filename, "Skipping already-loaded file");
            return Ok(IngestOutcome::Skipped { file_id });
        }

        if !was_created {
            tracing::debug!(%file_id, "Known file without successful load, retrying");
        }

        let load_event_id = self
            .ledger
            .begin(file_id, &self.options.loader_version)
            .await?;

        let outcome = self.pump(file_id, load_event_id, open_rows).await;
        self.finalize(file_id, load_event_id, outcome).await
    }

    /// Drain the row stream into batched writes. Never touches the ledger;
    /// failures are carried out with the counts accumulated so far.
    async fn pump<I, F>(&self, file_id: Uuid, load_event_id: Uuid, open_rows: F) -> PumpOutcome
    where
        I: Iterator<Item = std::result::Result<Vec<Option<String>>, calamine::Error>>,
        F: FnOnce() -> std::result::Result<I, calamine::Error>,
    {
        let mut rows_read: u64 = 0;
        let mut rows_inserted: u64 = 0;
        let mut buffer: Vec<BronzeRow> = Vec::with_capacity(self.options.batch_size);

        macro_rules! fail {
            ($err:expr) => {
                return PumpOutcome {
                    rows_read,
                    rows_inserted,
                    error: Some($err),
                }
            };
        }

        let rows = match open_rows() {
            Ok(rows) => rows,
            Err(e) => fail!(e.into()),
        };

        for row in rows {
            let raw_values = match row {
                Ok(values) => values,
                Err(e) => fail!(e.into()),
            };

            rows_read += 1;
            buffer.push(BronzeRow {
                file_id,
                load_event_id,
                row_number: rows_read as i32,
                raw_values,
            });

            if buffer.len() >= self.options.batch_size {
                match self.sink.write_batch(&buffer).await {
                    Ok(inserted) => {
                        rows_inserted += inserted;
                        buffer.clear();
                    },
                    Err(e) => fail!(e),
                }
            }
        }

        if !buffer.is_empty() {
            match self.sink.write_batch(&buffer).await {
                Ok(inserted) => rows_inserted += inserted,
                Err(e) => fail!(e),
            }
        }

        PumpOutcome {
            rows_read,
            rows_inserted,
            error: None,
        }
    }

    /// Single exit path: exactly one terminal ledger transition per event.
    async fn finalize(
        &self,
        file_id: Uuid,
        load_event_id: Uuid,
        outcome: PumpOutcome,
    ) -> Result<IngestOutcome> {
        let PumpOutcome {
            rows_read,
            rows_inserted,
            error,
        } = outcome;

        let error = match error {
            None => {
                match self
                    .ledger
                    .complete_success(load_event_id, rows_read, rows_inserted)
                    .await
                {
                    Ok(()) => {
                        tracing::info!(%file_id, %load_event_id, rows_read, rows_inserted, "File loaded");
                        return Ok(IngestOutcome::Loaded {
                            file_id,
                            load_event_id,
                            rows_read,
                            rows_inserted,
                        });
                    },
                    Err(e) => e,
                }
            },
            Some(e) => e,
        };

        // Best-effort audit record; the original failure always propagates.
        if let Err(audit_err) = self
            .ledger
            .complete_failure(load_event_id, rows_read, rows_inserted, &error.to_string())
            .await
        {
            tracing::warn!(
                %load_event_id,
                error = %audit_err,
                "Failed to record FAILED load event"
            );
        }

        tracing::error!(%file_id, %load_event_id, rows_read, error = %error, "Ingestion failed");
        Err(error)
    }
}
