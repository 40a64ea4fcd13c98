//! IBP Ingest Library
//!
//! Ingestion of spreadsheet invoice files into the append-only bronze layer.
//!
//! # Overview
//!
//! The bronze loader guarantees that re-ingesting a byte-identical file is a
//! safe no-op and that every ingestion attempt leaves a durable audit record:
//!
//! - [`registry`]: content-addressed file identity (dedup keyed by SHA-256)
//! - [`ledger`]: one load-event state machine per ingestion attempt
//! - [`batch`]: idempotent, conflict-tolerant batched row writes
//! - [`excel`]: fixed-width nullable-string row normalization
//! - [`loader`]: the orchestrator callers invoke
//!
//! # Example
//!
//! ```no_run
//! use ibp_ingest::loader::{BronzeLoader, IngestOptions};
//! use ibp_ingest::{batch::PgRowSink, ledger::PgLoadEventLedger, registry::PgFileRegistry};
//!
//! # async fn run(pool: sqlx::PgPool) -> Result<(), ibp_ingest::IngestError> {
//! let registry = PgFileRegistry::new(pool.clone());
//! let ledger = PgLoadEventLedger::new(pool.clone());
//! let sink = PgRowSink::new(pool);
//! let loader = BronzeLoader::new(&registry, &ledger, &sink, IngestOptions::default());
//!
//! let outcome = loader.ingest("data/INVOICE_20250823.xlsx".as_ref()).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod error;
pub mod excel;
pub mod input;
pub mod ledger;
pub mod loader;
pub mod registry;

pub use error::{IngestError, Result};
pub use loader::{BronzeLoader, IngestOptions, IngestOutcome};

/// Migrations for the bronze schema, applied by `ibp migrate`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
