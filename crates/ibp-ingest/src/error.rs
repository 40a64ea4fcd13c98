//! Error types for bronze ingestion
//!
//! A skipped duplicate is not an error: it surfaces as
//! [`IngestOutcome::Skipped`](crate::loader::IngestOutcome).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error type for bronze ingestion
#[derive(Error, Debug)]
pub enum IngestError {
    /// The given input path does not exist
    #[error("Path not found: '{0}'. Verify the path exists and is readable.")]
    InputNotFound(PathBuf),

    /// A directory selection matched no spreadsheet files
    #[error("No .xlsx files found under '{0}'.")]
    NoInputFiles(PathBuf),

    /// Malformed or unreadable spreadsheet content
    #[error("Failed to read spreadsheet: {0}")]
    Excel(#[from] calamine::Error),

    /// Storage failure during a batch write or ledger update
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File system operation failed
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ibp_common::IbpError> for IngestError {
    fn from(err: ibp_common::IbpError) -> Self {
        match err {
            ibp_common::IbpError::Io(e) => IngestError::Io(e),
        }
    }
}
