//! IBP Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling, logging bootstrap, and content hashing for the
//! invoice bronze platform workspace.
//!
//! # Example
//!
//! ```no_run
//! use ibp_common::{Result, checksum};
//!
//! fn identify(path: &str) -> Result<()> {
//!     let digest = checksum::sha256_file(path)?;
//!     println!("content hash: {}", digest);
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{IbpError, Result};
