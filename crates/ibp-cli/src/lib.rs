//! IBP CLI Library
//!
//! Command implementations for the `ibp` binary: bronze ingestion, schema
//! migration, post-ingestion archival, and staging-view generation.

pub mod archive;
pub mod commands;
pub mod config;
