//! `ibp` command implementations

pub mod ingest;
pub mod migrate;
pub mod stage;
