//! `ibp ingest` command implementation
//!
//! Ingests one file or every `.xlsx` file in a directory, strictly in order,
//! over a single connection pool. A skipped duplicate is reported distinctly
//! from a load and is never an error; the first real failure aborts the run
//! after its FAILED audit row has been written.

use anyhow::Context;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use ibp_ingest::batch::PgRowSink;
use ibp_ingest::input::select_input_files;
use ibp_ingest::ledger::PgLoadEventLedger;
use ibp_ingest::loader::{BronzeLoader, IngestOutcome};
use ibp_ingest::registry::PgFileRegistry;

use crate::archive::archive_file;
use crate::config::Settings;

/// Run the ingest command.
pub async fn run(
    settings: &Settings,
    path: &Path,
    archive: bool,
    processed_dir: &Path,
) -> anyhow::Result<()> {
    let files = select_input_files(path)?;
    tracing::info!(count = files.len(), "Selected input files");

    let pool = settings.connect().await?;
    let registry = PgFileRegistry::new(pool.clone());
    let ledger = PgLoadEventLedger::new(pool.clone());
    let sink = PgRowSink::new(pool.clone());
    let loader = BronzeLoader::new(&registry, &ledger, &sink, settings.ingest.clone());

    for file in &files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());

        let spinner = file_spinner(&name);
        let outcome = loader.ingest(file).await;
        spinner.finish_and_clear();

        match outcome? {
            IngestOutcome::Skipped { file_id } => {
                println!("\n{} {}", "Skipped (already loaded):".yellow(), name);
                println!("  file_id: {}", file_id);
            },
            IngestOutcome::Loaded {
                file_id,
                load_event_id,
                rows_read,
                rows_inserted,
            } => {
                println!("\n{} {}", "Loaded:".green(), name);
                println!("  file_id: {}", file_id);
                println!("  load_event_id: {}", load_event_id);
                println!("  rows_read: {}", rows_read);
                println!("  rows_inserted: {}", rows_inserted);

                if archive {
                    let dest = archive_file(file, processed_dir)
                        .with_context(|| format!("Failed to archive {}", file.display()))?;
                    println!("  archived_to: {}", dest.display());
                }
            },
        }
    }

    pool.close().await;
    Ok(())
}

fn file_spinner(name: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Loading {}", name));
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
