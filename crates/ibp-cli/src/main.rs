//! IBP - invoice bronze ingestion CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use ibp_cli::commands;
use ibp_cli::config::Settings;
use ibp_common::logging::{init_logging, LogConfig, LogLevel};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ibp")]
#[command(author, version, about = "Invoice billing bronze-layer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest invoice .xlsx file(s) into the bronze layer
    Ingest {
        /// Path to a file or directory containing .xlsx files
        #[arg(long)]
        path: PathBuf,

        /// Move successfully ingested files to the processed archive
        #[arg(long)]
        archive: bool,

        /// Processed/archive root directory
        #[arg(long, default_value = "data/processed")]
        processed_dir: PathBuf,
    },

    /// Apply bronze schema migrations
    Migrate,

    /// Generate the staging view over the bronze row ledger
    GenerateStaging {
        /// Invoice header CSV (one row of column names)
        #[arg(long)]
        header: PathBuf,

        /// Output SQL file
        #[arg(long)]
        output: PathBuf,

        /// Number of leading header columns to project
        #[arg(long, default_value_t = 244)]
        columns: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env().unwrap_or_else(|_| LogConfig::default());
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }
    init_logging(&log_config)?;

    let settings = Settings::load()?;

    match cli.command {
        Command::Ingest {
            path,
            archive,
            processed_dir,
        } => {
            commands::ingest::run(&settings, &path, archive, &processed_dir).await?;
        },
        Command::Migrate => {
            commands::migrate::run(&settings).await?;
        },
        Command::GenerateStaging {
            header,
            output,
            columns,
        } => {
            commands::stage::run(&header, &output, columns)?;
        },
    }

    Ok(())
}
