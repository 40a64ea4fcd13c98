//! `ibp migrate` command implementation

use anyhow::Context;
use colored::Colorize;

use crate::config::Settings;

/// Apply pending bronze-schema migrations.
pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let pool = settings.connect().await?;

    ibp_ingest::MIGRATOR
        .run(&pool)
        .await
        .context("Migration failed")?;

    pool.close().await;
    println!("{}", "Migrations applied.".green());
    Ok(())
}
