//! `ibp generate-staging` command implementation
//!
//! Emits the downstream column-projection view over the bronze row ledger.
//! It reads the invoice header CSV, snake-cases and de-duplicates the first
//! N column names, and writes a `CREATE OR REPLACE VIEW` that projects
//! `raw_values->>i` per position. The generator depends only on the row
//! ledger's shape: a fixed column count and a positional JSON array.

use anyhow::Context;
use colored::Colorize;
use std::path::Path;

/// Run the staging-view generator.
pub fn run(header_path: &Path, output_path: &Path, columns: usize) -> anyhow::Result<()> {
    if columns == 0 {
        anyhow::bail!("Column count must be greater than 0.");
    }

    let headers = read_header_row(header_path)?;

    if headers.len() < columns {
        anyhow::bail!(
            "Header has {} columns, expected at least {}.",
            headers.len(),
            columns
        );
    }

    let names = dedupe(headers.iter().take(columns).map(|h| snake(h)).collect());
    let sql = render_view(&names);

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(output_path, sql)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!("{} {}", "Wrote:".green(), output_path.display());
    println!("  header columns in file: {}", headers.len());
    println!("  columns used in view: {}", columns);
    Ok(())
}

fn read_header_row(path: &Path) -> anyhow::Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to open header file {}", path.display()))?;

    let record = reader
        .records()
        .next()
        .context("Header file is empty")??;

    Ok(record.iter().map(|s| s.to_string()).collect())
}

/// Lowercase snake_case with a `col_` prefix when the name would start with
/// a digit, and `col` for names that normalize to nothing.
fn snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;

    for ch in name.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }

    let out = out.trim_end_matches('_').to_string();
    if out.is_empty() {
        "col".to_string()
    } else if out.starts_with(|c: char| c.is_ascii_digit()) {
        format!("col_{}", out)
    } else {
        out
    }
}

/// Suffix repeated names with an occurrence counter: `weight`, `weight_2`, ...
fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            out.push(name);
        } else {
            out.push(format!("{}_{}", name, count));
        }
    }

    out
}

fn render_view(columns: &[String]) -> String {
    let mut sql = String::new();
    sql.push_str("CREATE OR REPLACE VIEW bronze.stg_invoice_lines AS\n");
    sql.push_str("SELECT\n");
    sql.push_str("  bronze_row_id,\n");
    sql.push_str("  file_id,\n");
    sql.push_str("  load_event_id,\n");
    sql.push_str("  row_number,\n");
    sql.push_str("  ingested_at,\n");

    for (i, name) in columns.iter().enumerate() {
        let comma = if i < columns.len() - 1 { "," } else { "" };
        sql.push_str(&format!(
            "  nullif(trim(raw_values->>{}), '') AS {}{}\n",
            i, name, comma
        ));
    }

    sql.push_str("FROM bronze.invoice_row;\n");
    sql
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_basic() {
        assert_eq!(snake("Invoice Number"), "invoice_number");
        assert_eq!(snake("  Net Amount (USD)  "), "net_amount_usd");
        assert_eq!(snake("Lead Shipment #"), "lead_shipment");
    }

    #[test]
    fn test_snake_degenerate() {
        assert_eq!(snake("***"), "col");
        assert_eq!(snake("2nd Ref"), "col_2nd_ref");
    }

    #[test]
    fn test_dedupe_counts_occurrences() {
        let names = vec!["weight".to_string(), "zone".to_string(), "weight".to_string(), "weight".to_string()];
        assert_eq!(dedupe(names), vec!["weight", "zone", "weight_2", "weight_3"]);
    }

    #[test]
    fn test_render_view_projects_positions() {
        let sql = render_view(&["account".to_string(), "zone".to_string()]);

        assert!(sql.starts_with("CREATE OR REPLACE VIEW bronze.stg_invoice_lines AS"));
        assert!(sql.contains("nullif(trim(raw_values->>0), '') AS account,"));
        assert!(sql.contains("nullif(trim(raw_values->>1), '') AS zone\n"));
        assert!(sql.trim_end().ends_with("FROM bronze.invoice_row;"));
    }

    #[test]
    fn test_run_writes_view_file() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("header.csv");
        std::fs::write(&header, "Account Number,Invoice Date,Net Amount\n").unwrap();
        let out = dir.path().join("sql/stg_invoice_lines.sql");

        run(&header, &out, 2).unwrap();

        let sql = std::fs::read_to_string(&out).unwrap();
        assert!(sql.contains("AS account_number,"));
        assert!(sql.contains("AS invoice_date\n"));
        assert!(!sql.contains("net_amount"));
    }

    #[test]
    fn test_run_rejects_zero_columns() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("header.csv");
        std::fs::write(&header, "a,b\n").unwrap();
        let out = dir.path().join("out.sql");

        assert!(run(&header, &out, 0).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_run_rejects_short_header() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("header.csv");
        std::fs::write(&header, "a,b\n").unwrap();
        let out = dir.path().join("out.sql");

        assert!(run(&header, &out, 244).is_err());
    }
}
