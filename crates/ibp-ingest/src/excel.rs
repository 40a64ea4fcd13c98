//! Row normalization for spreadsheet invoice files.
//!
//! Only the first worksheet is read. Every cell is coerced to a trimmed
//! string, with empty or whitespace-only cells becoming `None`. Rows are
//! padded or truncated to a fixed expected width, and rows with fewer than
//! `min_non_null` populated cells are filtered out before they reach the
//! loader. The result is a finite, single-pass sequence; no type coercion
//! happens at this layer.

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

/// Lazy sequence of normalized rows from one worksheet.
///
/// Yields `Vec<Option<String>>` of exactly `expected_cols` entries per row,
/// in worksheet order. Consume once; the sequence is not restartable.
pub struct InvoiceRows {
    range: Range<Data>,
    next_row: usize,
    expected_cols: usize,
    min_non_null: usize,
}

/// Open `path` and return the normalized row sequence for its first worksheet.
pub fn read_invoice_rows(
    path: &Path,
    expected_cols: usize,
    min_non_null: usize,
) -> Result<InvoiceRows, calamine::Error> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(calamine::Error::Msg("workbook has no worksheets"))??;

    Ok(InvoiceRows {
        range,
        next_row: 0,
        expected_cols,
        min_non_null,
    })
}

impl InvoiceRows {
    /// Construct directly from a cell range. Used by tests and callers that
    /// already hold a loaded worksheet.
    pub fn from_range(range: Range<Data>, expected_cols: usize, min_non_null: usize) -> Self {
        Self {
            range,
            next_row: 0,
            expected_cols,
            min_non_null,
        }
    }
}

impl Iterator for InvoiceRows {
    type Item = Result<Vec<Option<String>>, calamine::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_row < self.range.height() {
            let row_idx = self.next_row;
            self.next_row += 1;

            let width = self.range.width();
            let mut values = Vec::with_capacity(width.max(self.expected_cols));
            for col in 0..width {
                values.push(self.range.get((row_idx, col)).and_then(cell_to_string));
            }

            // Emptiness is judged on the raw row, before padding/truncation.
            let non_null = values.iter().filter(|v| v.is_some()).count();
            if non_null < self.min_non_null {
                continue;
            }

            values.resize(self.expected_cols, None);
            return Some(Ok(values));
        }

        None
    }
}

/// Coerce one cell to a trimmed string, or `None` when empty.
fn cell_to_string(cell: &Data) -> Option<String> {
    let rendered = match cell {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        other => other.to_string(),
    };

    let trimmed = rendered.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn range_from_rows(rows: &[Vec<Data>]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    #[test]
    fn test_cell_coercion() {
        assert_eq!(cell_to_string(&Data::Empty), None);
        assert_eq!(cell_to_string(&Data::String("  GROUND  ".into())), Some("GROUND".into()));
        assert_eq!(cell_to_string(&Data::String("   ".into())), None);
        assert_eq!(cell_to_string(&Data::Float(12.5)), Some("12.5".into()));
        assert_eq!(cell_to_string(&Data::Int(7)), Some("7".into()));
    }

    #[test]
    fn test_rows_padded_to_expected_width() {
        let range = range_from_rows(&[vec![
            Data::String("1Z999".into()),
            Data::Float(4.2),
        ]]);
        let rows: Vec<_> = InvoiceRows::from_range(range, 5, 1)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            vec![Some("1Z999".to_string()), Some("4.2".to_string()), None, None, None]
        );
    }

    #[test]
    fn test_rows_truncated_to_expected_width() {
        let range = range_from_rows(&[vec![
            Data::String("a".into()),
            Data::String("b".into()),
            Data::String("c".into()),
        ]]);
        let rows: Vec<_> = InvoiceRows::from_range(range, 2, 1)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows[0], vec![Some("a".to_string()), Some("b".to_string())]);
    }

    #[test]
    fn test_blank_row_filtered() {
        // 3 rows, expected width 5, row 2 entirely empty: only 2 rows survive.
        let range = range_from_rows(&[
            vec![Data::String("header".into())],
            vec![Data::Empty, Data::String("   ".into())],
            vec![Data::String("line 1".into()), Data::Float(1.0)],
        ]);
        let rows: Vec<_> = InvoiceRows::from_range(range, 5, 1)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Some("header".to_string()));
        assert_eq!(rows[1][0], Some("line 1".to_string()));
        assert!(rows.iter().all(|r| r.len() == 5));
    }

    #[test]
    fn test_min_non_null_threshold() {
        let range = range_from_rows(&[
            vec![Data::String("only one".into())],
            vec![Data::String("two".into()), Data::String("cells".into())],
        ]);
        let rows: Vec<_> = InvoiceRows::from_range(range, 3, 2)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Some("two".to_string()));
    }
}
