//! Batch (balance) number discovery
//!
//! Partners put the manifest number somewhere near the top-left corner of
//! the sheet, in one of three shapes: `A123-B`, `A123/B` or `A123 B`. The
//! search is layered and stops at the first hit:
//!
//! 1. bulk scan of the top-left block in the tabular view
//! 2. the well-known cell (row 2, column 4)
//! 3. cell-by-cell scan of the same block
//! 4. keyword search ("баланс", "партия", ...) followed by a 3x3
//!    neighbourhood scan around each keyword cell

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::app::document::LoadedDocument;
use crate::app::models::BatchIdentity;
use crate::constants::batch;
use crate::errors::{ExtractError, ExtractResult};

static NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    batch::NUMBER_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

static NUMERIC_PART: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(batch::NUMERIC_PART_PATTERN).ok());

/// Where and how to look for the batch number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSearchConfig {
    /// Rows of the top-left block
    pub scan_rows: usize,
    /// Columns of the top-left block
    pub scan_columns: usize,
    /// (row, column) checked directly, 1-indexed
    pub well_known_cell: (usize, usize),
    /// Lower-case labels that sit next to the number
    pub keywords: Vec<String>,
}

impl Default for BatchSearchConfig {
    fn default() -> Self {
        Self {
            scan_rows: batch::SCAN_ROWS,
            scan_columns: batch::SCAN_COLUMNS,
            well_known_cell: batch::WELL_KNOWN_CELL,
            keywords: batch::KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Find the first batch-number token in a cell's text
pub fn extract_batch_number(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NUMBER_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(value))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Digit run between the leading letter and the separator; empty if absent
pub fn extract_numeric_part(batch_number: &str) -> String {
    NUMERIC_PART
        .as_ref()
        .and_then(|pattern| pattern.captures(batch_number))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Locates the manifest's batch number
#[derive(Debug, Clone, Default)]
pub struct BatchIdentifier {
    config: BatchSearchConfig,
}

impl BatchIdentifier {
    pub fn new(config: BatchSearchConfig) -> Self {
        Self { config }
    }

    /// Run the layered search; a miss is a structural failure
    pub fn identify(&self, document: &LoadedDocument) -> ExtractResult<BatchIdentity> {
        let found = self
            .scan_tabular(document)
            .or_else(|| self.check_well_known_cell(document))
            .or_else(|| self.scan_grid(document))
            .or_else(|| self.scan_keywords(document));

        match found {
            Some(batch_number) => {
                let batch_number_numeric = extract_numeric_part(&batch_number);
                info!(
                    "Batch number: {} (numeric part: {})",
                    batch_number, batch_number_numeric
                );
                Ok(BatchIdentity {
                    batch_number,
                    batch_number_numeric,
                })
            }
            None => {
                error!("Batch number not found, aborting parse");
                Err(ExtractError::BatchNumberNotFound {
                    rows: self.config.scan_rows,
                    columns: self.config.scan_columns,
                })
            }
        }
    }

    fn scan_tabular(&self, document: &LoadedDocument) -> Option<String> {
        let view = document.tabular.as_ref()?;
        view.block(self.config.scan_rows, self.config.scan_columns)
            .find_map(|(row, column, text)| {
                let found = extract_batch_number(text)?;
                debug!("Batch number in tabular cell [{}, {}]", row, column);
                Some(found)
            })
    }

    fn check_well_known_cell(&self, document: &LoadedDocument) -> Option<String> {
        let (row, column) = self.config.well_known_cell;
        let found = extract_batch_number(&document.grid.value(row, column).to_string());
        if found.is_some() {
            debug!("Batch number in well-known cell ({}, {})", row, column);
        }
        found
    }

    fn block_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (1..=self.config.scan_rows)
            .flat_map(move |row| (1..=self.config.scan_columns).map(move |col| (row, col)))
    }

    fn scan_grid(&self, document: &LoadedDocument) -> Option<String> {
        self.block_cells().find_map(|(row, column)| {
            extract_batch_number(&document.grid.value(row, column).to_string())
        })
    }

    fn scan_keywords(&self, document: &LoadedDocument) -> Option<String> {
        let grid = &document.grid;
        let last_row = self.config.scan_rows;
        let last_column = self.config.scan_columns;

        for (row, column) in self.block_cells() {
            let text = grid.value(row, column).to_string().to_lowercase();
            if !self.config.keywords.iter().any(|k| text.contains(k.as_str())) {
                continue;
            }

            for r in row.saturating_sub(1).max(1)..=(row + 1).min(last_row) {
                for c in column.saturating_sub(1).max(1)..=(column + 1).min(last_column) {
                    if let Some(found) = extract_batch_number(&grid.value(r, c).to_string()) {
                        info!(
                            "Batch number found near keyword cell ({}, {}) at ({}, {})",
                            row, column, r, c
                        );
                        return Some(found);
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::document::{CellValue, RawGrid};

    fn document(cells: &[(usize, usize, &str)], with_tabular: bool) -> LoadedDocument {
        let mut grid = RawGrid::new();
        for (row, column, text) in cells {
            grid.set(*row, *column, CellValue::Text(text.to_string()));
        }
        let limit = if with_tabular { usize::MAX } else { 0 };
        LoadedDocument::from_grid(grid, limit)
    }

    #[test]
    fn test_extract_shapes() {
        assert_eq!(extract_batch_number("A123-B"), Some("A123-B".into()));
        assert_eq!(extract_batch_number("Баланс: K77/M"), Some("K77/M".into()));
        assert_eq!(extract_batch_number("  P12   A "), Some("P12   A".into()));
        assert_eq!(extract_batch_number("123456-B"), None);
        assert_eq!(extract_batch_number(""), None);
    }

    #[test]
    fn test_numeric_part() {
        assert_eq!(extract_numeric_part("A123-B"), "123");
        assert_eq!(extract_numeric_part("K77/M"), "77");
        assert_eq!(extract_numeric_part("P12 A"), "12");
        assert_eq!(extract_numeric_part("nothing"), "");
    }

    #[test]
    fn test_tabular_scan_takes_first_row_major_hit() {
        let doc = document(&[(1, 5, "Z9-Z"), (3, 1, "A1-A")], true);
        let identity = BatchIdentifier::default().identify(&doc).unwrap();
        assert_eq!(identity.batch_number, "Z9-Z");
        assert_eq!(identity.batch_number_numeric, "9");
    }

    #[test]
    fn test_grid_fallback_without_tabular_view() {
        let doc = document(&[(2, 4, "Партия B55-C")], false);
        assert!(doc.tabular.is_none());
        let identity = BatchIdentifier::default().identify(&doc).unwrap();
        assert_eq!(identity.batch_number, "B55-C");
    }

    #[test]
    fn test_outside_block_is_ignored() {
        let doc = document(&[(11, 1, "A1-B"), (1, 11, "A2-B")], false);
        let err = BatchIdentifier::default().identify(&doc).unwrap_err();
        assert_eq!(
            err,
            ExtractError::BatchNumberNotFound {
                rows: 10,
                columns: 10
            }
        );
    }

    #[test]
    fn test_keyword_neighbourhood() {
        let identifier = BatchIdentifier::default();
        let grid_doc = document(&[(4, 4, "БАЛАНС"), (5, 5, "x")], false);
        assert!(identifier.scan_keywords(&grid_doc).is_none());

        let grid_doc = document(&[(4, 4, "БАЛАНС"), (5, 5, "Q42-R")], false);
        assert_eq!(identifier.scan_keywords(&grid_doc), Some("Q42-R".into()));
    }
}
