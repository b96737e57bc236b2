//! Data range detection
//!
//! Data rows are recognised by a client code in the first column. The
//! longest run of consecutive matching rows wins. Documents without such a
//! run, or without a tabular view, fall back to a linear scan that only ends
//! the range after a confirmed gap of non-matching rows.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::app::document::{CellValue, LoadedDocument, RawGrid};
use crate::constants::range;
use crate::errors::{ExtractError, ExtractResult};

static CLIENT_CODE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(range::CLIENT_CODE_PATTERN).ok());

/// Whether a (stripped) value has the client-code shape
pub fn is_client_code(value: &str) -> bool {
    CLIENT_CODE
        .as_ref()
        .map(|pattern| pattern.is_match(value.trim()))
        .unwrap_or(false)
}

/// Inclusive, 1-indexed row range holding the manifest lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRange {
    pub start: usize,
    pub end: usize,
}

impl DataRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Number of rows covered
    pub fn row_count(&self) -> usize {
        self.end - self.start + 1
    }

    /// Row directly above the data, if there is one
    pub fn header_row(&self) -> Option<usize> {
        (self.start > 1).then(|| self.start - 1)
    }
}

impl fmt::Display for DataRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rows {}-{}", self.start, self.end)
    }
}

/// Finds the rows holding manifest lines
#[derive(Debug, Clone)]
pub struct DataRangeDetector {
    end_gap_rows: usize,
}

impl Default for DataRangeDetector {
    fn default() -> Self {
        Self::new(range::END_GAP_ROWS)
    }
}

impl DataRangeDetector {
    pub fn new(end_gap_rows: usize) -> Self {
        Self {
            end_gap_rows: end_gap_rows.max(1),
        }
    }

    pub fn detect(&self, document: &LoadedDocument) -> ExtractResult<DataRange> {
        if let Some(view) = &document.tabular {
            let matching: Vec<usize> = view
                .column(0)
                .enumerate()
                .filter(|(_, value)| is_client_code(value))
                .map(|(index, _)| index + 1)
                .collect();

            if let Some(found) = longest_run(&matching).filter(|run| run.row_count() > 1) {
                info!("Data range found from client code run: {}", found);
                return Ok(found);
            }
            debug!("No client code run longer than one row, scanning linearly");
        } else {
            debug!("No tabular view, scanning linearly");
        }

        match self.linear_scan(&document.grid) {
            Some(found) => {
                info!("Data range found by linear scan: {}", found);
                Ok(found)
            }
            None => {
                error!("No client code found in column 1, aborting parse");
                Err(ExtractError::DataRangeNotFound)
            }
        }
    }

    fn linear_scan(&self, grid: &RawGrid) -> Option<DataRange> {
        let max_row = grid.max_row();
        let mut start = None;

        for row in 1..=max_row {
            if grid_row_matches(grid, row) {
                if start.is_none() {
                    debug!("Data starts at row {}", row);
                    start = Some(row);
                }
                continue;
            }

            let Some(first) = start else { continue };
            let gap_end = (row + self.end_gap_rows).min(max_row + 1);
            if !(row..gap_end).any(|check| grid_row_matches(grid, check)) {
                return Some(DataRange::new(first, row - 1));
            }
        }

        start.map(|first| {
            debug!("No confirmed end of data, using last row {}", max_row);
            DataRange::new(first, max_row)
        })
    }
}

fn grid_row_matches(grid: &RawGrid, row: usize) -> bool {
    match grid.value(row, 1) {
        CellValue::Text(text) => is_client_code(text),
        _ => false,
    }
}

/// Longest run of consecutive row numbers; the earliest wins ties
fn longest_run(rows: &[usize]) -> Option<DataRange> {
    let mut best: Option<DataRange> = None;
    let mut current: Option<DataRange> = None;

    for &row in rows {
        current = match current {
            Some(run) if run.end + 1 == row => Some(DataRange::new(run.start, row)),
            _ => Some(DataRange::new(row, row)),
        };
        if let Some(run) = current {
            if best.map_or(true, |b| run.row_count() > b.row_count()) {
                best = Some(run);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(column_one: &[(usize, &str)], with_tabular: bool) -> LoadedDocument {
        let mut grid = RawGrid::new();
        for (row, text) in column_one {
            grid.set(*row, 1, CellValue::Text(text.to_string()));
        }
        grid.set(1, 5, CellValue::Text("title".into()));
        let limit = if with_tabular { usize::MAX } else { 0 };
        LoadedDocument::from_grid(grid, limit)
    }

    #[test]
    fn test_client_code_shape() {
        assert!(is_client_code("AB123"));
        assert!(is_client_code(" ABCD1234567XY "));
        assert!(!is_client_code("ab123"));
        assert!(!is_client_code("ABCDE1"));
        assert!(!is_client_code("AB12345678"));
        assert!(!is_client_code("Итого"));
    }

    #[test]
    fn test_longest_run_wins() {
        let doc = document(
            &[(2, "X1"), (3, "X2"), (6, "AB1"), (7, "AB2"), (8, "AB3")],
            true,
        );
        let found = DataRangeDetector::default().detect(&doc).unwrap();
        assert_eq!(found, DataRange::new(6, 8));
    }

    #[test]
    fn test_linear_scan_without_tabular() {
        let doc = document(&[(4, "AB1"), (5, "AB2"), (9, "Z9")], false);
        let found = DataRangeDetector::default().detect(&doc).unwrap();
        assert_eq!(found, DataRange::new(4, 5));
    }

    #[test]
    fn test_linear_scan_tolerates_isolated_gap() {
        // Runs are all single rows, so the linear scan decides
        let doc = document(&[(3, "AB1"), (5, "AB2"), (7, "AB3"), (20, "AB4")], false);
        let found = DataRangeDetector::default().detect(&doc).unwrap();
        assert_eq!(found, DataRange::new(3, 7));
    }

    #[test]
    fn test_gap_row_kept_inside_range_without_tabular() {
        let doc = document(
            &[(6, "AB1"), (7, "AB2"), (9, "AB3"), (10, "AB4"), (11, "AB5")],
            false,
        );
        let found = DataRangeDetector::default().detect(&doc).unwrap();
        assert_eq!(found, DataRange::new(6, 11));
    }

    #[test]
    fn test_linear_scan_runs_to_last_row() {
        let mut grid = RawGrid::new();
        grid.set(2, 1, CellValue::Text("AB1".into()));
        grid.set(4, 1, CellValue::Text("AB2".into()));
        let doc = LoadedDocument::from_grid(grid, usize::MAX);
        let found = DataRangeDetector::default().detect(&doc).unwrap();
        assert_eq!(found, DataRange::new(2, 4));
    }

    #[test]
    fn test_no_client_codes() {
        let doc = document(&[(2, "Итого"), (3, "42")], true);
        assert_eq!(
            DataRangeDetector::default().detect(&doc),
            Err(ExtractError::DataRangeNotFound)
        );
    }

    #[test]
    fn test_header_row() {
        assert_eq!(DataRange::new(6, 9).header_row(), Some(5));
        assert_eq!(DataRange::new(1, 9).header_row(), None);
        assert_eq!(DataRange::new(6, 9).row_count(), 4);
    }
}
