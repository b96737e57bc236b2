//! Cell-addressable view of one worksheet
//!
//! Rows and columns are 1-indexed, matching how spreadsheet users (and
//! partner documents) refer to cells. Merged ranges map every covered cell
//! back to the anchor cell holding the value.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// A single cell value as read from the document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Date or time cell, rendered as ISO text
    DateTime(String),
    /// Spreadsheet error such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// True for missing cells and empty strings
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) | CellValue::DateTime(s) | CellValue::Error(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Inclusive, 1-indexed merged cell range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergedRange {
    pub start_row: usize,
    pub start_column: usize,
    pub end_row: usize,
    pub end_column: usize,
}

impl MergedRange {
    pub fn new(start_row: usize, start_column: usize, end_row: usize, end_column: usize) -> Self {
        Self {
            start_row,
            start_column,
            end_row: end_row.max(start_row),
            end_column: end_column.max(start_column),
        }
    }

    /// Top-left cell, the only one holding a value
    pub fn anchor(&self) -> (usize, usize) {
        (self.start_row, self.start_column)
    }

    /// Number of rows covered
    pub fn row_span(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.start_row..=self.end_row)
            .flat_map(move |row| (self.start_column..=self.end_column).map(move |col| (row, col)))
    }
}

/// The worksheet as a sparse 1-indexed grid with merged-range lookup
#[derive(Debug, Clone, Default)]
pub struct RawGrid {
    cells: HashMap<(usize, usize), CellValue>,
    merged: Vec<MergedRange>,
    merged_index: HashMap<(usize, usize), usize>,
    max_row: usize,
    max_column: usize,
}

static EMPTY: CellValue = CellValue::Empty;

impl RawGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cell value; empty values only extend the sheet bounds
    pub fn set(&mut self, row: usize, column: usize, value: CellValue) {
        if row == 0 || column == 0 {
            return;
        }
        self.max_row = self.max_row.max(row);
        self.max_column = self.max_column.max(column);
        if value == CellValue::Empty {
            self.cells.remove(&(row, column));
        } else {
            self.cells.insert((row, column), value);
        }
    }

    /// Register a merged range; later ranges never steal already covered cells
    pub fn add_merged_range(&mut self, range: MergedRange) {
        if range.start_row == 0 || range.start_column == 0 {
            return;
        }
        let index = self.merged.len();
        for cell in range.cells() {
            self.merged_index.entry(cell).or_insert(index);
        }
        self.max_row = self.max_row.max(range.end_row);
        self.max_column = self.max_column.max(range.end_column);
        self.merged.push(range);
    }

    /// Value stored at exactly this cell
    pub fn value(&self, row: usize, column: usize) -> &CellValue {
        self.cells.get(&(row, column)).unwrap_or(&EMPTY)
    }

    /// Merged range covering the cell, if any
    pub fn merged_range_at(&self, row: usize, column: usize) -> Option<&MergedRange> {
        self.merged_index
            .get(&(row, column))
            .and_then(|index| self.merged.get(*index))
    }

    /// Value of the cell after resolving merged ranges to their anchor
    pub fn resolve(&self, row: usize, column: usize) -> &CellValue {
        match self.merged_range_at(row, column) {
            Some(range) => {
                let (anchor_row, anchor_column) = range.anchor();
                self.value(anchor_row, anchor_column)
            }
            None => self.value(row, column),
        }
    }

    pub fn merged_ranges(&self) -> &[MergedRange] {
        &self.merged
    }

    /// Last row holding a value or covered by a merge
    pub fn max_row(&self) -> usize {
        self.max_row
    }

    pub fn max_column(&self) -> usize {
        self.max_column
    }

    /// Number of stored (non-empty) cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
