//! Dense, stringified snapshot of a worksheet for bulk pattern search
//!
//! No header inference and no merged-cell resolution: every cell is rendered
//! as text exactly where it sits. Index 0 is sheet row/column 1.

use super::grid::RawGrid;
use crate::errors::{LoadError, LoadResult};

#[derive(Debug, Clone, Default)]
pub struct TabularView {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl TabularView {
    /// Materialize the whole grid; refuses sheets above `max_cells`
    pub fn from_grid(grid: &RawGrid, max_cells: usize) -> LoadResult<Self> {
        let height = grid.max_row();
        let width = grid.max_column();
        let cells = height.saturating_mul(width);
        if cells > max_cells {
            return Err(LoadError::TabularTooLarge {
                cells,
                limit: max_cells,
            });
        }

        let rows = (1..=height)
            .map(|row| {
                (1..=width)
                    .map(|column| grid.value(row, column).to_string())
                    .collect()
            })
            .collect();

        Ok(Self { rows, width })
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Text at a 0-indexed position; empty outside the sheet
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Cells of the top-left `rows` x `columns` block in row-major order,
    /// with 0-indexed positions
    pub fn block(
        &self,
        rows: usize,
        columns: usize,
    ) -> impl Iterator<Item = (usize, usize, &str)> + '_ {
        let rows = rows.min(self.height());
        let columns = columns.min(self.width);
        (0..rows).flat_map(move |r| (0..columns).map(move |c| (r, c, self.cell(r, c))))
    }

    /// All values of one 0-indexed column, top to bottom
    pub fn column(&self, column: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(column).map(String::as_str).unwrap_or(""))
    }
}
