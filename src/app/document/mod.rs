//! Document loading
//!
//! Turns a spreadsheet blob into the two views used by the extraction
//! stages: a merged-cell aware [`RawGrid`] and an optional stringified
//! [`TabularView`] for fast bulk scans.

pub mod grid;
pub mod loader;
pub mod tabular;

pub use grid::{CellValue, MergedRange, RawGrid};
pub use loader::{DocumentLoader, LoadedDocument, SpreadsheetFormat};
pub use tabular::TabularView;
