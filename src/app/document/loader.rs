//! Spreadsheet loading via calamine
//!
//! Reads the first worksheet of an `.xlsx`/`.xlsm` or legacy `.xls` document
//! fully into memory, producing a [`RawGrid`] (always) and a bulk
//! [`TabularView`] (best effort).

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Dimensions, Range, Reader, Xls, Xlsx};
use tracing::{debug, info, warn};

use super::grid::{CellValue, MergedRange, RawGrid};
use super::tabular::TabularView;
use crate::constants::loader;
use crate::errors::{LoadError, LoadResult};

/// Spreadsheet container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Office Open XML workbook (`.xlsx`, `.xlsm`)
    Xlsx,
    /// Legacy BIFF workbook (`.xls`)
    Xls,
}

impl SpreadsheetFormat {
    /// Detect the container from its leading bytes
    pub fn sniff(bytes: &[u8]) -> LoadResult<Self> {
        if bytes.starts_with(&loader::ZIP_SIGNATURE) {
            Ok(Self::Xlsx)
        } else if bytes.starts_with(&loader::OLE_SIGNATURE) {
            Ok(Self::Xls)
        } else {
            let signature = bytes
                .iter()
                .take(8)
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ");
            Err(LoadError::UnsupportedFormat { signature })
        }
    }

    /// Map a file extension (with or without dot, any case)
    pub fn from_extension(extension: &str) -> LoadResult<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            other => Err(LoadError::UnsupportedExtension {
                extension: other.to_string(),
            }),
        }
    }
}

/// Everything later stages read from
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub format: SpreadsheetFormat,
    pub sheet_name: String,
    pub grid: RawGrid,
    /// `None` when bulk loading failed; stages fall back to the grid
    pub tabular: Option<TabularView>,
}

impl LoadedDocument {
    /// Wrap an already built grid, e.g. from a non-file source
    pub fn from_grid(grid: RawGrid, max_tabular_cells: usize) -> Self {
        let tabular = build_tabular(&grid, max_tabular_cells);
        Self {
            format: SpreadsheetFormat::Xlsx,
            sheet_name: String::new(),
            grid,
            tabular,
        }
    }
}

/// Opens spreadsheet documents
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    max_tabular_cells: usize,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(loader::MAX_TABULAR_CELLS)
    }
}

impl DocumentLoader {
    pub fn new(max_tabular_cells: usize) -> Self {
        Self { max_tabular_cells }
    }

    /// Read a document from disk
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> LoadResult<LoadedDocument> {
        let bytes = std::fs::read(path.as_ref())?;
        debug!("Read {} bytes from {}", bytes.len(), path.as_ref().display());
        self.load_bytes(&bytes)
    }

    /// Parse an in-memory document blob
    pub fn load_bytes(&self, bytes: &[u8]) -> LoadResult<LoadedDocument> {
        let format = SpreadsheetFormat::sniff(bytes)?;
        let cursor = Cursor::new(bytes.to_vec());

        let (sheet_name, range, merges) = match format {
            SpreadsheetFormat::Xlsx => read_xlsx(cursor)?,
            SpreadsheetFormat::Xls => read_xls(cursor)?,
        };

        let grid = grid_from_range(&range, &merges);
        info!(
            "Loaded sheet '{}' ({:?}): {} rows x {} columns, {} merged ranges",
            sheet_name,
            format,
            grid.max_row(),
            grid.max_column(),
            grid.merged_ranges().len()
        );

        let tabular = build_tabular(&grid, self.max_tabular_cells);
        Ok(LoadedDocument {
            format,
            sheet_name,
            grid,
            tabular,
        })
    }
}

fn build_tabular(grid: &RawGrid, max_cells: usize) -> Option<TabularView> {
    match TabularView::from_grid(grid, max_cells) {
        Ok(view) => Some(view),
        Err(e) => {
            warn!("{}. Falling back to cell-by-cell access", e);
            None
        }
    }
}

type SheetContents = (String, Range<Data>, Vec<Dimensions>);

fn workbook_error(e: impl std::fmt::Display) -> LoadError {
    LoadError::Workbook {
        reason: e.to_string(),
    }
}

fn read_xlsx(cursor: Cursor<Vec<u8>>) -> LoadResult<SheetContents> {
    let mut workbook: Xlsx<_> = Xlsx::new(cursor).map_err(workbook_error)?;
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoWorksheets)?;
    let range = workbook.worksheet_range(&name).map_err(workbook_error)?;

    workbook.load_merged_regions().map_err(workbook_error)?;
    let merges = workbook
        .worksheet_merge_cells(&name)
        .unwrap_or(Ok(Vec::new()))
        .map_err(workbook_error)?;

    Ok((name, range, merges))
}

fn read_xls(cursor: Cursor<Vec<u8>>) -> LoadResult<SheetContents> {
    let mut workbook: Xls<_> = Xls::new(cursor).map_err(workbook_error)?;
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoWorksheets)?;
    let range = workbook.worksheet_range(&name).map_err(workbook_error)?;
    let merges = workbook.worksheet_merge_cells(&name).unwrap_or_default();

    Ok((name, range, merges))
}

/// calamine ranges start at the first used cell and are 0-indexed
fn grid_from_range(range: &Range<Data>, merges: &[Dimensions]) -> RawGrid {
    let mut grid = RawGrid::new();
    let (origin_row, origin_column) = range.start().unwrap_or((0, 0));

    for (row, column, data) in range.used_cells() {
        let abs_row = origin_row as usize + row + 1;
        let abs_column = origin_column as usize + column + 1;
        grid.set(abs_row, abs_column, CellValue::from(data));
    }

    for region in merges {
        grid.add_merged_range(MergedRange::new(
            region.start.0 as usize + 1,
            region.start.1 as usize + 1,
            region.end.0 as usize + 1,
            region.end.1 as usize + 1,
        ));
    }

    grid
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(value) => CellValue::DateTime(value.to_string()),
                None => CellValue::Float(dt.as_f64()),
            },
            Data::DateTimeIso(s) => CellValue::DateTime(s.clone()),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_formats() {
        assert_eq!(
            SpreadsheetFormat::sniff(&[0x50, 0x4B, 0x03, 0x04, 0x00]).unwrap(),
            SpreadsheetFormat::Xlsx
        );
        assert_eq!(
            SpreadsheetFormat::sniff(&loader::OLE_SIGNATURE).unwrap(),
            SpreadsheetFormat::Xls
        );
        assert!(matches!(
            SpreadsheetFormat::sniff(b"name,weight\n"),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_extensions() {
        assert_eq!(
            SpreadsheetFormat::from_extension(".XLSM").unwrap(),
            SpreadsheetFormat::Xlsx
        );
        assert_eq!(
            SpreadsheetFormat::from_extension("xls").unwrap(),
            SpreadsheetFormat::Xls
        );
        assert!(SpreadsheetFormat::from_extension("csv").is_err());
    }

    #[test]
    fn test_grid_from_offset_range() {
        let mut range: Range<Data> = Range::new((1, 2), (2, 3));
        range.set_value((1, 2), Data::String("P12-A".into()));
        range.set_value((2, 3), Data::Float(4.0));
        let merges = vec![Dimensions {
            start: (2, 3),
            end: (3, 3),
        }];

        let grid = grid_from_range(&range, &merges);
        assert_eq!(grid.value(2, 3), &CellValue::Text("P12-A".into()));
        assert_eq!(grid.value(3, 4), &CellValue::Float(4.0));
        assert_eq!(grid.resolve(4, 4), &CellValue::Float(4.0));
    }

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        let loader = DocumentLoader::default();
        assert!(loader.load_bytes(b"PK\x03\x04not really a zip").is_err());
    }

    #[test]
    fn test_from_grid_without_tabular() {
        let mut grid = RawGrid::new();
        grid.set(10, 10, CellValue::Int(1));
        let document = LoadedDocument::from_grid(grid, 10);
        assert!(document.tabular.is_none());
    }
}
