//! Extraction pipeline orchestration
//!
//! Runs the stages strictly in order over one in-memory document:
//! load, batch number, data range, column mapping, composite detection,
//! row extraction and aggregation. Structural failures and internal faults
//! are folded into [`ParseOutcome`]; nothing is ever raised to the caller.

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::app::batch::{BatchIdentifier, BatchSearchConfig};
use crate::app::columns::{ColumnMapper, MappingConfig};
use crate::app::document::{DocumentLoader, LoadedDocument, SpreadsheetFormat};
use crate::app::extract::{CompositeGroups, FieldNormalizer, RowExtractor};
use crate::app::models::{BatchIdentity, CargoRecord, ColumnMapping, FieldKey};
use crate::app::range::{DataRange, DataRangeDetector};
use crate::app::report::render_report;
use crate::app::summary::BatchSummary;
use crate::app::translate::{Language, Translator};
use crate::constants::{self, loader, range};
use crate::errors::{ExtractError, ExtractResult, LoadResult};

/// Tunables for every stage
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub batch: BatchSearchConfig,
    pub mapping: MappingConfig,
    /// Non-matching rows that confirm the end of the data
    pub end_gap_rows: usize,
    /// Sheets above this size get no tabular view
    pub max_tabular_cells: usize,
    pub source_language: Language,
    pub target_language: Language,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            batch: BatchSearchConfig::default(),
            mapping: MappingConfig::default(),
            end_gap_rows: range::END_GAP_ROWS,
            max_tabular_cells: loader::MAX_TABULAR_CELLS,
            source_language: Language::ChineseTraditional,
            target_language: Language::Russian,
        }
    }
}

/// Everything a successful parse produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseReport {
    pub batch: BatchIdentity,
    pub range: DataRange,
    pub mapping: ColumnMapping,
    pub records: Vec<CargoRecord>,
    pub summary: BatchSummary,
    /// Rows dropped for lacking a client code
    pub dropped_rows: Vec<usize>,
}

/// Result of one parse
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Parsed(ParseReport),
    /// Batch number or data range not found
    StructuralFailure(ExtractError),
    /// Unreadable document or internal fault
    Failed { message: String },
}

impl ParseOutcome {
    /// Records, or an empty vector for every failure
    pub fn into_records(self) -> Vec<CargoRecord> {
        match self {
            ParseOutcome::Parsed(report) => report.records,
            _ => Vec::new(),
        }
    }

    pub fn report(&self) -> Option<&ParseReport> {
        match self {
            ParseOutcome::Parsed(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }
}

/// Stage-by-stage diagnostics without row extraction
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub sheet_name: String,
    #[serde(skip)]
    pub format: Option<SpreadsheetFormat>,
    pub rows: usize,
    pub columns: usize,
    pub cells: usize,
    pub merged_ranges: usize,
    pub tabular_available: bool,
    pub batch: Option<BatchIdentity>,
    pub range: Option<DataRange>,
    pub mapping: Option<ColumnMapping>,
    pub composite_groups: usize,
}

/// The extraction engine
#[derive(Debug)]
pub struct ManifestParser {
    config: ParserConfig,
    loader: DocumentLoader,
    batch: BatchIdentifier,
    range: DataRangeDetector,
    mapper: ColumnMapper,
    extractor: RowExtractor,
}

impl ManifestParser {
    pub fn new(config: ParserConfig, translator: Arc<dyn Translator>) -> Self {
        let normalizer =
            FieldNormalizer::new(translator, config.source_language, config.target_language);
        Self {
            loader: DocumentLoader::new(config.max_tabular_cells),
            batch: BatchIdentifier::new(config.batch.clone()),
            range: DataRangeDetector::new(config.end_gap_rows),
            mapper: ColumnMapper::new(config.mapping.clone()),
            extractor: RowExtractor::new(normalizer),
            config,
        }
    }

    /// Default heuristics with the given translator
    pub fn with_translator(translator: Arc<dyn Translator>) -> Self {
        Self::new(ParserConfig::default(), translator)
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a document blob; never panics and never returns an error
    pub fn run(&self, bytes: &[u8], period_id: &str) -> ParseOutcome {
        self.run_named(bytes, "in-memory document", period_id)
    }

    /// Like [`ManifestParser::run`], naming the document in diagnostics
    pub fn run_named(&self, bytes: &[u8], document_name: &str, period_id: &str) -> ParseOutcome {
        let stage = Cell::new("load");
        self.guarded(document_name, &stage, || match self.loader.load_bytes(bytes) {
            Ok(document) => self.run_stages(&document, document_name, period_id, &stage),
            Err(e) => {
                error!("Failed to load {}: {}", document_name, e);
                ParseOutcome::Failed {
                    message: e.to_string(),
                }
            }
        })
    }

    /// Parse a document on disk
    pub fn run_path<P: AsRef<Path>>(&self, path: P, period_id: &str) -> ParseOutcome {
        let path = path.as_ref();
        info!("Parsing {}", path.display());
        match std::fs::read(path) {
            Ok(bytes) => self.run_named(&bytes, &path.display().to_string(), period_id),
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                ParseOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Records of a document blob; empty on any failure
    pub fn parse(&self, bytes: &[u8], period_id: &str) -> Vec<CargoRecord> {
        self.run(bytes, period_id).into_records()
    }

    /// Records of a document on disk; empty on any failure
    pub fn parse_path<P: AsRef<Path>>(&self, path: P, period_id: &str) -> Vec<CargoRecord> {
        self.run_path(path, period_id).into_records()
    }

    /// Run the extraction stages over an already loaded document
    pub fn run_document(&self, document: &LoadedDocument, period_id: &str) -> ParseOutcome {
        let stage = Cell::new("batch number");
        let name = document.sheet_name.as_str();
        self.guarded(name, &stage, || {
            self.run_stages(document, name, period_id, &stage)
        })
    }

    fn run_stages(
        &self,
        document: &LoadedDocument,
        document_name: &str,
        period_id: &str,
        stage: &Cell<&'static str>,
    ) -> ParseOutcome {
        match self.extract(document, period_id, stage) {
            Ok(report) => {
                stage.set("report");
                if tracing::enabled!(tracing::Level::DEBUG) {
                    debug!("{}", render_report(&report, document_name));
                }
                ParseOutcome::Parsed(report)
            }
            Err(e) => {
                error!("Parse of {} aborted: {}", document_name, e);
                ParseOutcome::StructuralFailure(e)
            }
        }
    }

    fn extract(
        &self,
        document: &LoadedDocument,
        period_id: &str,
        stage: &Cell<&'static str>,
    ) -> ExtractResult<ParseReport> {
        let period_id = if period_id.trim().is_empty() {
            constants::DEFAULT_PERIOD_ID
        } else {
            period_id
        };

        stage.set("batch number");
        let batch = self.batch.identify(document)?;
        stage.set("data range");
        let range = self.range.detect(document)?;
        stage.set("column mapping");
        let mapping = self.mapper.map(&document.grid, &range);

        stage.set("composite detection");
        let composites = CompositeGroups::detect(
            &document.grid,
            &range,
            mapping.get(FieldKey::PlacesCount),
            period_id,
            &batch.batch_number_numeric,
        );
        stage.set("row extraction");
        let extraction = self
            .extractor
            .extract(&document.grid, &range, &mapping, &batch, &composites);
        stage.set("aggregation");
        let summary = BatchSummary::from_records(&extraction.records);

        info!(
            "Parse complete: {} records ({} rows dropped)",
            extraction.records.len(),
            extraction.dropped_rows.len()
        );
        info!(
            "Batch {} totals: {} places ({} composite), {} boxes, {} kg, {} m3, {} $, {} clients",
            batch.batch_number,
            summary.total_places,
            summary.total_composite_places,
            summary.total_boxes,
            summary.total_weight,
            summary.total_volume,
            summary.total_amount,
            summary.unique_clients
        );

        Ok(ParseReport {
            batch,
            range,
            mapping,
            records: extraction.records,
            summary,
            dropped_rows: extraction.dropped_rows,
        })
    }

    /// Load a document and run every stage up to column mapping
    pub fn inspect(&self, bytes: &[u8]) -> LoadResult<Inspection> {
        let document = self.loader.load_bytes(bytes)?;
        let grid = &document.grid;

        let batch = self.batch.identify(&document).ok();
        let range = self.range.detect(&document).ok();
        let mapping = range.map(|r| self.mapper.map(grid, &r));
        let composite_groups = match (&range, &mapping) {
            (Some(r), Some(m)) => {
                let numeric = batch
                    .as_ref()
                    .map(|b| b.batch_number_numeric.as_str())
                    .unwrap_or_default();
                CompositeGroups::detect(
                    grid,
                    r,
                    m.get(FieldKey::PlacesCount),
                    constants::DEFAULT_PERIOD_ID,
                    numeric,
                )
                .len()
            }
            _ => 0,
        };

        Ok(Inspection {
            sheet_name: document.sheet_name.clone(),
            format: Some(document.format),
            rows: grid.max_row(),
            columns: grid.max_column(),
            cells: grid.cell_count(),
            merged_ranges: grid.merged_ranges().len(),
            tabular_available: document.tabular.is_some(),
            batch,
            range,
            mapping,
            composite_groups,
        })
    }

    /// Runs `body`, turning a panic into [`ParseOutcome::Failed`] logged with
    /// the document and the stage that was running
    fn guarded<F>(&self, document_name: &str, stage: &Cell<&'static str>, body: F) -> ParseOutcome
    where
        F: FnOnce() -> ParseOutcome,
    {
        match catch_unwind(AssertUnwindSafe(body)) {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(
                    document = document_name,
                    stage = stage.get(),
                    "Internal error during {} of {}: {}",
                    stage.get(),
                    document_name,
                    message
                );
                ParseOutcome::Failed {
                    message: format!("{} failed: {}", stage.get(), message),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::document::{CellValue, RawGrid};
    use crate::app::translate::PassthroughTranslator;
    use crate::errors::TranslationResult;

    fn parser() -> ManifestParser {
        ManifestParser::with_translator(Arc::new(PassthroughTranslator))
    }

    fn manifest_grid() -> RawGrid {
        let mut grid = RawGrid::new();
        grid.set(2, 4, CellValue::Text("P12-A".into()));
        for (row, code) in [(6, "AB123"), (7, "AB124")] {
            grid.set(row, 1, CellValue::Text(code.into()));
            grid.set(row, 4, CellValue::Int(1));
        }
        grid
    }

    #[test]
    fn test_run_document_success() {
        let document = LoadedDocument::from_grid(manifest_grid(), usize::MAX);
        let outcome = parser().run_document(&document, "2024-05");

        let report = outcome.report().unwrap();
        assert_eq!(report.batch.batch_number_numeric, "12");
        assert_eq!(report.range, DataRange::new(6, 7));
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.summary.total_places, 2);
    }

    #[test]
    fn test_structural_failure_yields_empty_records() {
        let mut grid = RawGrid::new();
        grid.set(6, 1, CellValue::Text("AB123".into()));
        let document = LoadedDocument::from_grid(grid, usize::MAX);

        let outcome = parser().run_document(&document, "p");
        assert!(matches!(
            outcome,
            ParseOutcome::StructuralFailure(ExtractError::BatchNumberNotFound { .. })
        ));
        assert!(outcome.into_records().is_empty());
    }

    #[test]
    fn test_unreadable_bytes_fail_quietly() {
        let outcome = parser().run(b"not a spreadsheet", "p");
        assert!(matches!(outcome, ParseOutcome::Failed { .. }));
        assert!(parser().parse(b"", "p").is_empty());
    }

    struct PanickingTranslator;

    impl Translator for PanickingTranslator {
        fn translate(&self, _: &str, _: Language, _: Language) -> TranslationResult<String> {
            panic!("translator exploded")
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[test]
    fn test_internal_panic_is_contained() {
        let mut grid = manifest_grid();
        grid.set(6, 12, CellValue::Text("衣服".into()));
        let document = LoadedDocument::from_grid(grid, usize::MAX);

        let parser = ManifestParser::with_translator(Arc::new(PanickingTranslator));
        match parser.run_document(&document, "p") {
            ParseOutcome::Failed { message } => {
                assert!(message.contains("exploded"));
                assert!(message.starts_with("row extraction failed"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_empty_period_uses_default() {
        let mut grid = manifest_grid();
        grid.add_merged_range(crate::app::document::MergedRange::new(6, 4, 7, 4));
        let document = LoadedDocument::from_grid(grid, usize::MAX);

        let report = parser().run_document(&document, " ").report().cloned().unwrap();
        assert_eq!(report.records[0].composite_id.as_deref(), Some("unknown-12-2-1"));
    }
}
