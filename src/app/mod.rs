//! Core extraction engine for Freight Manifest
//!
//! This module contains the pipeline stages that turn a loosely formatted
//! partner spreadsheet into cargo records: document loading, batch number
//! discovery, data range detection, column mapping, row extraction with
//! composite place grouping, and batch aggregation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use freight_manifest::app::{DictionaryTranslator, ManifestParser};
//!
//! let translator = DictionaryTranslator::from_entries([("衣服", "Одежда")]);
//! let parser = ManifestParser::with_translator(Arc::new(translator));
//!
//! let bytes = std::fs::read("manifest.xlsx").unwrap();
//! for record in parser.parse(&bytes, "2024-05") {
//!     println!("{} {}", record.client_code(), record.composite_places_count);
//! }
//! ```

pub mod batch;
pub mod columns;
pub mod document;
pub mod extract;
pub mod models;
pub mod parser;
pub mod range;
pub mod report;
pub mod summary;
pub mod translate;
pub mod upload;

// Re-export main public API
pub use batch::{extract_batch_number, extract_numeric_part, BatchIdentifier, BatchSearchConfig};
pub use columns::{partial_ratio, ColumnMapper, MappingConfig};
pub use document::{
    CellValue, DocumentLoader, LoadedDocument, MergedRange, RawGrid, SpreadsheetFormat,
    TabularView,
};
pub use extract::{
    CompositeGroup, CompositeGroups, CompositeTag, FieldNormalizer, RowExtraction, RowExtractor,
};
pub use models::{BatchIdentity, CargoRecord, ColumnMapping, FieldKey, FieldKind, FieldValue};
pub use parser::{Inspection, ManifestParser, ParseOutcome, ParseReport, ParserConfig};
pub use range::{DataRange, DataRangeDetector};
pub use report::{render_report, render_summary, render_table};
pub use summary::BatchSummary;
pub use translate::{
    DictionaryTranslator, GoogleTranslator, Language, PassthroughTranslator, TranslationBackend,
    TranslationConfig, Translator,
};
pub use upload::{parse_upload, run_upload};
