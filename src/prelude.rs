//! Prelude module for Freight Manifest Library
//!
//! Re-exports the items needed for typical usage with a single
//! `use freight_manifest::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use freight_manifest::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let translator = config.translation_config()?.build_translator()?;
//!     let parser = Arc::new(ManifestParser::new(config.parser_config()?, translator));
//!
//!     let file = tokio::fs::File::open("manifest.xlsx").await?;
//!     let records = parse_upload(file, "manifest.xlsx", "2024-05", parser).await;
//!     println!("{} records", records.len());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Engine entry points and the data model
pub use crate::app::{
    parse_upload, render_report, BatchIdentity, BatchSummary, CargoRecord, ColumnMapping,
    DataRange, FieldKey, FieldValue, ManifestParser, ParseOutcome, ParseReport, ParserConfig,
};

// Translation capability
pub use crate::app::{
    DictionaryTranslator, Language, PassthroughTranslator, TranslationConfig, Translator,
};

pub use crate::config::AppConfig;

pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;
