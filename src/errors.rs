//! Error types for Freight Manifest
//!
//! This module defines the error types for every stage of the extraction
//! pipeline. Only loading, configuration and translation errors are ever
//! returned to callers; extraction errors are folded into a
//! [`ParseOutcome`](crate::app::ParseOutcome) by the parser.

use std::path::PathBuf;

use thiserror::Error;

/// Document loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    /// The blob is not one of the supported spreadsheet containers
    #[error("Unsupported spreadsheet container (leading bytes: {signature})")]
    UnsupportedFormat { signature: String },

    /// File extension not recognised as a spreadsheet
    #[error("Unsupported file extension: {extension}")]
    UnsupportedExtension { extension: String },

    /// calamine failed to open or decode the workbook
    #[error("Failed to read workbook: {reason}")]
    Workbook { reason: String },

    /// The workbook has no worksheets
    #[error("Workbook contains no worksheets")]
    NoWorksheets,

    /// Bulk tabular view rejected (too large to materialize)
    #[error("Tabular view unavailable: {cells} cells exceeds limit of {limit}")]
    TabularTooLarge { cells: usize, limit: usize },

    /// I/O error while reading the document
    #[error("Document I/O error")]
    Io(#[from] std::io::Error),
}

/// Structural extraction failures
///
/// These abort a parse but never propagate past the parser boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No batch/balance number anywhere in the scanned block
    #[error("Batch number not found in the top-left {rows}x{columns} block")]
    BatchNumberNotFound { rows: usize, columns: usize },

    /// No client-code rows in the first column
    #[error("Data range not found: no client codes in column 1")]
    DataRangeNotFound,
}

/// Translation capability errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// HTTP transport error
    #[error("Translation request failed")]
    Http(#[from] reqwest::Error),

    /// Translation service answered with an error status
    #[error("Translation service error: HTTP {status}")]
    ServerError { status: u16 },

    /// Maximum retries exceeded
    #[error("Translation failed after {max_retries} retries")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Response did not contain a translation
    #[error("Translation response could not be parsed: {reason}")]
    InvalidResponse { reason: String },

    /// Invalid endpoint URL
    #[error("Invalid translation endpoint: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Offline dictionary has no entry for the text
    #[error("No dictionary entry for: {text}")]
    MissingEntry { text: String },

    /// Rate limiter could not be configured
    #[error("Invalid rate limit: {reason}")]
    RateLimit { reason: String },

    /// Translation is switched off
    #[error("Translation disabled")]
    Disabled,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O error reading or writing configuration
    #[error("Configuration I/O error")]
    Io(#[from] std::io::Error),
}

/// Upload materialization errors
#[derive(Error, Debug)]
pub enum UploadError {
    /// Writing the upload to a temporary file failed
    #[error("Failed to materialize upload to temporary file")]
    TempFile(#[from] std::io::Error),

    /// The blocking parse task panicked or was cancelled
    #[error("Parse task failed: {reason}")]
    TaskFailed { reason: String },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Document loading error
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Structural extraction error
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Translation error
    #[error(transparent)]
    Translation(#[from] TranslationError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Upload error
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Load(_) => "load",
            AppError::Extract(_) => "structure",
            AppError::Translation(_) => "translation",
            AppError::Config(_) => "config",
            AppError::Upload(_) => "upload",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Load result type alias
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Extraction result type alias
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Translation result type alias
pub type TranslationResult<T> = std::result::Result<T, TranslationError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
