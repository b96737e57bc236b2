//! Configuration management for Freight Manifest
//!
//! Settings come from a TOML file with `[extraction]`, `[translation]` and
//! `[logging]` sections. Every key is optional; anything left out keeps its
//! built-in default, so running without a file behaves exactly like an
//! empty one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{
    BatchSearchConfig, FieldKey, Language, MappingConfig, ParserConfig, TranslationBackend,
    TranslationConfig,
};
use crate::constants::{batch, columns, config as paths, loader, range, translate};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Heuristic tables and limits for the extraction pipeline
    pub extraction: ExtractionConfigToml,
    /// Translation backend settings
    pub translation: TranslationConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfigToml {
    /// Rows of the top-left block searched for the batch number
    pub scan_rows: usize,
    /// Columns of the top-left block searched for the batch number
    pub scan_columns: usize,
    /// [row, column] checked directly for the batch number, 1-indexed
    pub well_known_batch_cell: [usize; 2],
    /// Labels that sit next to the batch number
    pub batch_keywords: Vec<String>,
    /// Non-matching rows that confirm the end of the data
    pub end_gap_rows: usize,
    /// Fuzzy header scores must exceed this (0-100)
    pub fuzzy_threshold: u8,
    /// Column that always holds the departure date
    pub departure_column: usize,
    /// Sheets larger than this get no tabular view
    pub max_tabular_cells: usize,
    /// Header keywords keyed by field wire name; listed fields replace the defaults
    pub column_keywords: BTreeMap<String, Vec<String>>,
}

impl Default for ExtractionConfigToml {
    fn default() -> Self {
        let column_keywords = MappingConfig::default()
            .keywords
            .into_iter()
            .map(|(field, words)| (field.as_str().to_string(), words))
            .collect();

        Self {
            scan_rows: batch::SCAN_ROWS,
            scan_columns: batch::SCAN_COLUMNS,
            well_known_batch_cell: [batch::WELL_KNOWN_CELL.0, batch::WELL_KNOWN_CELL.1],
            batch_keywords: batch::KEYWORDS.iter().map(|k| k.to_string()).collect(),
            end_gap_rows: range::END_GAP_ROWS,
            fuzzy_threshold: columns::FUZZY_THRESHOLD,
            departure_column: columns::DEPARTURE_COLUMN,
            max_tabular_cells: loader::MAX_TABULAR_CELLS,
            column_keywords,
        }
    }
}

/// TOML-friendly translation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfigToml {
    /// google, dictionary or none
    pub backend: String,
    /// Translate page queried by the google backend
    pub endpoint: String,
    /// Language of product names in the documents
    pub source: String,
    /// Language records are produced in
    pub target: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// Retries for 429/503 and transport failures
    pub max_retries: u32,
    /// Lookup table for the dictionary backend
    pub dictionary_path: Option<PathBuf>,
}

impl Default for TranslationConfigToml {
    fn default() -> Self {
        Self {
            backend: "google".to_string(),
            endpoint: translate::DEFAULT_ENDPOINT.to_string(),
            source: Language::ChineseTraditional.code().to_string(),
            target: Language::Russian.code().to_string(),
            request_timeout_secs: translate::DEFAULT_TIMEOUT.as_secs(),
            rate_limit_rps: translate::DEFAULT_RATE_LIMIT_RPS,
            max_retries: translate::MAX_RETRIES,
            dictionary_path: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when no verbosity flag is given
    pub level: String,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            colored_output: true,
        }
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl ExtractionConfigToml {
    /// Check value ranges that the type system cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.fuzzy_threshold > 100 {
            return Err(invalid(
                "extraction.fuzzy_threshold",
                self.fuzzy_threshold,
                "Must be between 0 and 100",
            ));
        }
        if self.scan_rows == 0 || self.scan_columns == 0 {
            return Err(invalid(
                "extraction.scan_rows/scan_columns",
                format!("{}x{}", self.scan_rows, self.scan_columns),
                "The batch search block cannot be empty",
            ));
        }
        if self.well_known_batch_cell.contains(&0) {
            return Err(invalid(
                "extraction.well_known_batch_cell",
                format!("{:?}", self.well_known_batch_cell),
                "Rows and columns are 1-indexed",
            ));
        }
        if self.departure_column == 0 {
            return Err(invalid(
                "extraction.departure_column",
                self.departure_column,
                "Columns are 1-indexed",
            ));
        }
        Ok(())
    }

    /// Convert to the runtime pipeline configuration
    pub fn to_runtime_config(
        &self,
        source_language: Language,
        target_language: Language,
    ) -> ConfigResult<ParserConfig> {
        self.validate()?;

        let mut mapping = MappingConfig {
            fuzzy_threshold: self.fuzzy_threshold,
            departure_column: self.departure_column,
            ..MappingConfig::default()
        };
        for (name, words) in &self.column_keywords {
            let field = FieldKey::from_name(name).ok_or_else(|| {
                invalid(
                    "extraction.column_keywords",
                    name,
                    "Not a known field name",
                )
            })?;
            mapping.keywords.insert(field, words.clone());
        }

        Ok(ParserConfig {
            batch: BatchSearchConfig {
                scan_rows: self.scan_rows,
                scan_columns: self.scan_columns,
                well_known_cell: (self.well_known_batch_cell[0], self.well_known_batch_cell[1]),
                keywords: self
                    .batch_keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            },
            mapping,
            end_gap_rows: self.end_gap_rows,
            max_tabular_cells: self.max_tabular_cells,
            source_language,
            target_language,
        })
    }
}

impl TranslationConfigToml {
    /// Convert to the runtime translation configuration
    pub fn to_runtime_config(&self) -> ConfigResult<TranslationConfig> {
        if self.rate_limit_rps == 0 {
            return Err(invalid(
                "translation.rate_limit_rps",
                self.rate_limit_rps,
                "Must be greater than 0",
            ));
        }

        Ok(TranslationConfig {
            backend: self.backend.parse::<TranslationBackend>()?,
            endpoint: self.endpoint.clone(),
            source: self.source.parse()?,
            target: self.target.parse()?,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            rate_limit_rps: self.rate_limit_rps,
            max_retries: self.max_retries,
            dictionary_path: self.dictionary_path.clone(),
        })
    }
}

impl AppConfig {
    /// Runtime configuration for [`crate::app::ManifestParser`]
    pub fn parser_config(&self) -> ConfigResult<ParserConfig> {
        let translation = self.translation_config()?;
        self.extraction
            .to_runtime_config(translation.source, translation.target)
    }

    /// Runtime configuration for the translator
    pub fn translation_config(&self) -> ConfigResult<TranslationConfig> {
        self.translation.to_runtime_config()
    }

    /// Load configuration with precedence:
    /// 1. Explicit file (must exist)
    /// 2. `./freight-manifest.toml`
    /// 3. The user config directory
    /// 4. Built-in defaults
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.extraction.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(paths::LOCAL_FILE)];
        if let Some(user_path) = Self::default_config_path() {
            search_paths.push(user_path);
        }

        search_paths.into_iter().find(|path| {
            let found = path.exists();
            if found {
                debug!("Found config file: {}", path.display());
            }
            found
        })
    }

    /// The per-user config file location, if the platform has one
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(paths::APP_DIR).join(paths::FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the commented default configuration to `path`
    ///
    /// Refuses to replace an existing file unless `force` is set.
    pub async fn write_default(path: &Path, force: bool) -> ConfigResult<()> {
        if path.exists() && !force {
            return Err(invalid(
                "path",
                path.display(),
                "File already exists, use --force to overwrite",
            ));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, Self::generate_default_config_content()).await?;
        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    /// Generate default configuration content with comments
    pub fn generate_default_config_content() -> String {
        let defaults = ExtractionConfigToml::default();
        let translation = TranslationConfigToml::default();

        let column_keywords: String = defaults
            .column_keywords
            .iter()
            .map(|(field, words)| format!("{} = {}\n", field, toml_array(words)))
            .collect();

        format!(
            r#"# Freight Manifest Configuration
# Every key is optional; removed keys fall back to the built-in defaults.

[extraction]
# Top-left block searched for the batch number
scan_rows = {scan_rows}
scan_columns = {scan_columns}

# [row, column] where partners usually put the batch number
well_known_batch_cell = [{cell_row}, {cell_column}]

# Labels next to the batch number
batch_keywords = {batch_keywords}

# Non-matching rows that end the data block
end_gap_rows = {end_gap_rows}

# Fuzzy header scores must exceed this (0-100)
fuzzy_threshold = {fuzzy_threshold}

# Column that always holds the departure date
departure_column = {departure_column}

# Sheets above this many cells are read cell by cell only
max_tabular_cells = {max_tabular_cells}

[extraction.column_keywords]
# Header keywords per field; a listed field replaces its defaults
{column_keywords}
[translation]
# google, dictionary or none
backend = "{backend}"
endpoint = "{endpoint}"
source = "{source}"
target = "{target}"
request_timeout_secs = {timeout}
rate_limit_rps = {rps}
max_retries = {retries}
# Offline table of "source text" = "translation" pairs
# dictionary_path = "/path/to/dictionary.toml"

[logging]
level = "warn"  # error, warn, info, debug, trace
colored_output = true
"#,
            scan_rows = defaults.scan_rows,
            scan_columns = defaults.scan_columns,
            cell_row = defaults.well_known_batch_cell[0],
            cell_column = defaults.well_known_batch_cell[1],
            batch_keywords = toml_array(&defaults.batch_keywords),
            end_gap_rows = defaults.end_gap_rows,
            fuzzy_threshold = defaults.fuzzy_threshold,
            departure_column = defaults.departure_column,
            max_tabular_cells = defaults.max_tabular_cells,
            column_keywords = column_keywords,
            backend = translation.backend,
            endpoint = translation.endpoint,
            source = translation.source,
            target = translation.target,
            timeout = translation.request_timeout_secs,
            rps = translation.rate_limit_rps,
            retries = translation.max_retries,
        )
    }
}

fn toml_array(words: &[String]) -> String {
    let values = words.iter().cloned().map(toml::Value::String).collect();
    toml::Value::Array(values).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.extraction.fuzzy_threshold, columns::FUZZY_THRESHOLD);
        assert_eq!(config.extraction.well_known_batch_cell, [2, 4]);
        assert_eq!(config.extraction.column_keywords.len(), 15);
        assert_eq!(config.translation.backend, "google");
        assert_eq!(config.logging.level, "warn");

        let parser = config.parser_config().unwrap();
        assert_eq!(parser.mapping, MappingConfig::default());
        assert_eq!(parser.batch, BatchSearchConfig::default());
        assert_eq!(parser.target_language, Language::Russian);
    }

    #[test]
    fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content();

        // Should be valid TOML and round back to the defaults
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, AppConfig::default());
        assert!(content.contains("# Freight Manifest Configuration"));
        assert!(content.contains("[extraction.column_keywords]"));
        assert!(content.contains("вес"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
[extraction]
fuzzy_threshold = 80

[extraction.column_keywords]
weight = ["Brutto"]
"#,
        )
        .unwrap();

        assert_eq!(parsed.extraction.end_gap_rows, range::END_GAP_ROWS);
        assert_eq!(parsed.translation, TranslationConfigToml::default());

        let parser = parsed.parser_config().unwrap();
        assert_eq!(parser.mapping.fuzzy_threshold, 80);
        assert_eq!(
            parser.mapping.keywords.get(&FieldKey::Weight),
            Some(&vec!["Brutto".to_string()])
        );
        // Fields not listed keep their defaults
        assert_eq!(
            parser.mapping.keywords.get(&FieldKey::Volume),
            MappingConfig::default().keywords.get(&FieldKey::Volume)
        );
    }

    #[test]
    fn test_validation() {
        let mut extraction = ExtractionConfigToml {
            fuzzy_threshold: 101,
            ..Default::default()
        };
        assert!(extraction.validate().is_err());

        extraction.fuzzy_threshold = 70;
        extraction.scan_rows = 0;
        assert!(extraction.validate().is_err());

        extraction.scan_rows = 10;
        extraction.departure_column = 0;
        assert!(extraction.validate().is_err());

        extraction.departure_column = 3;
        assert!(extraction.validate().is_ok());

        extraction
            .column_keywords
            .insert("colour".to_string(), vec!["цвет".to_string()]);
        assert!(extraction
            .to_runtime_config(Language::ChineseTraditional, Language::Russian)
            .is_err());
    }

    #[test]
    fn test_translation_conversion() {
        let toml = TranslationConfigToml {
            backend: "None".to_string(),
            target: "en".to_string(),
            request_timeout_secs: 3,
            ..Default::default()
        };
        let runtime = toml.to_runtime_config().unwrap();
        assert_eq!(runtime.backend, TranslationBackend::None);
        assert_eq!(runtime.target, Language::English);
        assert_eq!(runtime.request_timeout, Duration::from_secs(3));

        let bad = TranslationConfigToml {
            source: "klingon".to_string(),
            ..Default::default()
        };
        assert!(bad.to_runtime_config().is_err());
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        // Should fail when explicitly specified
        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_config_loading_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let test_config = r#"
[translation]
backend = "dictionary"
dictionary_path = "/tmp/dict.toml"

[logging]
level = "debug"
"#;
        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load(Some(config_path)).await.unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.translation.backend, "dictionary");
        assert_eq!(config.extraction, ExtractionConfigToml::default());
    }

    #[tokio::test]
    async fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        tokio::fs::write(&config_path, "[extraction]\nfuzzy_threshold = 150\n")
            .await
            .unwrap();

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[tokio::test]
    async fn test_write_default_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        AppConfig::write_default(&path, false).await.unwrap();
        assert!(path.exists());
        assert!(AppConfig::write_default(&path, false).await.is_err());
        AppConfig::write_default(&path, true).await.unwrap();

        let loaded = AppConfig::load(Some(path)).await.unwrap();
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn test_show_round_trips() {
        let rendered = AppConfig::default().to_toml_string().unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
