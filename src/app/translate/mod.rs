//! Translation capability
//!
//! Product names in partner documents are written in Chinese and stored in
//! Russian. The extraction engine only sees the [`Translator`] trait, so
//! the online backend can be swapped for an offline dictionary or stubbed
//! out entirely.
//!
//! - `google`: scrapes the public mobile translate page
//! - `dictionary`: offline lookup table loaded from TOML

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::translate;
use crate::errors::{ConfigError, Result, TranslationError, TranslationResult};

pub mod dictionary;
pub mod google;

pub use dictionary::DictionaryTranslator;
pub use google::GoogleTranslator;

/// Languages the engine translates between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "zh-TW")]
    ChineseTraditional,
    #[serde(rename = "ru")]
    Russian,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// Code understood by the translate endpoint
    pub fn code(&self) -> &'static str {
        match self {
            Language::ChineseTraditional => "zh-TW",
            Language::Russian => "ru",
            Language::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh-tw" | "zh_tw" | "chinese (traditional)" => Ok(Language::ChineseTraditional),
            "ru" | "russian" => Ok(Language::Russian),
            "en" | "english" => Ok(Language::English),
            other => Err(ConfigError::InvalidValue {
                field: "language".to_string(),
                value: other.to_string(),
                reason: "Expected one of zh-TW, ru, en".to_string(),
            }),
        }
    }
}

/// Text translation between two languages
///
/// Implementations must be deterministic for identical inputs within one
/// instance's lifetime so repeated parses produce identical records.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, source: Language, target: Language)
        -> TranslationResult<String>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

impl<T: Translator + ?Sized> Translator for Arc<T> {
    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> TranslationResult<String> {
        (**self).translate(text, source, target)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Translation switched off; every call fails with `Disabled`
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

impl Translator for PassthroughTranslator {
    fn translate(&self, _: &str, _: Language, _: Language) -> TranslationResult<String> {
        Err(TranslationError::Disabled)
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Which translator to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackend {
    Google,
    Dictionary,
    None,
}

impl FromStr for TranslationBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "dictionary" => Ok(Self::Dictionary),
            "none" | "off" => Ok(Self::None),
            other => Err(ConfigError::InvalidValue {
                field: "translation.backend".to_string(),
                value: other.to_string(),
                reason: "Expected google, dictionary or none".to_string(),
            }),
        }
    }
}

/// Runtime translation settings
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub backend: TranslationBackend,
    pub endpoint: String,
    pub source: Language,
    pub target: Language,
    pub request_timeout: Duration,
    pub rate_limit_rps: u32,
    pub max_retries: u32,
    pub dictionary_path: Option<PathBuf>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: TranslationBackend::Google,
            endpoint: translate::DEFAULT_ENDPOINT.to_string(),
            source: Language::ChineseTraditional,
            target: Language::Russian,
            request_timeout: translate::DEFAULT_TIMEOUT,
            rate_limit_rps: translate::DEFAULT_RATE_LIMIT_RPS,
            max_retries: translate::MAX_RETRIES,
            dictionary_path: None,
        }
    }
}

impl TranslationConfig {
    /// Build the configured translator
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint or rate limit is invalid, or the
    /// dictionary cannot be loaded
    pub fn build_translator(&self) -> Result<Arc<dyn Translator>> {
        let translator: Arc<dyn Translator> = match self.backend {
            TranslationBackend::Google => Arc::new(GoogleTranslator::new(self)?),
            TranslationBackend::Dictionary => {
                let path = self.dictionary_path.as_ref().ok_or_else(|| {
                    ConfigError::InvalidValue {
                        field: "translation.dictionary_path".to_string(),
                        value: String::new(),
                        reason: "Required for the dictionary backend".to_string(),
                    }
                })?;
                Arc::new(DictionaryTranslator::from_path(path)?)
            }
            TranslationBackend::None => Arc::new(PassthroughTranslator),
        };
        tracing::debug!("Using '{}' translation backend", translator.name());
        Ok(translator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!("zh-TW".parse::<Language>().unwrap(), Language::ChineseTraditional);
        assert_eq!("RU".parse::<Language>().unwrap(), Language::Russian);
        assert_eq!(Language::English.code(), "en");
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_passthrough_is_disabled() {
        let result = PassthroughTranslator.translate(
            "衣服",
            Language::ChineseTraditional,
            Language::Russian,
        );
        assert!(matches!(result, Err(TranslationError::Disabled)));
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!(
            "Dictionary".parse::<TranslationBackend>().unwrap(),
            TranslationBackend::Dictionary
        );
        assert!("deepl".parse::<TranslationBackend>().is_err());
    }

    #[test]
    fn test_dictionary_backend_requires_path() {
        let config = TranslationConfig {
            backend: TranslationBackend::Dictionary,
            ..Default::default()
        };
        assert!(config.build_translator().is_err());
    }

    #[test]
    fn test_none_backend_builds() {
        let config = TranslationConfig {
            backend: TranslationBackend::None,
            ..Default::default()
        };
        let translator = config.build_translator().unwrap();
        assert_eq!(translator.name(), "none");
    }
}
