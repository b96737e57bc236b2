//! Offline translation from a lookup table
//!
//! The table is a flat TOML document mapping source text to its
//! translation:
//!
//! ```toml
//! "衣服" = "Одежда"
//! "鞋子" = "Обувь"
//! ```
//!
//! Lookups ignore the language pair; one file serves one direction.

use std::collections::HashMap;
use std::path::Path;

use super::{Language, Translator};
use crate::errors::{ConfigError, ConfigResult, TranslationError, TranslationResult};

#[derive(Debug, Clone, Default)]
pub struct DictionaryTranslator {
    entries: HashMap<String, String>,
}

impl DictionaryTranslator {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into().trim().to_string(), v.into()))
                .collect(),
        }
    }

    /// Load a TOML lookup table
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or not a flat string table
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let entries: HashMap<String, String> = toml::from_str(&content)?;
        tracing::info!(
            "Loaded {} dictionary entries from {}",
            entries.len(),
            path.display()
        );
        Ok(Self::from_entries(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Translator for DictionaryTranslator {
    fn translate(&self, text: &str, _: Language, _: Language) -> TranslationResult<String> {
        let key = text.trim();
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| TranslationError::MissingEntry {
                text: key.to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "dictionary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_lookup_trims_input() {
        let dictionary = DictionaryTranslator::from_entries([("衣服", "Одежда")]);
        let result = dictionary
            .translate(" 衣服 ", Language::ChineseTraditional, Language::Russian)
            .unwrap();
        assert_eq!(result, "Одежда");
    }

    #[test]
    fn test_missing_entry() {
        let dictionary = DictionaryTranslator::default();
        assert!(matches!(
            dictionary.translate("鞋子", Language::ChineseTraditional, Language::Russian),
            Err(TranslationError::MissingEntry { .. })
        ));
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "\"衣服\" = \"Одежда\"\n\"鞋子\" = \"Обувь\"").unwrap();

        let dictionary = DictionaryTranslator::from_path(file.path()).unwrap();
        assert_eq!(dictionary.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = DictionaryTranslator::from_path("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }
}
