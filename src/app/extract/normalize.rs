//! Per-field value normalization
//!
//! Every rule degrades instead of failing: when a cell cannot be coerced to
//! its field's type the original cell is kept as [`FieldValue::Raw`].

use std::borrow::Cow;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::app::document::CellValue;
use crate::app::models::{FieldKey, FieldKind, FieldValue};
use crate::app::translate::{Language, Translator};
use crate::constants::normalize;

static DECIMAL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(normalize::DECIMAL_PATTERN).ok());
static DIGIT_RUN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(normalize::DIGIT_RUN_PATTERN).ok());
static SHORT_DATE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(normalize::SHORT_DATE_PATTERN).ok());

fn first_capture<'t>(pattern: &Lazy<Option<Regex>>, text: &'t str) -> Option<&'t str> {
    pattern
        .as_ref()?
        .captures(text)?
        .get(1)
        .map(|m| m.as_str())
}

/// First digit run of a client code, e.g. "AB123C" -> "123"
pub fn client_code_numeric(code: &str) -> String {
    first_capture(&DIGIT_RUN, code)
        .unwrap_or_default()
        .to_string()
}

fn ascii_digit(c: char) -> Option<char> {
    let code = u32::from(c);
    normalize::FOLDED_DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&code))
        .and_then(|&zero| char::from_digit(code - zero, 10))
}

/// Rewrites fullwidth and other non-ASCII decimal digits as ASCII digits
fn fold_digits(text: &str) -> Cow<'_, str> {
    if text.is_ascii() || !text.chars().any(|c| ascii_digit(c).is_some()) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.chars().map(|c| ascii_digit(c).unwrap_or(c)).collect())
}

/// First decimal number embedded in free text, e.g. "182$" -> 182.0
pub fn embedded_decimal(text: &str) -> Option<f64> {
    let folded = fold_digits(text);
    first_capture(&DECIMAL, &folded)?.parse().ok()
}

/// Converts raw cells into typed field values
pub struct FieldNormalizer {
    translator: Arc<dyn Translator>,
    source: Language,
    target: Language,
}

impl std::fmt::Debug for FieldNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldNormalizer")
            .field("translator", &self.translator.name())
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

impl FieldNormalizer {
    pub fn new(translator: Arc<dyn Translator>, source: Language, target: Language) -> Self {
        Self {
            translator,
            source,
            target,
        }
    }

    pub fn normalize(&self, field: FieldKey, cell: &CellValue) -> FieldValue {
        if is_blank(cell) {
            return FieldValue::Null;
        }

        match field.kind() {
            FieldKind::ClientCode => match cell {
                CellValue::Text(text) => FieldValue::Text(text.trim().to_string()),
                _ => FieldValue::Null,
            },
            FieldKind::DateCode => normalize_date_code(cell),
            FieldKind::Count => normalize_count(field, cell),
            FieldKind::Measure => normalize_measure(field, cell),
            FieldKind::Amount => self.normalize_amount(field, cell),
            FieldKind::ProductName => self.normalize_product_name(cell),
        }
    }

    fn translate(&self, text: &str) -> Option<String> {
        match self.translator.translate(text, self.source, self.target) {
            Ok(translated) => Some(translated),
            Err(e) => {
                warn!("Translation of '{}' failed, keeping original: {}", text, e);
                None
            }
        }
    }

    fn normalize_amount(&self, field: FieldKey, cell: &CellValue) -> FieldValue {
        match cell {
            CellValue::Text(text) => {
                if let Some(number) = embedded_decimal(text) {
                    return FieldValue::Float(number);
                }
                if field == FieldKey::Total {
                    if let Some(translated) = self.translate(text) {
                        return FieldValue::Text(translated);
                    }
                }
                debug!("No number in {} value '{}', keeping text", field, text);
                FieldValue::Raw(cell.clone())
            }
            CellValue::Int(i) => FieldValue::Float(*i as f64),
            CellValue::Float(f) => FieldValue::Float(*f),
            _ => degrade(field, cell),
        }
    }

    fn normalize_product_name(&self, cell: &CellValue) -> FieldValue {
        match cell {
            CellValue::Text(text) => match self.translate(text) {
                Some(translated) => {
                    debug!("Translated product name '{}' -> '{}'", text, translated);
                    FieldValue::Text(translated)
                }
                None => FieldValue::Text(text.clone()),
            },
            _ => FieldValue::Raw(cell.clone()),
        }
    }
}

fn is_blank(cell: &CellValue) -> bool {
    match cell {
        CellValue::Empty => true,
        CellValue::Text(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn degrade(field: FieldKey, cell: &CellValue) -> FieldValue {
    debug!("Could not coerce {} value '{}', keeping original", field, cell);
    FieldValue::Raw(cell.clone())
}

fn normalize_date_code(cell: &CellValue) -> FieldValue {
    match cell {
        CellValue::Text(text) => {
            let code = text.trim();
            let is_short_code = SHORT_DATE
                .as_ref()
                .map(|pattern| pattern.is_match(code))
                .unwrap_or(false);
            if !is_short_code {
                debug!("Departure date '{}' is not a short date code", code);
            }
            FieldValue::Text(code.to_string())
        }
        other => FieldValue::Raw(other.clone()),
    }
}

fn normalize_count(field: FieldKey, cell: &CellValue) -> FieldValue {
    match cell {
        CellValue::Int(i) => FieldValue::Integer(*i),
        CellValue::Float(f) if f.is_finite() && f.fract() == 0.0 => FieldValue::Integer(*f as i64),
        CellValue::Text(text) => match fold_digits(text.trim()).parse::<i64>() {
            Ok(count) => FieldValue::Integer(count),
            Err(_) => degrade(field, cell),
        },
        _ => degrade(field, cell),
    }
}

fn normalize_measure(field: FieldKey, cell: &CellValue) -> FieldValue {
    match cell {
        CellValue::Int(i) => FieldValue::Float(*i as f64),
        CellValue::Float(f) => FieldValue::Float(*f),
        CellValue::Text(text) => {
            let folded = fold_digits(text.trim()).replace(',', ".");
            match folded.parse::<f64>() {
                Ok(value) if value.is_finite() => FieldValue::Float(value),
                _ => degrade(field, cell),
            }
        }
        _ => degrade(field, cell),
    }
}
