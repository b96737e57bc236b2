//! Data models for Freight Manifest
//!
//! This module defines the logical schema recovered from a partner
//! spreadsheet: the fifteen field keys, the per-field value variant, the
//! column mapping and the emitted cargo record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::app::document::CellValue;

/// Logical manifest fields, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    #[serde(rename = "clientCode")]
    ClientCode,
    /// Wire name keeps the historical spelling used by downstream storage
    #[serde(rename = "depatureFromChinaDate")]
    DepartureFromChinaDate,
    #[serde(rename = "placesCount")]
    PlacesCount,
    #[serde(rename = "weight")]
    Weight,
    #[serde(rename = "boxesCount")]
    BoxesCount,
    #[serde(rename = "cubicTariff")]
    CubicTariff,
    #[serde(rename = "unitsCount")]
    UnitsCount,
    #[serde(rename = "productName")]
    ProductName,
    #[serde(rename = "productPrice")]
    ProductPrice,
    #[serde(rename = "insurancePercent")]
    InsurancePercent,
    #[serde(rename = "volume")]
    Volume,
    #[serde(rename = "freightTariff")]
    FreightTariff,
    #[serde(rename = "insurance")]
    Insurance,
    #[serde(rename = "packaging")]
    Packaging,
    #[serde(rename = "total")]
    Total,
}

/// How a field's raw cell is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Trimmed identifier; rows without one are dropped
    ClientCode,
    /// Trimmed free-form date code
    DateCode,
    /// Whole number
    Count,
    /// Decimal that may use a comma separator
    Measure,
    /// Money or rate; first number embedded in text
    Amount,
    /// Chinese text translated on the way in
    ProductName,
}

impl FieldKey {
    /// Every field in canonical order
    pub const ALL: [FieldKey; 15] = [
        FieldKey::ClientCode,
        FieldKey::DepartureFromChinaDate,
        FieldKey::PlacesCount,
        FieldKey::Weight,
        FieldKey::BoxesCount,
        FieldKey::CubicTariff,
        FieldKey::UnitsCount,
        FieldKey::ProductName,
        FieldKey::ProductPrice,
        FieldKey::InsurancePercent,
        FieldKey::Volume,
        FieldKey::FreightTariff,
        FieldKey::Insurance,
        FieldKey::Packaging,
        FieldKey::Total,
    ];

    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::ClientCode => "clientCode",
            FieldKey::DepartureFromChinaDate => "depatureFromChinaDate",
            FieldKey::PlacesCount => "placesCount",
            FieldKey::Weight => "weight",
            FieldKey::BoxesCount => "boxesCount",
            FieldKey::CubicTariff => "cubicTariff",
            FieldKey::UnitsCount => "unitsCount",
            FieldKey::ProductName => "productName",
            FieldKey::ProductPrice => "productPrice",
            FieldKey::InsurancePercent => "insurancePercent",
            FieldKey::Volume => "volume",
            FieldKey::FreightTariff => "freightTariff",
            FieldKey::Insurance => "insurance",
            FieldKey::Packaging => "packaging",
            FieldKey::Total => "total",
        }
    }

    /// Look a field up by its wire name
    pub fn from_name(name: &str) -> Option<FieldKey> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name.trim())
    }

    /// Normalization rule for the field
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldKey::ClientCode => FieldKind::ClientCode,
            FieldKey::DepartureFromChinaDate => FieldKind::DateCode,
            FieldKey::PlacesCount | FieldKey::BoxesCount | FieldKey::UnitsCount => {
                FieldKind::Count
            }
            FieldKey::Weight | FieldKey::Volume => FieldKind::Measure,
            FieldKey::ProductName => FieldKind::ProductName,
            FieldKey::CubicTariff
            | FieldKey::ProductPrice
            | FieldKey::InsurancePercent
            | FieldKey::FreightTariff
            | FieldKey::Insurance
            | FieldKey::Packaging
            | FieldKey::Total => FieldKind::Amount,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized field value
///
/// Normalization never fails: when coercion is impossible the untouched
/// cell is kept as [`FieldValue::Raw`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Empty cell or unmapped column
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    /// Original cell value after a failed coercion
    Raw(CellValue),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric view used by aggregation; raw and text values count as absent
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Raw(CellValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Raw(cell) => write!(f, "{}", cell),
        }
    }
}

/// Identity of the manifest, discovered once per document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchIdentity {
    /// Batch number as found, e.g. "A123-B"
    pub batch_number: String,
    /// Digit run between the two letters, e.g. "123"; empty if absent
    pub batch_number_numeric: String,
}

/// Logical field to physical 1-indexed column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping(BTreeMap<FieldKey, usize>);

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: FieldKey, column: usize) {
        self.0.insert(field, column);
    }

    pub fn get(&self, field: FieldKey) -> Option<usize> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: FieldKey) -> bool {
        self.0.contains_key(&field)
    }

    /// Highest column assigned so far
    pub fn max_column(&self) -> Option<usize> {
        self.0.values().copied().max()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, usize)> + '_ {
        self.0.iter().map(|(field, column)| (*field, *column))
    }
}

impl fmt::Display for ColumnMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, column)| format!("{}={}", field, column))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// One manifest line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoRecord {
    /// Sheet row the record came from (1-indexed)
    pub source_row: usize,
    pub batch_number: String,
    pub batch_number_numeric: String,
    /// First digit run of the client code; empty if none
    pub client_code_numeric: String,
    /// Normalized values for every mapped field
    #[serde(flatten)]
    pub fields: BTreeMap<FieldKey, FieldValue>,
    pub is_composite_cargo: bool,
    pub is_main_composite_row: bool,
    pub composite_group_id: Option<String>,
    /// Span of the composite group; 1 for ordinary rows
    pub composite_places_count: usize,
    pub composite_id: Option<String>,
}

impl CargoRecord {
    /// Value of a field, `Null` when the column was never mapped
    pub fn field(&self, key: FieldKey) -> &FieldValue {
        static NULL: FieldValue = FieldValue::Null;
        self.fields.get(&key).unwrap_or(&NULL)
    }

    pub fn client_code(&self) -> &str {
        self.field(FieldKey::ClientCode).as_text().unwrap_or("")
    }
}
