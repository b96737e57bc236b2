//! Logical field to physical column resolution
//!
//! Header text is matched first (verbatim keyword hits beat any fuzzy
//! score), then layout conventions fill in whatever the header did not
//! settle: the departure date always sits in column 3 with nine fields
//! after it, the freight tariff is recognised by its `182$` shape, and the
//! grand total lives in the right-most populated column.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use super::fuzzy::partial_ratio;
use crate::app::document::{CellValue, RawGrid};
use crate::app::models::{ColumnMapping, FieldKey};
use crate::app::range::DataRange;
use crate::constants::columns;

static FREIGHT_TARIFF: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(columns::FREIGHT_TARIFF_PATTERN).ok());

/// Header keywords per field, as they appear in partner documents
/// (Russian, Chinese, and the bilingual run-together forms)
const DEFAULT_KEYWORDS: [(FieldKey, &[&str]); 15] = [
    (
        FieldKey::ClientCode,
        &["Литер", "литер", "Литер客户代码/日期", "客户代码/日期"],
    ),
    (FieldKey::DepartureFromChinaDate, &["客户代码/日期"]),
    (FieldKey::PlacesCount, &["мест", "Мест", "Мест包数", "包数"]),
    (FieldKey::Weight, &["вес", "Вес", " Вес重量", "Вес重量", "重量"]),
    (
        FieldKey::BoxesCount,
        &["коробки", "кор", "Коробки", "Кор", "Кор箱数", "箱数"],
    ),
    (FieldKey::CubicTariff, &["Цена运价", "Цена", "运价"]),
    (FieldKey::UnitsCount, &["шт", "Шт", "件数", "Шт件数"]),
    (
        FieldKey::ProductName,
        &["наименование", "品名", "наименование品名"],
    ),
    (
        FieldKey::ProductPrice,
        &["1ед", "货值", "цена", " 1ед货值", "1ед货值"],
    ),
    (FieldKey::InsurancePercent, &["%", "%保率", "保率"]),
    (FieldKey::Volume, &["Куб", "куб", "体积", "Куб体积"]),
    (
        FieldKey::FreightTariff,
        &["фрахт", "Фрахт", "运费", "фрахт运费", "Фрахт运费"],
    ),
    (
        FieldKey::Insurance,
        &[
            "Стр-ка",
            "стр-ка",
            "страховка",
            "Страховка",
            "保险费",
            "Стр-ка保险费",
        ],
    ),
    (
        FieldKey::Packaging,
        &[
            "Упа-ка",
            "упа-ка",
            "упаковка",
            "Упаковка",
            "包装费",
            "Упа-ка包装费",
            "упа-ка包装费",
        ],
    ),
    (
        FieldKey::Total,
        &["итого", "Итого", "总计$", "$", "Итого总计$"],
    ),
];

/// Fields laid out right after the departure date, in order
const POSITIONAL_FIELDS: [FieldKey; 9] = [
    FieldKey::PlacesCount,
    FieldKey::Weight,
    FieldKey::BoxesCount,
    FieldKey::CubicTariff,
    FieldKey::UnitsCount,
    FieldKey::ProductPrice,
    FieldKey::InsurancePercent,
    FieldKey::Volume,
    FieldKey::ProductName,
];

/// Heuristic tables used by [`ColumnMapper`]
#[derive(Debug, Clone, PartialEq)]
pub struct MappingConfig {
    /// Header keywords per field; compared lower-cased
    pub keywords: BTreeMap<FieldKey, Vec<String>>,
    /// Fuzzy scores must be strictly above this
    pub fuzzy_threshold: u8,
    /// Column forced for the departure date
    pub departure_column: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        let keywords = DEFAULT_KEYWORDS
            .iter()
            .map(|(field, words)| (*field, words.iter().map(|w| w.to_string()).collect()))
            .collect();
        Self {
            keywords,
            fuzzy_threshold: columns::FUZZY_THRESHOLD,
            departure_column: columns::DEPARTURE_COLUMN,
        }
    }
}

impl MappingConfig {
    /// Keywords for a field in comparable form
    fn normalized_keywords(&self, field: FieldKey) -> Vec<String> {
        self.keywords
            .get(&field)
            .map(|words| {
                words
                    .iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Builds the [`ColumnMapping`] for one document
#[derive(Debug, Clone, Default)]
pub struct ColumnMapper {
    config: MappingConfig,
}

impl ColumnMapper {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn map(&self, grid: &RawGrid, range: &DataRange) -> ColumnMapping {
        let mut mapping = ColumnMapping::new();
        mapping.insert(FieldKey::ClientCode, columns::CLIENT_CODE_COLUMN);

        if let Some(header_row) = range.header_row() {
            self.map_headers(grid, header_row, &mut mapping);
        }
        self.apply_layout_fallbacks(grid, range, &mut mapping);

        info!("Column mapping: {}", mapping);
        mapping
    }

    fn map_headers(&self, grid: &RawGrid, header_row: usize, mapping: &mut ColumnMapping) {
        let headers: Vec<(usize, String)> = (1..=grid.max_column())
            .filter_map(|column| {
                let text = grid.value(header_row, column).to_string();
                let text = text.trim().to_lowercase();
                (!text.is_empty()).then_some((column, text))
            })
            .collect();

        if headers.is_empty() {
            debug!("Header row {} is empty", header_row);
            return;
        }

        for field in FieldKey::ALL {
            // Both are settled by layout convention
            if matches!(
                field,
                FieldKey::ClientCode | FieldKey::DepartureFromChinaDate
            ) {
                continue;
            }

            let keywords = self.config.normalized_keywords(field);
            if keywords.is_empty() {
                continue;
            }

            if let Some((column, score)) = best_header_match(&headers, &keywords) {
                if score > self.config.fuzzy_threshold {
                    info!(
                        "Mapped {} to column {} (header score {})",
                        field, column, score
                    );
                    mapping.insert(field, column);
                } else {
                    debug!(
                        "Best header for {} scored {} at column {}, below threshold",
                        field, score, column
                    );
                }
            }
        }
    }

    fn apply_layout_fallbacks(
        &self,
        grid: &RawGrid,
        range: &DataRange,
        mapping: &mut ColumnMapping,
    ) {
        let departure = self.config.departure_column;
        mapping.insert(FieldKey::DepartureFromChinaDate, departure);

        for (offset, field) in POSITIONAL_FIELDS.iter().enumerate() {
            if !mapping.contains(*field) {
                mapping.insert(*field, departure + offset + 1);
            }
        }

        let mut next_free = mapping.max_column().unwrap_or(departure) + 1;

        match mapping.get(FieldKey::FreightTariff) {
            Some(column) => next_free = column + 1,
            None => {
                if let Some(column) = find_freight_column(grid, next_free, range.start) {
                    debug!("Freight tariff recognised by format in column {}", column);
                    mapping.insert(FieldKey::FreightTariff, column);
                    next_free = column + 1;
                }
            }
        }

        for field in [FieldKey::Insurance, FieldKey::Packaging] {
            if !mapping.contains(field) {
                mapping.insert(field, next_free);
                next_free += 1;
            }
        }

        if !mapping.contains(FieldKey::Total) {
            mapping.insert(FieldKey::Total, last_data_column(grid, range));
        }
    }
}

/// Column-ordered search; the first verbatim hit ends it, otherwise the
/// strictly best fuzzy score is kept
fn best_header_match(headers: &[(usize, String)], keywords: &[String]) -> Option<(usize, u8)> {
    let mut best: Option<(usize, u8)> = None;

    for (column, header) in headers {
        if keywords.iter().any(|k| header.contains(k.as_str())) {
            return Some((*column, columns::EXACT_MATCH_SCORE));
        }
        for keyword in keywords {
            let score = partial_ratio(keyword, header);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((*column, score));
            }
        }
    }
    best
}

fn find_freight_column(grid: &RawGrid, from_column: usize, sample_row: usize) -> Option<usize> {
    let pattern = FREIGHT_TARIFF.as_ref()?;
    (from_column..=grid.max_column()).find(|column| match grid.value(sample_row, *column) {
        CellValue::Text(text) => pattern.is_match(text.trim()),
        _ => false,
    })
}

fn last_data_column(grid: &RawGrid, range: &DataRange) -> usize {
    (1..=grid.max_column())
        .rev()
        .find(|column| range.rows().any(|row| !grid.value(row, *column).is_empty()))
        .unwrap_or_else(|| grid.max_column())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(grid: &mut RawGrid, row: usize, column: usize, value: &str) {
        grid.set(row, column, CellValue::Text(value.into()));
    }

    #[test]
    fn test_layout_only_mapping() {
        let mut grid = RawGrid::new();
        text(&mut grid, 1, 1, "AB1");
        text(&mut grid, 2, 1, "AB2");
        text(&mut grid, 1, 13, "182$");
        grid.set(2, 17, CellValue::Float(10.0));
        grid.set(1, 20, CellValue::Empty);

        let mapping = ColumnMapper::default().map(&grid, &DataRange::new(1, 2));

        assert_eq!(mapping.get(FieldKey::ClientCode), Some(1));
        assert_eq!(mapping.get(FieldKey::DepartureFromChinaDate), Some(3));
        assert_eq!(mapping.get(FieldKey::PlacesCount), Some(4));
        assert_eq!(mapping.get(FieldKey::ProductName), Some(12));
        assert_eq!(mapping.get(FieldKey::FreightTariff), Some(13));
        assert_eq!(mapping.get(FieldKey::Insurance), Some(14));
        assert_eq!(mapping.get(FieldKey::Packaging), Some(15));
        assert_eq!(mapping.get(FieldKey::Total), Some(17));
        assert_eq!(mapping.len(), 15);
    }

    #[test]
    fn test_no_freight_format_leaves_it_unmapped() {
        let mut grid = RawGrid::new();
        text(&mut grid, 1, 1, "AB1");
        text(&mut grid, 1, 13, "182");

        let mapping = ColumnMapper::default().map(&grid, &DataRange::new(1, 1));
        assert!(!mapping.contains(FieldKey::FreightTariff));
        assert_eq!(mapping.get(FieldKey::Insurance), Some(13));
        assert_eq!(mapping.get(FieldKey::Packaging), Some(14));
        assert_eq!(mapping.get(FieldKey::Total), Some(13));
    }

    #[test]
    fn test_header_keywords_override_positions() {
        let mut grid = RawGrid::new();
        text(&mut grid, 5, 2, "Вес重量");
        text(&mut grid, 5, 9, "Итого总计$");
        text(&mut grid, 6, 1, "AB123");

        let mapping = ColumnMapper::default().map(&grid, &DataRange::new(6, 6));
        assert_eq!(mapping.get(FieldKey::Weight), Some(2));
        assert_eq!(mapping.get(FieldKey::Total), Some(9));
        assert_eq!(mapping.get(FieldKey::DepartureFromChinaDate), Some(3));
    }

    #[test]
    fn test_exact_match_beats_earlier_fuzzy_column() {
        let headers = vec![(2, "итаго".to_string()), (7, "всего итого".to_string())];
        let keywords = vec!["итого".to_string()];
        assert_eq!(best_header_match(&headers, &keywords), Some((7, 100)));
    }

    #[test]
    fn test_fuzzy_below_threshold_is_rejected() {
        let mut grid = RawGrid::new();
        text(&mut grid, 1, 6, "zzzz");
        text(&mut grid, 2, 1, "AB1");

        let mapper = ColumnMapper::default();
        let mut mapping = ColumnMapping::new();
        mapper.map_headers(&grid, 1, &mut mapping);
        assert!(mapping.is_empty());
    }

    fn weight_only(keyword: &str, fuzzy_threshold: u8) -> ColumnMapper {
        ColumnMapper::new(MappingConfig {
            keywords: BTreeMap::from([(FieldKey::Weight, vec![keyword.to_string()])]),
            fuzzy_threshold,
            ..MappingConfig::default()
        })
    }

    fn mapped_weight(mapper: &ColumnMapper, header: &str) -> Option<usize> {
        let mut grid = RawGrid::new();
        text(&mut grid, 1, 6, header);
        let mut mapping = ColumnMapping::new();
        mapper.map_headers(&grid, 1, &mut mapping);
        mapping.get(FieldKey::Weight)
    }

    #[test]
    fn test_fuzzy_score_equal_to_threshold_is_rejected() {
        // Three substitutions in ten characters score exactly 70
        assert_eq!(partial_ratio("abcdefghij", "abcdefgxyz"), 70);
        let mapper = weight_only("abcdefghij", columns::FUZZY_THRESHOLD);
        assert_eq!(mapped_weight(&mapper, "abcdefgxyz"), None);
    }

    #[test]
    fn test_fuzzy_score_above_threshold_is_accepted() {
        assert_eq!(partial_ratio("abcdefghij", "abcdefghxy"), 80);
        let mapper = weight_only("abcdefghij", columns::FUZZY_THRESHOLD);
        assert_eq!(mapped_weight(&mapper, "abcdefghxy"), Some(6));

        assert_eq!(mapped_weight(&weight_only("abcdefghij", 79), "abcdefghxy"), Some(6));
        assert_eq!(mapped_weight(&weight_only("abcdefghij", 80), "abcdefghxy"), None);
    }

    #[test]
    fn test_departure_column_is_forced() {
        let mut grid = RawGrid::new();
        text(&mut grid, 1, 7, "客户代码/日期");
        text(&mut grid, 2, 1, "AB1");

        let mapping = ColumnMapper::default().map(&grid, &DataRange::new(2, 2));
        assert_eq!(mapping.get(FieldKey::DepartureFromChinaDate), Some(3));
        assert_eq!(mapping.get(FieldKey::ClientCode), Some(1));
    }
}
