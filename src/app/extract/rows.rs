//! Row extraction
//!
//! Reads every mapped field of every data row through the merged-cell table,
//! normalizes it and attaches batch and composite provenance.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::composite::CompositeGroups;
use super::normalize::{client_code_numeric, FieldNormalizer};
use crate::app::document::RawGrid;
use crate::app::models::{BatchIdentity, CargoRecord, ColumnMapping, FieldKey, FieldValue};
use crate::app::range::DataRange;

/// Records of one document plus the rows that had to be dropped
#[derive(Debug, Clone, Default)]
pub struct RowExtraction {
    pub records: Vec<CargoRecord>,
    /// Rows without a usable client code
    pub dropped_rows: Vec<usize>,
}

#[derive(Debug)]
pub struct RowExtractor {
    normalizer: FieldNormalizer,
}

impl RowExtractor {
    pub fn new(normalizer: FieldNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn extract(
        &self,
        grid: &RawGrid,
        range: &DataRange,
        mapping: &ColumnMapping,
        batch: &BatchIdentity,
        composites: &CompositeGroups,
    ) -> RowExtraction {
        let mut extraction = RowExtraction::default();

        for row in range.rows() {
            let fields: BTreeMap<FieldKey, FieldValue> = FieldKey::ALL
                .iter()
                .map(|&field| {
                    let value = match mapping.get(field) {
                        Some(column) => self.normalizer.normalize(field, grid.resolve(row, column)),
                        None => FieldValue::Null,
                    };
                    (field, value)
                })
                .collect();

            let client_code = match fields.get(&FieldKey::ClientCode) {
                Some(FieldValue::Text(code)) if !code.is_empty() => code.clone(),
                _ => {
                    warn!("Skipping row {}: no client code", row);
                    extraction.dropped_rows.push(row);
                    continue;
                }
            };

            let tag = composites.tag_for(row);
            let record = CargoRecord {
                source_row: row,
                batch_number: batch.batch_number.clone(),
                batch_number_numeric: batch.batch_number_numeric.clone(),
                client_code_numeric: client_code_numeric(&client_code),
                fields,
                is_composite_cargo: tag.is_some(),
                is_main_composite_row: tag.as_ref().map_or(false, |t| t.is_main_row),
                composite_group_id: tag.as_ref().map(|t| t.group_id.clone()),
                composite_places_count: tag.as_ref().map_or(1, |t| t.places_count),
                composite_id: tag.map(|t| t.composite_id),
            };
            extraction.records.push(record);
        }

        debug!(
            "Extracted {} records, dropped {} rows",
            extraction.records.len(),
            extraction.dropped_rows.len()
        );
        extraction
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::document::{CellValue, MergedRange};
    use crate::app::translate::{Language, PassthroughTranslator};

    fn extractor() -> RowExtractor {
        RowExtractor::new(FieldNormalizer::new(
            Arc::new(PassthroughTranslator),
            Language::ChineseTraditional,
            Language::Russian,
        ))
    }

    fn batch() -> BatchIdentity {
        BatchIdentity {
            batch_number: "P12-A".into(),
            batch_number_numeric: "12".into(),
        }
    }

    #[test]
    fn test_rows_without_client_code_are_dropped() {
        let mut grid = RawGrid::new();
        for (row, code) in [(1, "AB1"), (2, ""), (3, "AB3")] {
            grid.set(row, 1, CellValue::Text(code.into()));
            grid.set(row, 5, CellValue::Text("1,5".into()));
        }
        let mut mapping = ColumnMapping::new();
        mapping.insert(FieldKey::ClientCode, 1);
        mapping.insert(FieldKey::Weight, 5);

        let extraction = extractor().extract(
            &grid,
            &DataRange::new(1, 3),
            &mapping,
            &batch(),
            &CompositeGroups::default(),
        );

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.dropped_rows, vec![2]);
        let first = &extraction.records[0];
        assert_eq!(first.field(FieldKey::Weight), &FieldValue::Float(1.5));
        assert_eq!(first.client_code_numeric, "1");
        assert_eq!(first.composite_places_count, 1);
        assert!(first.field(FieldKey::Total).is_null());
        assert_eq!(extraction.records[1].source_row, 3);
    }

    #[test]
    fn test_merged_cells_read_from_anchor() {
        let mut grid = RawGrid::new();
        for row in 1..=3 {
            grid.set(row, 1, CellValue::Text(format!("AB{}", row)));
        }
        grid.set(1, 4, CellValue::Int(3));
        grid.add_merged_range(MergedRange::new(1, 4, 3, 4));

        let mut mapping = ColumnMapping::new();
        mapping.insert(FieldKey::ClientCode, 1);
        mapping.insert(FieldKey::PlacesCount, 4);

        let range = DataRange::new(1, 3);
        let composites = CompositeGroups::detect(&grid, &range, Some(4), "p", "12");
        let extraction = extractor().extract(&grid, &range, &mapping, &batch(), &composites);

        assert_eq!(extraction.records.len(), 3);
        for record in &extraction.records {
            assert_eq!(record.field(FieldKey::PlacesCount), &FieldValue::Integer(3));
            assert!(record.is_composite_cargo);
            assert_eq!(record.composite_id.as_deref(), Some("p-12-3-1"));
            assert_eq!(record.composite_places_count, 3);
        }
        assert!(extraction.records[0].is_main_composite_row);
        assert!(!extraction.records[2].is_main_composite_row);
    }
}
