//! Composite place detection
//!
//! A composite place is one physical shipment spread over several manifest
//! lines. Partners mark it by vertically merging the places-count cell
//! across those lines, so every merged range on that column inside the
//! data range becomes one group.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::app::document::RawGrid;
use crate::app::range::DataRange;

/// One composite place
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeGroup {
    /// `composite_{anchorRow}_{anchorColumn}`
    pub group_id: String,
    /// Anchor row of the merged range
    pub main_row: usize,
    /// Covered rows inside the data range, ascending
    pub member_rows: Vec<usize>,
    /// Rows spanned by the merged range
    pub places_count: usize,
    /// `{periodId}-{batchNumberNumeric}-{placesCount}-{ordinal}`
    pub composite_id: String,
}

/// Composite provenance of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeTag {
    pub group_id: String,
    pub composite_id: String,
    pub places_count: usize,
    pub is_main_row: bool,
}

/// All composite groups of one document, in discovery order
#[derive(Debug, Clone, Default)]
pub struct CompositeGroups {
    groups: Vec<CompositeGroup>,
    row_index: HashMap<usize, usize>,
}

impl CompositeGroups {
    /// Walk the places-count column of the data range
    ///
    /// Groups are only opened at their anchor cell, so merged ranges whose
    /// anchor lies above the data range are ignored.
    pub fn detect(
        grid: &RawGrid,
        range: &DataRange,
        places_column: Option<usize>,
        period_id: &str,
        batch_number_numeric: &str,
    ) -> Self {
        let Some(column) = places_column else {
            debug!("Places count column unmapped, no composite detection");
            return Self::default();
        };

        let mut groups: Vec<CompositeGroup> = Vec::new();
        let mut by_anchor: HashMap<(usize, usize), usize> = HashMap::new();
        let mut row_index = HashMap::new();

        for row in range.rows() {
            let Some(merged) = grid.merged_range_at(row, column) else {
                continue;
            };
            let anchor = merged.anchor();

            if anchor == (row, column) {
                by_anchor.insert(anchor, groups.len());
                groups.push(CompositeGroup {
                    group_id: format!("composite_{}_{}", anchor.0, anchor.1),
                    main_row: row,
                    member_rows: Vec::new(),
                    places_count: merged.row_span(),
                    composite_id: String::new(),
                });
            }

            if let Some(&index) = by_anchor.get(&anchor) {
                groups[index].member_rows.push(row);
                row_index.insert(row, index);
            }
        }

        for (ordinal, group) in groups.iter_mut().enumerate() {
            group.composite_id = format!(
                "{}-{}-{}-{}",
                period_id,
                batch_number_numeric,
                group.places_count,
                ordinal + 1
            );
            debug!(
                "Composite group {} rows {:?} -> {}",
                group.group_id, group.member_rows, group.composite_id
            );
        }

        if !groups.is_empty() {
            info!("Found {} composite places", groups.len());
        }

        Self { groups, row_index }
    }

    pub fn tag_for(&self, row: usize) -> Option<CompositeTag> {
        let group = self.groups.get(*self.row_index.get(&row)?)?;
        Some(CompositeTag {
            group_id: group.group_id.clone(),
            composite_id: group.composite_id.clone(),
            places_count: group.places_count,
            is_main_row: group.main_row == row,
        })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompositeGroup> {
        self.groups.iter()
    }
}
