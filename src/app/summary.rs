//! Batch-level aggregation
//!
//! Each composite group counts as a single place no matter how many lines
//! it spans; every other total is summed per physical row.

use std::collections::HashSet;

use serde::Serialize;

use crate::app::models::{CargoRecord, FieldKey};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_places: i64,
    pub total_composite_places: i64,
    pub total_boxes: i64,
    /// Kilograms, rounded to 2 decimals
    pub total_weight: f64,
    /// Cubic metres, rounded to 3 decimals
    pub total_volume: f64,
    /// Dollars, rounded to 2 decimals
    pub total_amount: f64,
    pub unique_clients: usize,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

impl BatchSummary {
    /// Aggregate over all records of one parse; values that failed numeric
    /// normalization count as zero
    pub fn from_records(records: &[CargoRecord]) -> Self {
        let mut summary = Self::default();
        let mut counted_groups: HashSet<&str> = HashSet::new();
        let mut clients: HashSet<&str> = HashSet::new();
        let (mut weight, mut volume, mut amount) = (0.0, 0.0, 0.0);

        for record in records {
            if !record.client_code_numeric.is_empty() {
                clients.insert(record.client_code_numeric.as_str());
            }

            match record.composite_group_id.as_deref() {
                Some(group) if record.is_composite_cargo => {
                    if counted_groups.insert(group) {
                        summary.total_places = summary.total_places.saturating_add(1);
                        summary.total_composite_places += 1;
                    }
                }
                _ => {
                    let places = record.field(FieldKey::PlacesCount).as_i64().unwrap_or(0);
                    summary.total_places = summary.total_places.saturating_add(places);
                }
            }

            let boxes = record.field(FieldKey::BoxesCount).as_i64().unwrap_or(0);
            summary.total_boxes = summary.total_boxes.saturating_add(boxes);
            weight += record.field(FieldKey::Weight).as_f64().unwrap_or(0.0);
            volume += record.field(FieldKey::Volume).as_f64().unwrap_or(0.0);
            amount += record.field(FieldKey::Total).as_f64().unwrap_or(0.0);
        }

        summary.total_weight = round_to(weight, 2);
        summary.total_volume = round_to(volume, 3);
        summary.total_amount = round_to(amount, 2);
        summary.unique_clients = clients.len();
        summary
    }
}
