//! Human-readable run report
//!
//! Diagnostic output only; nothing downstream should parse it.

use std::fmt::Write;

use chrono::Local;

use crate::app::models::{CargoRecord, FieldKey};
use crate::app::parser::ParseReport;
use crate::app::summary::BatchSummary;
use crate::constants::report;

const TABLE_HEADERS: [&str; 8] = [
    "#",
    "Client",
    "Places",
    "Weight",
    "Volume",
    "Product",
    "Total",
    "Composite ID",
];

const DETAIL_FIELDS: [(FieldKey, &str); 15] = [
    (FieldKey::ClientCode, "Client code"),
    (FieldKey::DepartureFromChinaDate, "Departure from China"),
    (FieldKey::PlacesCount, "Places"),
    (FieldKey::Weight, "Weight, kg"),
    (FieldKey::BoxesCount, "Boxes"),
    (FieldKey::CubicTariff, "Cubic tariff, $"),
    (FieldKey::UnitsCount, "Units"),
    (FieldKey::ProductPrice, "Unit price, ¥"),
    (FieldKey::InsurancePercent, "Insurance, %"),
    (FieldKey::Volume, "Volume, m³"),
    (FieldKey::ProductName, "Product"),
    (FieldKey::FreightTariff, "Freight tariff, $"),
    (FieldKey::Insurance, "Insurance, $"),
    (FieldKey::Packaging, "Packaging, $"),
    (FieldKey::Total, "Total, $"),
];

/// Cut to `width` characters, marking the cut with "..."
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let inner: Vec<String> = cells
        .zip(widths.iter())
        .map(|(cell, width)| format!(" {} ", pad(cell, *width)))
        .collect();
    format!("|{}|", inner.join("|"))
}

/// Overview table with column widths fitted to the content
pub fn render_table(records: &[CargoRecord]) -> String {
    let rows: Vec<[String; 8]> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            [
                (i + 1).to_string(),
                record.client_code().to_string(),
                record.field(FieldKey::PlacesCount).to_string(),
                record.field(FieldKey::Weight).to_string(),
                record.field(FieldKey::Volume).to_string(),
                truncate(
                    &record.field(FieldKey::ProductName).to_string(),
                    report::NAME_WIDTH,
                ),
                record.field(FieldKey::Total).to_string(),
                record.composite_id.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = TABLE_HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+", separator);

    let mut out = String::new();
    let _ = writeln!(out, "{}", separator);
    let _ = writeln!(out, "{}", table_line(TABLE_HEADERS.iter().copied(), &widths));
    let _ = writeln!(out, "{}", separator.replace('-', "="));
    for row in &rows {
        let _ = writeln!(out, "{}", table_line(row.iter().map(String::as_str), &widths));
        let _ = writeln!(out, "{}", separator);
    }
    out
}

/// Batch counters block
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();
    write_summary(&mut out, summary);
    out
}

fn write_summary(out: &mut String, summary: &BatchSummary) {
    let _ = writeln!(out, "\nBATCH SUMMARY:");
    let _ = writeln!(out, "Total places: {}", summary.total_places);
    let _ = writeln!(out, "Composite places: {}", summary.total_composite_places);
    let _ = writeln!(out, "Total boxes: {}", summary.total_boxes);
    let _ = writeln!(out, "Total weight: {} kg", summary.total_weight);
    let _ = writeln!(out, "Total volume: {} m³", summary.total_volume);
    let _ = writeln!(out, "Total amount: {} $", summary.total_amount);
    let _ = writeln!(out, "Unique clients: {}", summary.unique_clients);
}

fn render_details(out: &mut String, records: &[CargoRecord]) {
    let _ = writeln!(out, "\nFirst records in detail:");
    for (i, record) in records.iter().take(report::DETAIL_RECORDS).enumerate() {
        let marker = if record.is_composite_cargo {
            " (composite place)"
        } else {
            ""
        };
        let _ = writeln!(out, "\n--- Record #{}{} ---", i + 1, marker);

        for (field, label) in DETAIL_FIELDS.iter() {
            let value = record.field(*field);
            if !value.is_null() {
                let _ = writeln!(out, "{}: {}", label, value);
            }
            if *field == FieldKey::ClientCode && !record.client_code_numeric.is_empty() {
                let _ = writeln!(out, "Client code digits: {}", record.client_code_numeric);
            }
            if *field == FieldKey::PlacesCount && record.is_composite_cargo {
                let _ = writeln!(out, "Places in composite: {}", record.composite_places_count);
                if let Some(id) = &record.composite_id {
                    let _ = writeln!(out, "Composite ID: {}", id);
                }
            }
        }
    }
}

/// Full diagnostic report of one parse
pub fn render_report(report: &ParseReport, source_name: &str) -> String {
    let rule = "=".repeat(report::RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "PARSE RESULTS: {}", source_name);
    let _ = writeln!(out, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "{}", rule);

    let _ = writeln!(
        out,
        "\nBatch number: {} (numeric part: {})",
        report.batch.batch_number, report.batch.batch_number_numeric
    );
    let _ = writeln!(out, "Data range: {}", report.range);
    let _ = writeln!(out, "Records found: {}", report.records.len());
    if !report.dropped_rows.is_empty() {
        let _ = writeln!(out, "Rows dropped (no client code): {:?}", report.dropped_rows);
    }

    write_summary(&mut out, &report.summary);

    if report.records.is_empty() {
        let _ = writeln!(out, "\nNo data to display.");
        return out;
    }

    let _ = writeln!(out, "\nOverview:");
    out.push_str(&render_table(&report.records));
    render_details(&mut out, &report.records);

    let _ = writeln!(out, "\n{}", rule);
    out
}
