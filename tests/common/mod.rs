//! Shared fixtures for integration tests
//!
//! Builds real `.xlsx` documents in memory. Row and column arguments are
//! 1-indexed to match the engine's coordinates.

#![allow(dead_code)]

use std::sync::Arc;

use freight_manifest::app::{
    DictionaryTranslator, ManifestParser, ParserConfig, PassthroughTranslator,
};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

pub struct SheetBuilder {
    workbook: Workbook,
}

impl SheetBuilder {
    pub fn new() -> Self {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        Self { workbook }
    }

    fn sheet(&mut self) -> &mut Worksheet {
        self.workbook
            .worksheet_from_index(0)
            .expect("fixture workbook has a sheet")
    }

    fn cell(row: usize, column: usize) -> (u32, u16) {
        ((row - 1) as u32, (column - 1) as u16)
    }

    pub fn text(mut self, row: usize, column: usize, value: &str) -> Self {
        let (r, c) = Self::cell(row, column);
        self.sheet().write_string(r, c, value).expect("write text");
        self
    }

    pub fn number(mut self, row: usize, column: usize, value: f64) -> Self {
        let (r, c) = Self::cell(row, column);
        self.sheet().write_number(r, c, value).expect("write number");
        self
    }

    /// Vertically merge `first_row..=last_row` on one column, holding a number
    pub fn merged_number(
        mut self,
        first_row: usize,
        last_row: usize,
        column: usize,
        value: f64,
    ) -> Self {
        let (r1, c) = Self::cell(first_row, column);
        let (r2, _) = Self::cell(last_row, column);
        let format = Format::new();
        self.sheet()
            .merge_range(r1, c, r2, c, "", &format)
            .expect("merge range");
        self.sheet()
            .write_number_with_format(r1, c, value, &format)
            .expect("write merged anchor");
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.workbook.save_to_buffer().expect("serialize workbook")
    }
}

/// One manifest line in the conventional partner layout
pub struct Line<'a> {
    pub client: &'a str,
    pub places: f64,
    pub weight: f64,
    pub product: &'a str,
    pub total: &'a str,
}

impl<'a> Line<'a> {
    pub fn new(client: &'a str, total: &'a str) -> Self {
        Self {
            client,
            places: 1.0,
            weight: 10.5,
            product: "衣服",
            total,
        }
    }
}

/// Batch token at D2, a header row with "вес" over the weight column and
/// manifest lines from row 6 on
///
/// Columns: 1 client, 3 departure, 4 places, 5 weight, 12 product,
/// 13 freight tariff, 16 total.
pub fn standard_manifest(lines: &[Line<'_>]) -> SheetBuilder {
    let mut sheet = SheetBuilder::new()
        .text(1, 1, "Отправка товара")
        .text(2, 3, "Баланс")
        .text(2, 4, "P12-A")
        .text(5, 5, "вес");

    for (i, line) in lines.iter().enumerate() {
        let row = 6 + i;
        sheet = sheet
            .text(row, 3, "0123")
            .text(row, 12, line.product)
            .text(row, 13, "182$")
            .text(row, 16, line.total)
            .number(row, 5, line.weight);
        if !line.client.is_empty() {
            sheet = sheet.text(row, 1, line.client);
        }
        if line.places > 0.0 {
            sheet = sheet.number(row, 4, line.places);
        }
    }
    sheet
}

pub fn translating_parser() -> ManifestParser {
    let translator = DictionaryTranslator::from_entries([("衣服", "Одежда"), ("鞋", "Обувь")]);
    ManifestParser::with_translator(Arc::new(translator))
}

pub fn offline_parser(config: ParserConfig) -> ManifestParser {
    ManifestParser::new(config, Arc::new(PassthroughTranslator))
}
