//! Excel workbooks read through calamine.

use calamine::{open_workbook_auto, DataType, Reader, Sheets};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use sheetbom_models::CellValue;

use super::{SheetData, SheetLayout, Workbook};
use crate::error::{BomError, BomResult};

static LAST_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?[A-Za-z]+\$?(\d+)\s*$").expect("valid cell reference pattern"));

pub struct ExcelWorkbook {
    name: String,
    workbook: Sheets<BufReader<File>>,
    layout: SheetLayout,
    print_area_name: String,
}

impl ExcelWorkbook {
    pub fn open(path: &Path, layout: SheetLayout, print_area_name: &str) -> BomResult<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let workbook = open_workbook_auto(path).map_err(|e| BomError::workbook(&name, e.to_string()))?;

        Ok(Self {
            name,
            workbook,
            layout,
            print_area_name: print_area_name.to_string(),
        })
    }

    /// Last row of the sheet's print area, zero-based.
    fn print_area_last_row(&self, sheet: &str) -> Option<u32> {
        self.workbook
            .defined_names()
            .iter()
            .filter(|(name, _)| {
                name.to_lowercase()
                    .ends_with(&self.print_area_name.to_lowercase())
            })
            .find(|(_, formula)| {
                formula.starts_with(&format!("{}!", sheet))
                    || formula.starts_with(&format!("'{}'!", sheet))
            })
            .and_then(|(_, formula)| {
                let captures = LAST_ROW_RE.captures(formula)?;
                let row: u32 = captures.get(1)?.as_str().parse().ok()?;
                row.checked_sub(1)
            })
    }
}

impl Workbook for ExcelWorkbook {
    fn name(&self) -> &str {
        &self.name
    }

    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    fn read_sheet(&mut self, sheet: &str) -> BomResult<SheetData> {
        let print_area_end = self.print_area_last_row(sheet);

        let range = self
            .workbook
            .worksheet_range(sheet)
            .ok_or_else(|| BomError::sheet(sheet, "worksheet not found"))?
            .map_err(|e| BomError::sheet(sheet, e.to_string()))?;

        let last_row = print_area_end.or_else(|| range.end().map(|(row, _)| row));

        Ok(self.layout.slice(sheet, last_row, |row, column| {
            range
                .get_value((row, column))
                .map(cell_value)
                .unwrap_or_default()
        }))
    }
}

pub(crate) fn cell_value(data: &DataType) -> CellValue {
    match data {
        DataType::Empty | DataType::Error(_) => CellValue::Empty,
        DataType::String(text) => CellValue::Text(text.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        other => CellValue::Text(other.to_string()),
    }
}
