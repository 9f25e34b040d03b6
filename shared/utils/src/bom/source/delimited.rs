//! CSV exports of BOM sheets.

use std::path::{Path, PathBuf};

use sheetbom_models::CellValue;

use super::{SheetData, SheetLayout, Workbook};
use crate::error::{BomError, BomResult};

/// A CSV file treated as a single-sheet workbook named after the file stem.
///
/// The sheet layout applies to the raw grid: the first record is row 1.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    name: String,
    sheet: String,
    path: PathBuf,
    layout: SheetLayout,
}

impl CsvWorkbook {
    pub fn open(path: &Path, layout: SheetLayout) -> BomResult<Self> {
        if !path.is_file() {
            return Err(BomError::workbook(path.display().to_string(), "CSV file not found"));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let sheet = name.split('.').next().unwrap_or_default().to_string();

        Ok(Self {
            name,
            sheet,
            path: path.to_path_buf(),
            layout,
        })
    }

    fn read_grid(&self) -> BomResult<Vec<Vec<CellValue>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut grid = Vec::new();
        for record in reader.records() {
            let record = record?;
            grid.push(record.iter().map(CellValue::parse).collect());
        }

        Ok(grid)
    }
}

impl Workbook for CsvWorkbook {
    fn name(&self) -> &str {
        &self.name
    }

    fn sheet_names(&self) -> Vec<String> {
        vec![self.sheet.clone()]
    }

    fn read_sheet(&mut self, sheet: &str) -> BomResult<SheetData> {
        if sheet != self.sheet {
            return Err(BomError::sheet(sheet, format!("not found in {}", self.name)));
        }

        let grid = self.read_grid()?;
        let last_row = grid.len().checked_sub(1).map(|row| row as u32);

        Ok(self.layout.slice(sheet, last_row, |row, column| {
            grid.get(row as usize)
                .and_then(|cells: &Vec<CellValue>| cells.get(column as usize))
                .cloned()
                .unwrap_or_default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_csv_sheet_uses_layout() {
        let mut file = tempfile::Builder::new().prefix("girders").suffix(".csv").tempfile().unwrap();
        writeln!(file, "title,,").unwrap();
        writeln!(file, ",MARK,QTY").unwrap();
        writeln!(file, ",,").unwrap();
        writeln!(file, ",ASM1,2").unwrap();
        file.flush().unwrap();

        let layout = SheetLayout {
            header_row: 1,
            first_data_row: 3,
            first_column: 1,
            last_column: 2,
        };
        let mut book = CsvWorkbook::open(file.path(), layout).unwrap();
        let sheet_name = book.sheet_names().remove(0);
        assert!(sheet_name.starts_with("girders"));
        let sheet = book.read_sheet(&sheet_name).unwrap();

        assert_eq!(sheet.header[0], vec![CellValue::from("MARK"), CellValue::from("QTY")]);
        assert_eq!(sheet.rows, vec![vec![CellValue::from("ASM1"), CellValue::Number(2.0)]]);
        assert!(book.read_sheet("other").is_err());
    }
}
