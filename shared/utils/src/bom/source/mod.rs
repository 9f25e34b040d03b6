//! Workbook Sources
//!
//! The collector reads sheets through these traits. Implementations exist for
//! Excel workbooks, CSV files, a job folder on disk that mixes both, and
//! books already held in memory.

pub mod delimited;
pub mod excel;
pub mod folder;

pub use delimited::CsvWorkbook;
pub use excel::ExcelWorkbook;
pub use folder::{BookFile, JobFolder};

use serde::{Deserialize, Serialize};
use sheetbom_models::CellValue;

use crate::config::SheetLayoutConfig;
use crate::error::{BomError, BomResult};
use crate::validation::column_number;

/// Header and data rows of one sheet, already cut to the BOM area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetData {
    pub name: String,
    pub header: Vec<Vec<CellValue>>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, header: Vec<CellValue>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            header: vec![header],
            rows,
        }
    }
}

/// A workbook the collector can pull sheets from.
pub trait Workbook {
    fn name(&self) -> &str;

    fn sheet_names(&self) -> Vec<String>;

    fn read_sheet(&mut self, sheet: &str) -> BomResult<SheetData>;
}

/// Where a collector's workbooks come from.
pub trait WorkbookSource {
    type Book: Workbook;

    /// Names of the full-BOM books, with non-BOM books already filtered out.
    fn bom_book_names(&mut self) -> BomResult<Vec<String>>;

    fn open_book(&mut self, name: &str) -> BomResult<Self::Book>;

    fn job_standards_book(&mut self) -> BomResult<Self::Book>;
}

/// Zero-based cell area of a BOM sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub header_row: u32,
    pub first_data_row: u32,
    pub first_column: u32,
    pub last_column: u32,
}

impl SheetLayout {
    /// Converts the 1-based, lettered layout of the configuration.
    ///
    /// Expects a layout that passed `validate_config`; out-of-range columns fall back to `A`.
    pub fn from_config(config: &SheetLayoutConfig) -> Self {
        let column = |letters: &str| column_number(letters).unwrap_or_default().saturating_sub(1);

        Self {
            header_row: config.header_row.saturating_sub(1),
            first_data_row: config.first_data_row.saturating_sub(1),
            first_column: column(&config.first_column),
            last_column: column(&config.last_column),
        }
    }

    /// Cuts a sheet out of a cell grid. `last_row` is zero-based and inclusive.
    pub fn slice<F>(&self, name: &str, last_row: Option<u32>, cell: F) -> SheetData
    where
        F: Fn(u32, u32) -> CellValue,
    {
        let read_row = |row: u32| -> Vec<CellValue> {
            (self.first_column..=self.last_column)
                .map(|column| cell(row, column))
                .collect()
        };

        let rows = match last_row {
            Some(last_row) if last_row >= self.first_data_row => {
                (self.first_data_row..=last_row).map(read_row).collect()
            }
            _ => Vec::new(),
        };

        SheetData {
            name: name.to_string(),
            header: vec![read_row(self.header_row)],
            rows,
        }
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self::from_config(&SheetLayoutConfig::default())
    }
}

/// A workbook held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBook {
    pub name: String,
    pub sheets: Vec<SheetData>,
}

impl MemoryBook {
    pub fn new(name: impl Into<String>, sheets: Vec<SheetData>) -> Self {
        Self {
            name: name.into(),
            sheets,
        }
    }
}

impl Workbook for MemoryBook {
    fn name(&self) -> &str {
        &self.name
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.clone()).collect()
    }

    fn read_sheet(&mut self, sheet: &str) -> BomResult<SheetData> {
        self.sheets
            .iter()
            .find(|candidate| candidate.name == sheet)
            .cloned()
            .ok_or_else(|| BomError::sheet(sheet, format!("not found in workbook {}", self.name)))
    }
}

/// Books already materialised by the caller.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    books: Vec<MemoryBook>,
    job_standards: Option<MemoryBook>,
    books_opened: usize,
    standards_opened: usize,
}

impl MemorySource {
    pub fn new(books: Vec<MemoryBook>) -> Self {
        Self {
            books,
            ..Self::default()
        }
    }

    pub fn with_job_standards(mut self, book: MemoryBook) -> Self {
        self.job_standards = Some(book);
        self
    }

    pub fn books_opened(&self) -> usize {
        self.books_opened
    }

    pub fn standards_opened(&self) -> usize {
        self.standards_opened
    }
}

impl WorkbookSource for MemorySource {
    type Book = MemoryBook;

    fn bom_book_names(&mut self) -> BomResult<Vec<String>> {
        Ok(self.books.iter().map(|book| book.name.clone()).collect())
    }

    fn open_book(&mut self, name: &str) -> BomResult<MemoryBook> {
        self.books_opened += 1;
        self.books
            .iter()
            .find(|book| book.name == name)
            .cloned()
            .ok_or_else(|| BomError::workbook(name, "no such workbook"))
    }

    fn job_standards_book(&mut self) -> BomResult<MemoryBook> {
        self.standards_opened += 1;
        self.job_standards
            .clone()
            .ok_or_else(|| BomError::workbook("JobStandards", "no job standards workbook"))
    }
}
