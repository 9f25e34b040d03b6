//! BOM (Bill of Materials) Extraction Module
//!
//! Reads job BOM workbooks into an assembly/part graph with rolled-up
//! part quantities.

pub mod collector;
pub mod entity;
pub mod report;
pub mod source;

pub use collector::{BomDataCollector, BomLine, SheetHeader};
pub use entity::{Assembly, AssemblyRef, Part, PartRef};
pub use report::{LoadKind, LoadReport, SheetFailure};
pub use source::{
    BookFile, CsvWorkbook, ExcelWorkbook, JobFolder, MemoryBook, MemorySource, SheetData, SheetLayout, Workbook,
    WorkbookSource,
};
