//! # Sheetbom Value Models
//!
//! Plain value types shared by the extraction core.
//!
//! ## Key Models
//!
//! - **CellValue**: a spreadsheet cell as handed over by a workbook reader
//! - **UnitSystem**: imperial or metric, inferred from a sheet's weight column
//! - **GradeValue** / **GradeTriple**: material grade cells and legacy grade rewrites
//! - **MaterialGrade**: composition of spec, grade and CVN test into one grade string

pub mod cell;
pub mod material;
pub mod units;


pub use cell::*;
pub use material::*;
pub use units::*;
