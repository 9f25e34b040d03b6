//! Header Resolution Module
//!
//! Maps the inconsistently labelled header rows of BOM sheets to column
//! indexes, and exposes sheet rows by field name.

pub mod parser;
pub mod row;

pub use parser::{parameterize, semi_sequential_match, HeaderParser};
pub use row::{RowBuffer, RowView};
