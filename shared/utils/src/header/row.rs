//! Parsed rows bound to a header.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use sheetbom_models::CellValue;

use super::parser::HeaderParser;
use crate::error::BomResult;

/// Cell buffer of one sheet row.
///
/// Clones share the same cells: a write through any [`RowView`] over a
/// buffer is visible to every other view over it. Views over one buffer
/// must not be mutated from independent call sites.
#[derive(Debug, Clone, Default)]
pub struct RowBuffer(Rc<RefCell<Vec<CellValue>>>);

impl RowBuffer {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self(Rc::new(RefCell::new(cells)))
    }

    pub fn cells(&self) -> Ref<'_, Vec<CellValue>> {
        self.0.borrow()
    }

    pub fn get(&self, index: usize) -> CellValue {
        self.0.borrow().get(index).cloned().unwrap_or_default()
    }

    /// Writes a cell, growing a short row with empty cells.
    pub fn set(&self, index: usize, value: CellValue) {
        let mut cells = self.0.borrow_mut();
        if cells.len() <= index {
            cells.resize(index + 1, CellValue::Empty);
        }
        cells[index] = value;
    }

    pub fn shares_with(&self, other: &RowBuffer) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Vec<CellValue>> for RowBuffer {
    fn from(cells: Vec<CellValue>) -> Self {
        Self::new(cells)
    }
}

/// A row whose cells are addressed by header field names.
///
/// Writes to names the header cannot resolve are kept on the view itself,
/// so derived fields can be attached without a header slot.
#[derive(Debug, Clone)]
pub struct RowView {
    data: RowBuffer,
    header: Rc<HeaderParser>,
    extras: HashMap<String, CellValue>,
}

impl RowView {
    pub fn new(data: RowBuffer, header: Rc<HeaderParser>) -> Self {
        Self {
            data,
            header,
            extras: HashMap::new(),
        }
    }

    pub fn header(&self) -> &Rc<HeaderParser> {
        &self.header
    }

    pub fn buffer(&self) -> &RowBuffer {
        &self.data
    }

    pub fn extras(&self) -> &HashMap<String, CellValue> {
        &self.extras
    }

    /// Reads a field. Fields set off-header shadow header columns.
    pub fn get(&self, name: &str) -> BomResult<CellValue> {
        if let Some(value) = self.extras.get(name) {
            return Ok(value.clone());
        }

        let index = self.header.get_index(name)?;
        Ok(self.data.get(index))
    }

    /// Text of a field, `None` when the cell is blank.
    pub fn get_text(&self, name: &str) -> BomResult<Option<String>> {
        Ok(self.get(name)?.as_text())
    }

    pub fn get_f64(&self, name: &str) -> BomResult<Option<f64>> {
        Ok(self.get(name)?.as_f64())
    }

    /// Reads a field the sheet may not carry: a missing column is `None`,
    /// an ambiguous one is still an error.
    pub fn try_get(&self, name: &str) -> BomResult<Option<CellValue>> {
        match self.get(name) {
            Ok(cell) => Ok(Some(cell)),
            Err(error) if error.is_header_miss() => Ok(None),
            Err(error) => Err(error),
        }
    }

    pub fn try_get_text(&self, name: &str) -> BomResult<Option<String>> {
        Ok(self.try_get(name)?.and_then(|cell| cell.as_text()))
    }

    /// Writes a field in place, or off-header when the name does not resolve.
    pub fn set(&mut self, name: &str, value: impl Into<CellValue>) {
        let value = value.into();
        match self.header.get_index(name) {
            Ok(index) => self.data.set(index, value),
            Err(_) => {
                self.extras.insert(name.to_string(), value);
            }
        }
    }
}

impl PartialEq for RowView {
    /// Compares the cells of every column this view's header declares.
    fn eq(&self, other: &Self) -> bool {
        self.header
            .indexes()
            .values()
            .all(|index| self.data.get(*index) == other.data.get(*index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Rc<HeaderParser> {
        Rc::new(HeaderParser::new(vec![
            CellValue::from("MARK"),
            CellValue::from("QTY"),
            CellValue::from("COMM"),
        ]))
    }

    fn row(mark: &str, qty: f64) -> Vec<CellValue> {
        vec![CellValue::from(mark), CellValue::from(qty), CellValue::from("Plate")]
    }

    #[test]
    fn test_field_reads() {
        let view = header().parse_row(row("P1", 3.0));

        assert_eq!(view.get("mark").unwrap(), CellValue::from("P1"));
        assert_eq!(view.get_f64("qty").unwrap(), Some(3.0));
        assert_eq!(view.get_text("comm").unwrap(), Some("Plate".to_string()));
        assert!(view.get("grade").unwrap_err().is_header_miss());
    }

    #[test]
    fn test_optional_reads_only_forgive_missing_columns() {
        let view = header().parse_row(row("P1", 3.0));
        assert_eq!(view.try_get("grade").unwrap(), None);
        assert_eq!(view.try_get_text("comm").unwrap(), Some("Plate".to_string()));

        let ambiguous = Rc::new(HeaderParser::new(vec![
            CellValue::from("MARK"),
            CellValue::from("TIMESTAMP"),
            CellValue::from("TENSILE TEST"),
        ]));
        let view = ambiguous.parse_row(vec![CellValue::from("P1")]);
        let error = view.try_get("test").unwrap_err();
        assert_eq!(error.error_code(), "AMBIGUOUS_HEADER_KEY");
    }

    #[test]
    fn test_short_rows_read_empty() {
        let view = header().parse_row(vec![CellValue::from("P1")]);
        assert_eq!(view.get("comm").unwrap(), CellValue::Empty);
        assert_eq!(view.get_text("comm").unwrap(), None);
    }

    #[test]
    fn test_writes_are_shared_between_views() {
        let header = header();
        let buffer = RowBuffer::new(row("P1", 3.0));
        let mut first = header.parse_row(buffer.clone());
        let second = header.parse_row(buffer.clone());

        first.set("qty", 5.0);

        assert_eq!(second.get_f64("qty").unwrap(), Some(5.0));
        assert_eq!(buffer.get(1), CellValue::Number(5.0));
        assert!(first.buffer().shares_with(second.buffer()));
    }

    #[test]
    fn test_unresolved_writes_stay_on_the_view() {
        let mut view = header().parse_row(row("P1", 3.0));

        view.set("remarks", "galvanize");

        assert_eq!(view.get_text("remarks").unwrap(), Some("galvanize".to_string()));
        assert_eq!(view.buffer().cells().len(), 3);
        assert!(view.extras().contains_key("remarks"));
    }

    #[test]
    fn test_equality_ignores_off_header_fields() {
        let header = header();
        let mut first = header.parse_row(row("P1", 3.0));
        let second = header.parse_row(row("P1", 3.0));
        let third = header.parse_row(row("P2", 3.0));

        first.set("remarks", "x");

        assert_eq!(first, second);
        assert_ne!(first, third);
    }
}
