//! Part and Assembly entities.
//!
//! Assemblies hold only weak references to their parts; parts are owned by
//! the collector's part cache and keep their assemblies alive, so the graph
//! never forms a reference cycle.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use sheetbom_models::{CellValue, GradeValue, MaterialGrade};

use crate::config::ExtractionTables;
use crate::error::{BomError, BomResult};
use crate::header::RowView;

pub type PartRef = Rc<RefCell<Part>>;
pub type AssemblyRef = Rc<Assembly>;

/// A part extracted from a BOM row.
#[derive(Debug, Clone, Default)]
pub struct Part {
    pub mark: String,
    pub part_type: Option<String>,
    pub description: Option<String>,
    pub thickness: Option<f64>,
    pub width: Option<f64>,
    pub length: Option<f64>,
    pub spec: Option<String>,
    pub grade: Option<GradeValue>,
    pub test: Option<String>,
    pub weight: Option<f64>,
    /// Assemblies this part occurs on, with the part count per assembly.
    assemblies: Vec<(AssemblyRef, f64)>,
    extras: HashMap<String, CellValue>,
    row: Option<RowView>,
}

impl Part {
    /// Builds a part from its row. `overrides` win over the row's cells.
    ///
    /// Columns the sheet lacks leave their field empty; an ambiguous column fails the part.
    pub fn from_row(
        row: RowView,
        tables: &ExtractionTables,
        overrides: Vec<(&str, CellValue)>,
    ) -> BomResult<Self> {
        let extras: HashMap<String, CellValue> = overrides
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        let number = |name: &str| -> BomResult<Option<f64>> {
            match extras.get(name) {
                Some(cell) => Ok(cell.as_f64()),
                None => Ok(row.try_get(name)?.and_then(|cell| cell.as_f64())),
            }
        };

        let thickness = row.try_get("thk")?.and_then(|cell| match cell {
            CellValue::Text(gauge) => tables.thickness_for(&gauge).or_else(|| gauge.trim().parse().ok()),
            other => other.as_f64(),
        });

        Ok(Self {
            mark: row.try_get_text("mark")?.unwrap_or_default(),
            part_type: row.try_get_text("type")?,
            description: row.try_get_text("description")?,
            thickness,
            width: number("width")?,
            length: number("length")?,
            spec: row.try_get_text("spec")?,
            grade: row.try_get("grade")?.and_then(|cell| GradeValue::from_cell(&cell)),
            test: row.try_get_text("test")?,
            weight: number("weight")?,
            assemblies: Vec::new(),
            extras,
            row: Some(row),
        })
    }

    /// Sentinel handed out for marks that are not in any loaded BOM.
    pub fn null_part() -> Self {
        Self {
            thickness: Some(0.0),
            ..Self::default()
        }
    }

    pub fn is_null(&self) -> bool {
        self.row.is_none() && self.mark.is_empty()
    }

    /// Copy of this part with no assembly attachments.
    pub fn detached(&self) -> Self {
        Self {
            assemblies: Vec::new(),
            ..self.clone()
        }
    }

    /// Reads any field: explicit overrides first, then the originating row.
    pub fn field(&self, name: &str) -> BomResult<CellValue> {
        if let Some(value) = self.extras.get(name) {
            return Ok(value.clone());
        }

        match &self.row {
            Some(row) => row.get(name),
            None => Err(BomError::header_key_not_found(name)),
        }
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<CellValue>) {
        self.extras.insert(name.to_string(), value.into());
    }

    pub fn row(&self) -> Option<&RowView> {
        self.row.as_ref()
    }

    pub fn assemblies(&self) -> &[(AssemblyRef, f64)] {
        &self.assemblies
    }

    pub fn add_assembly(&mut self, assembly: AssemblyRef, part_qty: f64) -> &mut Self {
        self.assemblies.push((assembly, part_qty));
        self
    }

    /// Total count over every assembly, only final once the whole BOM is loaded.
    pub fn qty(&self) -> f64 {
        self.assemblies
            .iter()
            .map(|(assembly, part_qty)| assembly.qty() * part_qty)
            .sum()
    }

    pub fn material_grade(&self, force_cvn: bool) -> Option<String> {
        let grade = self.grade.as_ref()?;
        let material = MaterialGrade::new(self.spec.as_deref(), grade, self.test.as_deref());
        Some(material.render(force_cvn))
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]|{} ({})",
            self.qty(),
            self.mark,
            self.material_grade(false).unwrap_or_else(|| "None".to_string())
        )
    }
}

/// An assembly row and the parts listed under it.
pub struct Assembly {
    pub mark: String,
    row: RowView,
    parts: RefCell<Vec<Weak<RefCell<Part>>>>,
}

impl Assembly {
    pub fn from_row(row: RowView) -> Self {
        let mark = row
            .get("mark")
            .ok()
            .and_then(|cell| cell.as_text())
            .unwrap_or_default();

        Self {
            mark,
            row,
            parts: RefCell::new(Vec::new()),
        }
    }

    pub fn row(&self) -> &RowView {
        &self.row
    }

    /// Assembly count as written on its own row.
    pub fn qty(&self) -> f64 {
        self.row.get_f64("qty").ok().flatten().unwrap_or(0.0)
    }

    pub fn field(&self, name: &str) -> BomResult<CellValue> {
        self.row.get(name)
    }

    /// Attaches `part` with `qty` pieces per assembly.
    pub fn add_part(self: &Rc<Self>, part: &PartRef, qty: f64) {
        part.borrow_mut().add_assembly(Rc::clone(self), qty);
        self.parts.borrow_mut().push(Rc::downgrade(part));
    }

    /// Parts still held by the part cache, in attachment order.
    pub fn parts(&self) -> Vec<PartRef> {
        self.parts.borrow().iter().filter_map(Weak::upgrade).collect()
    }
}

impl fmt::Debug for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembly")
            .field("mark", &self.mark)
            .field("qty", &self.qty())
            .field("parts", &self.parts.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderParser;

    fn header() -> Rc<HeaderParser> {
        let mut parser = HeaderParser::new(
            ["MARK", "QTY", "COMM", "Description", "SPEC", "GRADE", "TEST"]
                .iter()
                .map(|label| CellValue::from(*label))
                .collect(),
        );
        parser.add_header_aliases([("type", "COMM"), ("thk", "Description")]);
        Rc::new(parser)
    }

    fn assembly(header: &Rc<HeaderParser>, mark: &str, qty: f64) -> AssemblyRef {
        let row = header.parse_row(vec![CellValue::from(mark), CellValue::from(qty)]);
        Rc::new(Assembly::from_row(row))
    }

    fn part(header: &Rc<HeaderParser>, cells: Vec<CellValue>) -> PartRef {
        let row = header.parse_row(cells);
        Rc::new(RefCell::new(Part::from_row(row, &ExtractionTables::default(), vec![]).unwrap()))
    }

    #[test]
    fn test_part_fields_from_row() {
        let header = header();
        let part = part(
            &header,
            vec![
                "P1".into(),
                3.0.into(),
                "Plate".into(),
                "10 GA.".into(),
                "A709".into(),
                50.0.into(),
                "T".into(),
            ],
        );
        let part = part.borrow();

        assert_eq!(part.mark, "P1");
        assert_eq!(part.part_type.as_deref(), Some("Plate"));
        assert_eq!(part.thickness, Some(0.125));
        assert_eq!(part.material_grade(false).as_deref(), Some("A709-50T2"));
        assert_eq!(part.field("qty").unwrap(), CellValue::Number(3.0));
    }

    #[test]
    fn test_overrides_shadow_row() {
        let header = header();
        let row = header.parse_row(vec![CellValue::from("P1")]);
        let mut part =
            Part::from_row(row, &ExtractionTables::default(), vec![("length", CellValue::from(126.0))]).unwrap();

        assert_eq!(part.length, Some(126.0));
        assert_eq!(part.field("length").unwrap(), CellValue::Number(126.0));

        part.set_field("remarks", "field weld");
        assert_eq!(part.field("remarks").unwrap(), CellValue::from("field weld"));
    }

    #[test]
    fn test_roll_up_quantity() {
        let header = header();
        let a = assembly(&header, "A", 2.0);
        let b = assembly(&header, "B", 5.0);
        let part = part(&header, vec!["P1".into(), 3.0.into(), "Plate".into()]);

        a.add_part(&part, 3.0);
        assert_eq!(part.borrow().qty(), 6.0);

        b.add_part(&part, 4.0);
        assert_eq!(part.borrow().qty(), 26.0);
        assert_eq!(a.parts().len(), 1);
        assert!(Rc::ptr_eq(&a.parts()[0], &part));
    }

    #[test]
    fn test_assembly_qty_follows_row_writes() {
        let header = header();
        let mut row = header.parse_row(vec![CellValue::from("A"), CellValue::from(1.0)]);
        let a = Rc::new(Assembly::from_row(row.clone()));

        row.set("qty", 4.0);
        assert_eq!(a.qty(), 4.0);
    }

    #[test]
    fn test_ambiguous_column_fails_the_part() {
        let header = Rc::new(HeaderParser::new(
            ["MARK", "COMM", "GRADE", "TIMESTAMP", "TENSILE TEST"]
                .iter()
                .map(|label| CellValue::from(*label))
                .collect(),
        ));
        let row = header.parse_row(vec!["P1".into(), "Plate".into(), 50.0.into()]);

        let error = Part::from_row(row, &ExtractionTables::default(), vec![]).unwrap_err();
        assert_eq!(error.error_code(), "AMBIGUOUS_HEADER_KEY");
    }

    #[test]
    fn test_null_part() {
        let null = Part::null_part();

        assert!(null.is_null());
        assert_eq!(null.thickness, Some(0.0));
        assert_eq!(null.material_grade(true), None);
        assert_eq!(null.qty(), 0.0);
        assert!(null.field("mark").is_err());
    }

    #[test]
    fn test_detached_copy_drops_assemblies() {
        let header = header();
        let a = assembly(&header, "A", 2.0);
        let part = part(&header, vec!["A1B".into(), 1.0.into(), "Plate".into()]);
        a.add_part(&part, 1.0);

        let copy = part.borrow().detached();
        assert_eq!(copy.mark, "A1B");
        assert!(copy.assemblies().is_empty());
    }

    #[test]
    fn test_display() {
        let header = header();
        let a = assembly(&header, "A", 2.0);
        let part = part(&header, vec!["P1".into(), 1.0.into(), "Plate".into(), 0.5.into(), "A36".into(), 36.0.into()]);
        a.add_part(&part, 3.0);

        assert_eq!(part.borrow().to_string(), "[6]|P1 (A36-36)");
    }
}
