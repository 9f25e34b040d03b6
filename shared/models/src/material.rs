//! Material grade composition for steel parts.
//!
//! A rendered material grade joins spec and grade, then appends a CVN test
//! suffix made of the test letter and the fracture-critical zone:
//!
//! | test    | rendered                         |
//! |---------|----------------------------------|
//! | `N/A`   | `A606-TYPE4`                     |
//! | `T...`  | `A709-50T2` (zone 2) or `...T3`  |
//! | empty   | `A709-50`, or `A709-50T2` forced |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CellValue;

/// Test value meaning "no CVN testing applies".
pub const TEST_NOT_APPLICABLE: &str = "N/A";

/// Grade cell value. Numeric grades (`50`) come through as numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeValue {
    Number(f64),
    Text(String),
}

impl GradeValue {
    pub fn from_cell(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Number(value) => Some(Self::Number(*value)),
            CellValue::Text(text) if !text.is_empty() => Some(Self::Text(text.clone())),
            _ => None,
        }
    }

    /// High-performance steel grades sit in zone 3.
    pub fn is_hps(&self) -> bool {
        matches!(self, Self::Text(text) if text.contains("HPS"))
    }
}

impl fmt::Display for GradeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", value.trunc() as i64),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for GradeValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<f64> for GradeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Canonical (spec, grade, test) triple a legacy grade text is rewritten to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeTriple {
    pub spec: String,
    pub grade: String,
    pub test: String,
}

impl GradeTriple {
    pub fn new(spec: impl Into<String>, grade: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            grade: grade.into(),
            test: test.into(),
        }
    }
}

/// The fields a material grade is composed from.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialGrade<'a> {
    pub spec: Option<&'a str>,
    pub grade: &'a GradeValue,
    pub test: Option<&'a str>,
}

impl<'a> MaterialGrade<'a> {
    pub fn new(spec: Option<&'a str>, grade: &'a GradeValue, test: Option<&'a str>) -> Self {
        Self { spec, grade, test }
    }

    pub fn zone(&self) -> u8 {
        if self.grade.is_hps() {
            3
        } else {
            2
        }
    }

    /// Renders the grade. `force_cvn` adds a `T2` suffix to untested grades.
    pub fn render(&self, force_cvn: bool) -> String {
        let base = format!("{}-{}", self.spec.unwrap_or_default(), self.grade);

        match self.test.map(str::trim).unwrap_or_default() {
            TEST_NOT_APPLICABLE => base,
            "" if force_cvn => format!("{}T2", base),
            "" => base,
            test => {
                let letter = test.chars().next().unwrap_or('T');
                format!("{}{}{}", base, letter, self.zone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_applicable_test_has_no_suffix() {
        let grade = GradeValue::from("TYPE4");
        let material = MaterialGrade::new(Some("A606"), &grade, Some("N/A"));
        assert_eq!(material.render(false), "A606-TYPE4");
        assert_eq!(material.render(true), "A606-TYPE4");
    }

    #[test]
    fn test_hps_grade_is_zone_three() {
        let grade = GradeValue::from("HPS50W");
        let material = MaterialGrade::new(Some("A709"), &grade, Some("X"));
        assert_eq!(material.zone(), 3);
        assert_eq!(material.render(false), "A709-HPS50WX3");
    }

    #[test]
    fn test_numeric_grade_renders_as_integer() {
        let grade = GradeValue::from(50.0);
        let material = MaterialGrade::new(Some("A709"), &grade, Some("T"));
        assert_eq!(material.render(false), "A709-50T2");
    }

    #[test]
    fn test_force_cvn_only_applies_to_untested_grades() {
        let grade = GradeValue::from(36.0);
        let untested = MaterialGrade::new(Some("A36"), &grade, Some(""));
        assert_eq!(untested.render(false), "A36-36");
        assert_eq!(untested.render(true), "A36-36T2");

        let missing = MaterialGrade::new(Some("A36"), &grade, None);
        assert_eq!(missing.render(true), "A36-36T2");
    }

    #[test]
    fn test_grade_from_cell() {
        assert_eq!(GradeValue::from_cell(&CellValue::Number(50.0)), Some(GradeValue::Number(50.0)));
        assert_eq!(GradeValue::from_cell(&CellValue::from("")), None);
        assert_eq!(GradeValue::from_cell(&CellValue::Empty), None);
    }
}
