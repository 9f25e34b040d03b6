use config::{Config, ConfigError, Environment, File};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sheetbom_models::GradeTriple;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use validator::Validate;

use crate::validation::{validate_column_letters, validate_pattern};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BomConfig {
    pub engineering: EngineeringConfig,
    #[validate]
    pub layout: SheetLayoutConfig,
    #[validate]
    pub tables: ExtractionTables,
    pub collector: CollectorOptions,
    pub logging: LoggingConfig,
}

/// Where engineering BOM workbooks live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineeringConfig {
    pub eng_dir: PathBuf,
    pub bom_subfolder: String,
    pub job_standards_book: String,
}

/// Cell ranges of a BOM sheet, 1-based rows and spreadsheet column letters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SheetLayoutConfig {
    #[validate(range(min = 1, message = "Header row must be 1 or greater"))]
    pub header_row: u32,
    #[validate(range(min = 2, message = "Data must start below the header"))]
    pub first_data_row: u32,
    #[validate(custom = "validate_column_letters")]
    pub first_column: String,
    #[validate(custom = "validate_column_letters")]
    pub last_column: String,
    pub print_area_name: String,
}

/// Static lookup tables driving extraction.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ExtractionTables {
    pub skip_books: Vec<String>,
    pub skip_sheets: Vec<String>,
    pub skip_types: Vec<String>,
    /// Gauge text → thickness.
    pub thickness: HashMap<String, f64>,
    /// Legacy grade text → canonical (spec, grade, test).
    pub grades: HashMap<String, GradeTriple>,
    /// Logical field → header label, applied in order.
    pub header_aliases: IndexMap<String, String>,
    #[validate(custom = "validate_pattern")]
    pub sub_component_pattern: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorOptions {
    /// Append a `T2` CVN suffix to grades with no test specified.
    pub force_cvn: bool,
    /// Load the full BOM when the collector is created.
    pub requires_full_load: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl BomConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("SHEETBOM")
                    .separator("__")
                    .try_parsing(true),
            );

        config.build()?.try_deserialize()
    }
}

impl ExtractionTables {
    pub fn is_skipped_book(&self, stem: &str) -> bool {
        self.skip_books.iter().any(|book| book.eq_ignore_ascii_case(stem))
    }

    pub fn is_skipped_sheet(&self, sheet: &str) -> bool {
        self.skip_sheets.iter().any(|name| name.eq_ignore_ascii_case(sheet))
    }

    pub fn is_skipped_type(&self, part_type: &str) -> bool {
        let part_type = part_type.trim();
        self.skip_types.iter().any(|skip| skip == part_type)
    }

    // The config loader lower-cases map keys, so table keys match case-insensitively.
    pub fn thickness_for(&self, gauge: &str) -> Option<f64> {
        let gauge = gauge.trim();
        self.thickness
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(gauge))
            .map(|(_, thickness)| *thickness)
    }

    pub fn grade_for(&self, legacy: &str) -> Option<&GradeTriple> {
        let legacy = legacy.trim();
        self.grades
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(legacy))
            .map(|(_, triple)| triple)
    }
}

impl Default for EngineeringConfig {
    fn default() -> Self {
        Self {
            eng_dir: PathBuf::from("jobs"),
            bom_subfolder: "BOM".to_string(),
            job_standards_book: "JobStandards".to_string(),
        }
    }
}

impl Default for SheetLayoutConfig {
    fn default() -> Self {
        Self {
            header_row: 2,
            first_data_row: 4,
            first_column: "B".to_string(),
            last_column: "AB".to_string(),
            print_area_name: "Print_Area".to_string(),
        }
    }
}

impl Default for ExtractionTables {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            skip_books: strings(&["Products", "JobStandards", "ShipPieces"]),
            skip_sheets: strings(&["Special", "Template", "Total", "L Weights"]),
            skip_types: strings(&[
                "Anch Bolt",
                "Anch Wash",
                "Bronze Pl",
                "Elast Brg",
                "Fab Pad",
                "Grating",
                "HS Bolt",
                "HSS",
                "Nut",
                "RB",
                "Rebar",
                "Screw",
                "Std Wash",
                "Stud",
                "Valid Comms.",
                "DTI Wash",
                "STD. WASH",
                "HS BOLT",
                "NUT",
            ]),
            thickness: HashMap::from([
                ("10 GA.".to_string(), 0.125),
                ("16 GA.".to_string(), 0.062),
            ]),
            grades: HashMap::from([(
                "A606 Type 4".to_string(),
                GradeTriple::new("A606", "TYPE4", "N/A"),
            )]),
            header_aliases: IndexMap::from([
                ("name".to_string(), "MARK".to_string()),
                ("type".to_string(), "COMM".to_string()),
                ("thickness".to_string(), "Description".to_string()),
                ("thk".to_string(), "Description".to_string()),
                ("weight".to_string(), "SHIP WT".to_string()),
            ]),
            sub_component_pattern: "^[a-zA-Z][0-9]+[a-zA-Z]+".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}
