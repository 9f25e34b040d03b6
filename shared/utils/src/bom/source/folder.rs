//! Engineering job folders on disk.

use std::fs;
use std::path::{Path, PathBuf};

use super::{CsvWorkbook, ExcelWorkbook, SheetData, SheetLayout, Workbook, WorkbookSource};
use crate::config::{BomConfig, EngineeringConfig, ExtractionTables};
use crate::error::{BomError, BomResult};

const EXCEL_EXTENSIONS: [&str; 4] = ["xls", "xlsx", "xlsm", "xlsb"];

/// The BOM folder of one job shipment.
#[derive(Debug, Clone)]
pub struct JobFolder {
    job_folder: PathBuf,
    layout: SheetLayout,
    print_area_name: String,
    tables: ExtractionTables,
    job_standards_book: String,
}

impl JobFolder {
    /// Locates the BOM folder for `job` and `shipment` under the engineering directory.
    pub fn locate(config: &BomConfig, job: &str, shipment: &str) -> Self {
        let job_folder = resolve_job_folder(&config.engineering, job, shipment);
        tracing::info!(job_folder = %job_folder.display(), "Using engineering BOM folder");

        Self::new(job_folder, config)
    }

    pub fn new(job_folder: impl Into<PathBuf>, config: &BomConfig) -> Self {
        Self {
            job_folder: job_folder.into(),
            layout: SheetLayout::from_config(&config.layout),
            print_area_name: config.layout.print_area_name.clone(),
            tables: config.tables.clone(),
            job_standards_book: config.engineering.job_standards_book.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.job_folder
    }

    /// Readable book files in the folder, sorted by file name.
    fn book_files(&self) -> BomResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.job_folder).map_err(|e| BomError::io(&self.job_folder, e))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && BookKind::of(path).is_some())
            .collect();
        files.sort();

        Ok(files)
    }
}

impl WorkbookSource for JobFolder {
    type Book = BookFile;

    fn bom_book_names(&mut self) -> BomResult<Vec<String>> {
        let names = self
            .book_files()?
            .into_iter()
            .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().to_string()))
            .filter(|name| {
                let skipped = self.tables.is_skipped_book(book_stem(name));
                if skipped {
                    tracing::debug!(workbook = %name, "Skipping non-BOM workbook");
                }
                !skipped
            })
            .collect();

        Ok(names)
    }

    fn open_book(&mut self, name: &str) -> BomResult<BookFile> {
        BookFile::open(&self.job_folder.join(name), self.layout, &self.print_area_name)
    }

    fn job_standards_book(&mut self) -> BomResult<BookFile> {
        let path = self
            .book_files()?
            .into_iter()
            .find(|path| {
                path.file_name()
                    .map(|name| book_stem(&name.to_string_lossy()).eq_ignore_ascii_case(&self.job_standards_book))
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                BomError::workbook(
                    &self.job_standards_book,
                    format!("not found in {}", self.job_folder.display()),
                )
            })?;

        BookFile::open(&path, self.layout, &self.print_area_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BookKind {
    Excel,
    Csv,
}

impl BookKind {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Excel)
        } else if ext == "csv" {
            Some(Self::Csv)
        } else {
            None
        }
    }
}

/// A workbook file from a job folder.
pub enum BookFile {
    Excel(ExcelWorkbook),
    Csv(CsvWorkbook),
}

impl BookFile {
    pub fn open(path: &Path, layout: SheetLayout, print_area_name: &str) -> BomResult<Self> {
        match BookKind::of(path) {
            Some(BookKind::Excel) => Ok(Self::Excel(ExcelWorkbook::open(path, layout, print_area_name)?)),
            Some(BookKind::Csv) => Ok(Self::Csv(CsvWorkbook::open(path, layout)?)),
            None => Err(BomError::workbook(path.display().to_string(), "unsupported workbook format")),
        }
    }
}

impl Workbook for BookFile {
    fn name(&self) -> &str {
        match self {
            Self::Excel(book) => book.name(),
            Self::Csv(book) => book.name(),
        }
    }

    fn sheet_names(&self) -> Vec<String> {
        match self {
            Self::Excel(book) => book.sheet_names(),
            Self::Csv(book) => book.sheet_names(),
        }
    }

    fn read_sheet(&mut self, sheet: &str) -> BomResult<SheetData> {
        match self {
            Self::Excel(book) => book.read_sheet(sheet),
            Self::Csv(book) => book.read_sheet(sheet),
        }
    }
}

/// Book name up to the first `.`.
fn book_stem(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Picks `<eng_dir>/<job>-<shipment>/BOM` when a shipment folder exists,
/// otherwise `<eng_dir>/<job>/BOM`.
///
/// Shipment folders are named `<job>-<n>`; folders whose suffix is purely
/// alphabetic are not shipments.
pub fn resolve_job_folder(config: &EngineeringConfig, job: &str, shipment: &str) -> PathBuf {
    let shipment = shipment
        .trim()
        .parse::<u32>()
        .map(|number| number.to_string())
        .unwrap_or_else(|_| shipment.trim().to_string());
    let prefix = format!("{}-", job);

    let mut candidates: Vec<PathBuf> = fs::read_dir(&config.eng_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect()
        })
        .unwrap_or_default();
    candidates.sort();

    for folder in candidates {
        let Some(name) = folder.file_name().map(|name| name.to_string_lossy().to_string()) else {
            continue;
        };
        let Some(folder_shipment) = name.strip_prefix(&prefix).and_then(|rest| rest.split('-').next()) else {
            continue;
        };

        if !folder_shipment.is_empty() && folder_shipment.chars().all(char::is_alphabetic) {
            continue;
        }
        if folder_shipment.contains(shipment.as_str()) {
            return folder.join(&config.bom_subfolder);
        }
    }

    config.eng_dir.join(job).join(&config.bom_subfolder)
}
