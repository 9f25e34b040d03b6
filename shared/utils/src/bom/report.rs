//! Load reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadKind {
    FullBom,
    JobStandards,
}

/// A book or sheet that could not be extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetFailure {
    pub book: String,
    /// `None` when the book itself failed to open.
    pub sheet: Option<String>,
    pub error: String,
}

/// Outcome of one load. Failed sheets are recorded, not fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub kind: LoadKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub books_opened: usize,
    pub sheets_extracted: usize,
    pub sheets_skipped: usize,
    pub failures: Vec<SheetFailure>,
    /// Set when the documents were already loaded and nothing was read.
    #[serde(default)]
    pub already_loaded: bool,
}

impl LoadReport {
    pub fn new(kind: LoadKind) -> Self {
        Self {
            kind,
            started_at: Utc::now(),
            finished_at: None,
            books_opened: 0,
            sheets_extracted: 0,
            sheets_skipped: 0,
            failures: Vec::new(),
            already_loaded: false,
        }
    }

    /// Report for a load that found its documents already extracted.
    pub fn cached(kind: LoadKind) -> Self {
        let mut report = Self::new(kind);
        report.already_loaded = true;
        report.finish();
        report
    }

    pub fn record_failure(&mut self, book: &str, sheet: Option<&str>, error: impl ToString) {
        self.failures.push(SheetFailure {
            book: book.to_string(),
            sheet: sheet.map(str::to_string),
            error: error.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
