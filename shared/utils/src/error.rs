use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BomError {
    #[error("Header key not found: {key}")]
    HeaderKeyNotFound { key: String },

    #[error("Ambiguous header key: {key} matches columns {columns:?}")]
    AmbiguousHeaderKey { key: String, columns: Vec<usize> },

    #[error("Workbook error: {book} - {message}")]
    Workbook { book: String, message: String },

    #[error("Sheet error: {sheet} - {message}")]
    Sheet { sheet: String, message: String },

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {message}")]
    Csv { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl BomError {
    pub fn header_key_not_found(key: impl Into<String>) -> Self {
        Self::HeaderKeyNotFound { key: key.into() }
    }

    pub fn ambiguous_header_key(key: impl Into<String>, columns: Vec<usize>) -> Self {
        Self::AmbiguousHeaderKey {
            key: key.into(),
            columns,
        }
    }

    pub fn workbook(book: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Workbook {
            book: book.into(),
            message: message.into(),
        }
    }

    pub fn sheet(sheet: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sheet {
            sheet: sheet.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Header lookups fail either way; only an ambiguous match points at a bad header.
    pub fn is_header_miss(&self) -> bool {
        matches!(self, Self::HeaderKeyNotFound { .. })
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::HeaderKeyNotFound { .. } => "HEADER_KEY_NOT_FOUND",
            Self::AmbiguousHeaderKey { .. } => "AMBIGUOUS_HEADER_KEY",
            Self::Workbook { .. } => "WORKBOOK_ERROR",
            Self::Sheet { .. } => "SHEET_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Csv { .. } => "CSV_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
        }
    }
}

pub type BomResult<T> = Result<T, BomError>;

// Conversion from common error types
impl From<std::io::Error> for BomError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            path: None,
            source: error,
        }
    }
}

impl From<csv::Error> for BomError {
    fn from(error: csv::Error) -> Self {
        Self::Csv {
            message: error.to_string(),
        }
    }
}

impl From<calamine::Error> for BomError {
    fn from(error: calamine::Error) -> Self {
        Self::workbook("excel", error.to_string())
    }
}

impl From<config::ConfigError> for BomError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

impl From<validator::ValidationErrors> for BomError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::configuration(crate::validation::format_validation_errors(&errors))
    }
}
