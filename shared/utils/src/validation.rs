use crate::config::BomConfig;
use crate::error::{BomError, BomResult};
use regex::Regex;
use validator::{Validate, ValidationError, ValidationErrors};

/// Validates a loaded configuration before it reaches a collector.
pub fn validate_config(config: &BomConfig) -> BomResult<()> {
    config.validate()?;

    let layout = &config.layout;
    if layout.first_data_row <= layout.header_row {
        return Err(BomError::configuration(format!(
            "first_data_row ({}) must come after header_row ({})",
            layout.first_data_row, layout.header_row
        )));
    }

    if column_number(&layout.first_column) > column_number(&layout.last_column) {
        return Err(BomError::configuration(format!(
            "first_column {} lies right of last_column {}",
            layout.first_column, layout.last_column
        )));
    }

    Ok(())
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match &error.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("Validation failed for field '{}': {}", field, error.code),
            };
            messages.push(message);
        }
    }

    // Nested sections report through `errors()`, not `field_errors()`
    if messages.is_empty() {
        return errors.to_string();
    }

    messages.join(", ")
}

/// Spreadsheet column letters such as `B` or `AB`.
pub fn validate_column_letters(column: &str) -> Result<(), ValidationError> {
    if column.is_empty() || !column.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::new("invalid_column_letters"));
    }
    if column_number(column).is_none() {
        return Err(ValidationError::new("column_out_of_range"));
    }
    Ok(())
}

pub fn validate_pattern(pattern: &str) -> Result<(), ValidationError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_regex"))
}

/// 1-based column number of spreadsheet column letters (`A` = 1, `AB` = 28).
///
/// `None` when the letters overflow a `u32`.
pub fn column_number(column: &str) -> Option<u32> {
    column
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .try_fold(0u32, |acc, c| {
            acc.checked_mul(26)?
                .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
        })
}
