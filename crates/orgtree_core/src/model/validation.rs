//! Field validation for unit and member text fields.
//!
//! # Invariants
//! - Values are trimmed before their length is measured.
//! - Lengths are counted in Unicode scalar values, not bytes.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound for every bounded text field.
pub const MAX_TEXT_CHARS: usize = 200;

/// Accepted textual form of hire dates.
pub const HIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty after trimming.
    Blank { field: &'static str },
    /// Field exceeds [`MAX_TEXT_CHARS`] after trimming.
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Date is not a valid `YYYY-MM-DD` calendar date.
    InvalidDate { field: &'static str, value: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Blank { field } | Self::TooLong { field, .. } | Self::InvalidDate { field, .. } => {
                field
            }
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "{field} must not be blank"),
            Self::TooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "{field} must be at most {max_chars} characters, got {actual_chars}"
            ),
            Self::InvalidDate { field, value } => {
                write!(f, "{field} must be a YYYY-MM-DD date, got `{value}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and checks it is within 1..=[`MAX_TEXT_CHARS`] characters.
pub fn normalize_bounded_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank { field });
    }
    let actual_chars = trimmed.chars().count();
    if actual_chars > MAX_TEXT_CHARS {
        return Err(ValidationError::TooLong {
            field,
            max_chars: MAX_TEXT_CHARS,
            actual_chars,
        });
    }
    Ok(trimmed.to_string())
}

/// Normalizes a unit display name.
pub fn normalize_unit_name(value: &str) -> Result<String, ValidationError> {
    normalize_bounded_text("name", value)
}

/// Parses a `YYYY-MM-DD` hire date.
pub fn parse_hire_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, HIRE_DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidDate {
            field: "hired_at",
            value: trimmed.to_string(),
        }
    })
}
