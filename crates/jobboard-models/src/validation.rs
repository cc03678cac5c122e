//! Boundary validation for submitted documents.

use thiserror::Error;
use validator::ValidateEmail;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised when a submitted payload is missing or misuses a required field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be a valid email address, got '{value}'")]
    InvalidEmail { field: &'static str, value: String },

    #[error("salaryRange.min ({min}) must not exceed salaryRange.max ({max})")]
    InvertedSalaryRange { min: i64, max: i64 },
}

/// Require a non-blank string field.
pub(crate) fn require(field: &'static str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Require a syntactically valid email address.
pub(crate) fn require_email(field: &'static str, value: &str) -> ValidationResult<()> {
    require(field, value)?;
    if !value.validate_email() {
        return Err(ValidationError::InvalidEmail {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
