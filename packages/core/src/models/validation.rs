//! Caller-side validation errors
//!
//! Raised before any optimistic mutation takes place, so a rejected draft
//! never reaches a record store or the remote table.

use thiserror::Error;

/// Validation errors for drafts and patches
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid quantity for {field}: {value}")]
    InvalidQuantity { field: String, value: i64 },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl ValidationError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }
}

/// Reject empty or whitespace-only text
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::missing_field(field));
    }
    Ok(())
}
