//! Error types for packing input.
//!
//! "No box fits this item" is not an error: it is reported through
//! [`crate::packer::PackingResult::unpacked`]. The only failure the packer knows
//! is malformed numeric data, which must reach the caller instead of being
//! silently coerced to zero.

use thiserror::Error;

/// Raised when an item or box type carries a missing, non-numeric,
/// non-finite or negative measurement, or when cart lines cannot be
/// expanded into distinct units.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("{subject}: required field '{field}' is missing")]
    MissingField { subject: String, field: &'static str },

    #[error("{subject}: field '{field}' must be a number, got {value}")]
    NotNumeric {
        subject: String,
        field: &'static str,
        value: String,
    },

    #[error("{subject}: field '{field}' must be finite, got {value}")]
    NonFinite {
        subject: String,
        field: &'static str,
        value: f64,
    },

    #[error("{subject}: field '{field}' must not be negative, got {value}")]
    Negative {
        subject: String,
        field: &'static str,
        value: f64,
    },

    #[error("{subject}: id must be a non-empty string or an integer, got {value}")]
    InvalidId { subject: String, value: String },

    #[error("{subject}: unit id '{value}' is already used by another line")]
    DuplicateId { subject: String, value: String },

    #[error("{subject}: {quantity} units exceed the limit of {max}")]
    QuantityTooLarge {
        subject: String,
        quantity: usize,
        max: usize,
    },
}

impl InvalidInputError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            InvalidInputError::MissingField { .. } => "missing_field",
            InvalidInputError::NotNumeric { .. } => "not_numeric",
            InvalidInputError::NonFinite { .. } => "non_finite",
            InvalidInputError::Negative { .. } => "negative_value",
            InvalidInputError::InvalidId { .. } => "invalid_id",
            InvalidInputError::DuplicateId { .. } => "duplicate_id",
            InvalidInputError::QuantityTooLarge { .. } => "quantity_too_large",
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            InvalidInputError::MissingField { field, .. }
            | InvalidInputError::NotNumeric { field, .. }
            | InvalidInputError::NonFinite { field, .. }
            | InvalidInputError::Negative { field, .. } => field,
            InvalidInputError::InvalidId { .. } | InvalidInputError::DuplicateId { .. } => "id",
            InvalidInputError::QuantityTooLarge { .. } => "quantity",
        }
    }
}

/// Result type alias for packing operations.
pub type Result<T> = std::result::Result<T, InvalidInputError>;
