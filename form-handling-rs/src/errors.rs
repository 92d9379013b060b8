//! Error handling for the form layer
//!
//! Expected outcomes (a form that fails its rules, a request the engine
//! rejects) are reported as values. Sanitizer and engine failures are carried
//! through unchanged so the caller can treat them as fatal for the request.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for form operations
pub type FormResult<T> = Result<T, FormError>;

/// Result type for a single field check
pub type FieldResult = Result<(), FieldError>;

/// Top-level error for the form layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    /// A required-field list named the same field twice
    #[error("Duplicate required field: {0}")]
    DuplicateRequiredField(String),

    /// The purifier rejected a value
    #[error("Sanitization failed: {0}")]
    Sanitize(#[from] SanitizeError),

    /// The validation engine reported failures for the request
    #[error(transparent)]
    Validation(#[from] ValidationException),

    /// The validation engine itself failed (malformed rules, etc.)
    #[error("Validation engine error: {0}")]
    Engine(String),
}

impl FormError {
    /// Create an engine error with a message
    pub fn engine<S: Into<String>>(message: S) -> Self {
        FormError::Engine(message.into())
    }

    /// Returns the user-facing messages if this is a validation failure
    pub fn validation_errors(&self) -> Option<&[String]> {
        match self {
            FormError::Validation(exception) => Some(exception.errors()),
            _ => None,
        }
    }
}

/// Failure raised by a purifier for a single value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SanitizeError {
    /// String value longer than the configured maximum
    #[error("Field '{field}' exceeds maximum length of {max} characters")]
    TooLong { field: String, max: usize },

    /// Nested arrays/objects deeper than the configured maximum
    #[error("Field '{field}' exceeds maximum nesting depth of {max}")]
    ExceededMaxDepth { field: String, max: usize },

    /// Purifier refused the value outright
    #[error("Field '{field}' rejected: {reason}")]
    Rejected { field: String, reason: String },
}

impl SanitizeError {
    /// Create a rejection error
    pub fn rejected<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        SanitizeError::Rejected {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach the field name to an error raised before the field was known
    pub(crate) fn at_field(self, name: &str) -> Self {
        match self {
            SanitizeError::TooLong { field, max } if field.is_empty() => SanitizeError::TooLong {
                field: name.to_string(),
                max,
            },
            SanitizeError::ExceededMaxDepth { field, max } if field.is_empty() => {
                SanitizeError::ExceededMaxDepth {
                    field: name.to_string(),
                    max,
                }
            }
            SanitizeError::Rejected { field, reason } if field.is_empty() => {
                SanitizeError::Rejected {
                    field: name.to_string(),
                    reason,
                }
            }
            other => other,
        }
    }
}

/// Failure of a field-level check run by a concrete form
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Field is absent or null
    #[error("{0}")]
    Missing(String),

    /// Value is shorter than allowed
    #[error("{0}")]
    TooShort(String),

    /// Value is longer than allowed
    #[error("{0}")]
    TooLong(String),

    /// Value does not match the expected pattern
    #[error("{0}")]
    PatternMismatch(String),

    /// Value has the right type but an unacceptable format
    #[error("{0}")]
    InvalidFormat(String),

    /// Value has the wrong JSON type
    #[error("{0}")]
    InvalidType(String),
}

/// Request validation failure carrying the flattened engine messages
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationException {
    errors: Vec<String>,
}

impl ValidationException {
    /// Build the exception from an already-flattened message list
    pub fn with_errors<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    /// The flattened messages in engine order
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

impl fmt::Display for ValidationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "Validation failed");
        }
        write!(f, "Validation failed: {}", self.errors.join("; "))
    }
}
