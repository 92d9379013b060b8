//! String validators
//!
//! Length is counted in characters, not bytes.

use super::utils::{as_text, get_regex, label};
use crate::errors::{FieldError, FieldResult};
use serde_json::Value;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$";

/// Validate that a string field, if present, is not only whitespace
pub fn not_blank(field: &str, value: &Value) -> FieldResult {
    match as_text(field, value)? {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(FieldError::Missing(format!(
            "The {} field is required.",
            label(field)
        ))),
    }
}

/// Validate that a string has at least `min` characters
pub fn min_length(field: &str, value: &Value, min: usize) -> FieldResult {
    let Some(s) = as_text(field, value)? else {
        return Ok(());
    };

    if s.chars().count() < min {
        Err(FieldError::TooShort(format!(
            "The {} must be at least {} characters.",
            label(field),
            min
        )))
    } else {
        Ok(())
    }
}

/// Validate that a string has at most `max` characters
pub fn max_length(field: &str, value: &Value, max: usize) -> FieldResult {
    let Some(s) = as_text(field, value)? else {
        return Ok(());
    };

    if s.chars().count() > max {
        Err(FieldError::TooLong(format!(
            "The {} may not be greater than {} characters.",
            label(field),
            max
        )))
    } else {
        Ok(())
    }
}

/// Validate that a string matches a pattern
pub fn matches_pattern(field: &str, value: &Value, pattern: &str) -> FieldResult {
    let Some(s) = as_text(field, value)? else {
        return Ok(());
    };

    let re = get_regex(pattern).map_err(|e| {
        FieldError::PatternMismatch(format!("Invalid pattern for {}: {}", label(field), e))
    })?;

    if re.is_match(s) {
        Ok(())
    } else {
        Err(FieldError::PatternMismatch(format!(
            "The {} format is invalid.",
            label(field)
        )))
    }
}

/// Validate email address format
pub fn email(field: &str, value: &Value) -> FieldResult {
    matches_pattern(field, value, EMAIL_PATTERN).map_err(|_| {
        FieldError::InvalidFormat(format!(
            "The {} must be a valid email address.",
            label(field)
        ))
    })
}
