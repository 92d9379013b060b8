//! Generic validators
//!
//! Checks that do not care whether the value is a string.

use super::utils::label;
use crate::errors::{FieldError, FieldResult};
use serde_json::Value;

/// Validate that the field was submitted with a non-null value
pub fn required(field: &str, value: &Value) -> FieldResult {
    if value.is_null() {
        Err(FieldError::Missing(format!(
            "The {} field is required.",
            label(field)
        )))
    } else {
        Ok(())
    }
}

/// Validate that the value is one of `allowed`
///
/// Numbers and booleans are compared through their string form, since
/// submitted form data arrives as text.
pub fn one_of(field: &str, value: &Value, allowed: &[&str]) -> FieldResult {
    let text = match value {
        Value::Null => return Ok(()),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => {
            return Err(FieldError::InvalidType(format!(
                "The selected {} is invalid.",
                label(field)
            )))
        }
    };

    if allowed.contains(&text.as_str()) {
        Ok(())
    } else {
        Err(FieldError::InvalidFormat(format!(
            "The selected {} is invalid.",
            label(field)
        )))
    }
}

/// Validate that the value is an integer or a string holding one
pub fn is_integer(field: &str, value: &Value) -> FieldResult {
    let ok = match value {
        Value::Null => true,
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(FieldError::InvalidType(format!(
            "The {} must be an integer.",
            label(field)
        )))
    }
}
