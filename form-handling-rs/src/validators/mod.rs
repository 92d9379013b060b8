//! Field-level validators
//!
//! Checks concrete forms run from `validate_all` through
//! [`FormState::check_field`](crate::form::FormState::check_field). Each takes
//! the field name (for the message) and the submitted value; an absent field
//! is passed as `Value::Null`. Only [`required`] and [`not_blank`] reject null,
//! every other check passes on it so optional fields can be described with
//! the same helpers.

pub mod generic;
pub mod string;

pub use generic::*;
pub use string::*;

/// Utility module for validation helpers
pub mod utils {
    use crate::errors::FieldError;
    use lazy_static::lazy_static;
    use regex::Regex;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Get a compiled regex for `pattern`, caching it for later calls
    pub fn get_regex(pattern: &str) -> Result<Regex, regex::Error> {
        lazy_static! {
            static ref REGEX_CACHE: Mutex<HashMap<String, Regex>> = Mutex::new(HashMap::new());
        }

        let mut cache = match REGEX_CACHE.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(re) = cache.get(pattern) {
            return Ok(re.clone());
        }

        let compiled = Regex::new(pattern)?;
        cache.insert(pattern.to_string(), compiled.clone());
        Ok(compiled)
    }

    /// Human-readable field label: `speaker_name` -> `speaker name`
    pub fn label(field: &str) -> String {
        field.replace(['_', '-'], " ")
    }

    /// Borrow the value as text, `None` for null
    pub fn as_text<'a>(field: &str, value: &'a Value) -> Result<Option<&'a str>, FieldError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.as_str())),
            _ => Err(FieldError::InvalidType(format!(
                "The {} must be a string.",
                label(field)
            ))),
        }
    }
}
