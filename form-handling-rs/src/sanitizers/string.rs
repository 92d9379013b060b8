//! String sanitization utilities
//!
//! Sanitizers for plain string input that run before any HTML filtering.

use super::SanitizeResult;
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Keeps \t, \n and \r, which are legitimate in textarea input
    static ref CONTROL_CHARS_REGEX: Regex =
        Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap();
}

/// Remove control characters from a string
pub fn remove_control_chars(input: &str) -> SanitizeResult<String> {
    let sanitized = CONTROL_CHARS_REGEX.replace_all(input, "").to_string();

    if sanitized == input {
        SanitizeResult::unmodified(input.to_string())
    } else {
        SanitizeResult::modified(sanitized, Some("Removed control characters".to_string()))
    }
}

/// Normalize Unicode text (NFC form)
pub fn normalize_unicode(input: &str) -> SanitizeResult<String> {
    let normalized = input.nfc().collect::<String>();

    if normalized == input {
        SanitizeResult::unmodified(input.to_string())
    } else {
        SanitizeResult::modified(
            normalized,
            Some("Normalized Unicode characters".to_string()),
        )
    }
}

/// Trim whitespace from beginning and end
pub fn trim_whitespace(input: &str) -> SanitizeResult<String> {
    let trimmed = input.trim();

    if trimmed.len() == input.len() {
        SanitizeResult::unmodified(input.to_string())
    } else {
        SanitizeResult::modified(trimmed.to_string(), Some("Trimmed whitespace".to_string()))
    }
}

/// Normalize line endings to LF only
pub fn normalize_line_endings(input: &str) -> SanitizeResult<String> {
    let result = input.replace("\r\n", "\n").replace('\r', "\n");

    if result == input {
        SanitizeResult::unmodified(input.to_string())
    } else {
        SanitizeResult::modified(result, Some("Normalized line endings".to_string()))
    }
}
