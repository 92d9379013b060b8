//! Input sanitization utilities
//!
//! This module provides the [`Purifier`] capability forms use to turn
//! tainted values into clean ones, plus the string and HTML sanitizers the
//! default [`HtmlPurifier`] is built from.

pub mod html;
pub mod string;

pub use html::*;
pub use string::*;

use crate::errors::SanitizeError;
use serde_json::Value;
use std::sync::Arc;

/// Sanitizer applied to one submitted field value at a time
///
/// Implementations are shared between forms, so they must not hold
/// per-request state.
pub trait Purifier: Send + Sync {
    /// Return the cleaned version of `value`
    fn purify(&self, value: &Value) -> Result<Value, SanitizeError>;
}

impl<P: Purifier + ?Sized> Purifier for Arc<P> {
    fn purify(&self, value: &Value) -> Result<Value, SanitizeError> {
        (**self).purify(value)
    }
}

impl<P: Purifier + ?Sized> Purifier for Box<P> {
    fn purify(&self, value: &Value) -> Result<Value, SanitizeError> {
        (**self).purify(value)
    }
}

/// Adapter turning a closure into a [`Purifier`]
pub struct FnPurifier<F>(F);

impl<F> FnPurifier<F>
where
    F: Fn(&Value) -> Result<Value, SanitizeError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Purifier for FnPurifier<F>
where
    F: Fn(&Value) -> Result<Value, SanitizeError> + Send + Sync,
{
    fn purify(&self, value: &Value) -> Result<Value, SanitizeError> {
        (self.0)(value)
    }
}

/// Sanitization result containing the sanitized content and information
/// about whether changes were made during sanitization
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizeResult<T> {
    /// Sanitized content
    pub sanitized: T,
    /// Whether any changes were made during sanitization
    pub was_modified: bool,
    /// Optional details about what was modified
    pub details: Option<String>,
}

impl<T> SanitizeResult<T> {
    /// Create a result with unmodified content
    pub fn unmodified(content: T) -> Self {
        Self {
            sanitized: content,
            was_modified: false,
            details: None,
        }
    }

    /// Create a result with modified content
    pub fn modified(content: T, details: Option<String>) -> Self {
        Self {
            sanitized: content,
            was_modified: true,
            details,
        }
    }
}

impl SanitizeResult<String> {
    /// Run another sanitizer over the current output, merging the
    /// modification flag and details
    pub fn then<F>(self, sanitizer: F) -> Self
    where
        F: FnOnce(&str) -> SanitizeResult<String>,
    {
        let next = sanitizer(&self.sanitized);
        if !next.was_modified {
            return self;
        }

        let details = match (self.details, next.details) {
            (Some(prev), Some(cur)) => Some(format!("{}; {}", prev, cur)),
            (prev, cur) => prev.or(cur),
        };

        SanitizeResult {
            sanitized: next.sanitized,
            was_modified: true,
            details,
        }
    }
}
