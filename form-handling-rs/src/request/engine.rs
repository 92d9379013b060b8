//! Validation engine capability
//!
//! The engine interprets rule expressions; this crate only hands it the
//! request data and reads back pass/fail and per-field messages.

use crate::errors::FormResult;
use crate::FieldMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Field name to rule expression, opaque to this crate
pub type RuleSet = FieldMap;

/// Custom engine messages, opaque to this crate
pub type MessageMap = FieldMap;

/// Builds a [`Validator`] for one set of data
pub trait ValidationFactory: Send + Sync {
    /// Errors from the engine itself (e.g. malformed rules) are returned as
    /// `FormError::Engine`
    fn make(
        &self,
        data: &FieldMap,
        rules: &RuleSet,
        messages: &MessageMap,
    ) -> FormResult<Box<dyn Validator>>;
}

impl<F: ValidationFactory + ?Sized> ValidationFactory for Arc<F> {
    fn make(
        &self,
        data: &FieldMap,
        rules: &RuleSet,
        messages: &MessageMap,
    ) -> FormResult<Box<dyn Validator>> {
        (**self).make(data, rules, messages)
    }
}

/// Outcome of running the rules
pub trait Validator: Send + Sync {
    fn fails(&self) -> bool;

    fn errors(&self) -> FieldErrors;
}

/// Per-field error messages in engine order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message for `field`, keeping the field's first position
    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        let field = field.into();
        let message = message.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field, vec![message])),
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fields with at least one message
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All messages in one list: field order first, then message order
    pub fn flatten(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|(_, messages)| messages.iter().cloned())
            .collect()
    }
}

impl<F, M> FromIterator<(F, M)> for FieldErrors
where
    F: Into<String>,
    M: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (F, M)>>(iter: I) -> Self {
        let mut errors = FieldErrors::new();
        for (field, message) in iter {
            errors.add(field, message);
        }
        errors
    }
}
