//! Request validation
//!
//! [`RequestValidator`] merges a request's query, body and file fields and
//! checks them with an injected [`ValidationFactory`]. A failing check is
//! turned into [`FormError::Validation`] carrying the flattened messages;
//! errors from the engine itself pass through unchanged.

mod engine;
mod params;

pub use engine::{FieldErrors, MessageMap, RuleSet, ValidationFactory, Validator};
pub use params::{RequestFields, RequestParams};

use crate::errors::{FormError, FormResult, ValidationException};

/// Checks inbound requests against declarative rules
#[derive(Debug, Clone)]
pub struct RequestValidator<F> {
    factory: F,
}

impl<F: ValidationFactory> RequestValidator<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Validate with the engine's default messages
    pub fn validate<R>(&self, request: &R, rules: &RuleSet) -> FormResult<()>
    where
        R: RequestFields + ?Sized,
    {
        self.validate_with_messages(request, rules, &MessageMap::new())
    }

    /// Validate `request` against `rules`, passing `messages` to the engine
    pub fn validate_with_messages<R>(
        &self,
        request: &R,
        rules: &RuleSet,
        messages: &MessageMap,
    ) -> FormResult<()>
    where
        R: RequestFields + ?Sized,
    {
        let data = request.all_fields();
        let validator = self.factory.make(&data, rules, messages)?;

        if validator.fails() {
            let errors = validator.errors().flatten();
            log::debug!(
                "Request failed validation with {} message(s)",
                errors.len()
            );
            return Err(FormError::Validation(ValidationException::with_errors(
                errors,
            )));
        }

        Ok(())
    }
}
