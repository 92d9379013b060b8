//! # Form Handling Library
//!
//! The form-handling layer of a web application: sanitizing and validating
//! submitted form data, and checking inbound requests against declarative
//! rules.
//!
//! ## Features
//!
//! - [`Form`] trait with a shared populate / update / sanitize / validate
//!   lifecycle backed by [`FormState`]
//! - Pluggable [`Purifier`] sanitizers, with an allow-list based
//!   [`HtmlPurifier`] as the default
//! - Field-level validators for `validate_all` implementations
//! - [`RequestValidator`] adapting a request's query, body and file fields to
//!   an injected validation engine
//! - Environment-driven [`FormConfig`]

mod config;
mod errors;
pub mod form;
pub mod request;
pub mod sanitizers;
pub mod validators;

pub use config::{FormConfig, DEFAULT_ALLOWED_ATTRIBUTES, DEFAULT_ALLOWED_TAGS};
pub use errors::{
    FieldError, FieldResult, FormError, FormResult, SanitizeError, ValidationException,
};
pub use form::{ErrorMessages, Form, FormAction, FormLifecycle, FormState};
pub use request::{
    FieldErrors, MessageMap, RequestFields, RequestParams, RequestValidator, RuleSet,
    ValidationFactory, Validator,
};
pub use sanitizers::{FnPurifier, HtmlPurifier, Purifier};

/// Insertion-ordered mapping of field name to submitted value
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Re-export commonly used items for convenience
pub mod prelude {
    pub use crate::config::FormConfig;
    pub use crate::errors::{FieldError, FieldResult, FormError, FormResult, ValidationException};
    pub use crate::form::{Form, FormAction, FormLifecycle, FormState};
    pub use crate::request::{
        FieldErrors, MessageMap, RequestFields, RequestParams, RequestValidator, RuleSet,
        ValidationFactory, Validator,
    };
    pub use crate::sanitizers::{self, HtmlPurifier, Purifier};
    pub use crate::validators;
    pub use crate::FieldMap;
}

/// Version of the form handling library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default maximum characters in one submitted string value
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 32_768;

/// Default maximum nesting depth of submitted arrays/objects
pub const DEFAULT_MAX_DEPTH: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_crate_limits() {
        let config = FormConfig::default();
        assert_eq!(config.max_field_length, DEFAULT_MAX_FIELD_LENGTH);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(HtmlPurifier::default().config(), &config);
    }
}
