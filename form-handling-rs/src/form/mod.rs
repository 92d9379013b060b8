//! Form abstraction
//!
//! A concrete form is a struct that owns a [`FormState`] and implements
//! [`Form::validate_all`] with its own field rules. Everything else
//! (populating, merging updates, sanitizing, collecting messages) is provided
//! by the trait and delegates to the state.
//!
//! ```
//! use form_handling::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct SignupForm {
//!     state: FormState,
//! }
//!
//! impl Form for SignupForm {
//!     fn state(&self) -> &FormState {
//!         &self.state
//!     }
//!
//!     fn state_mut(&mut self) -> &mut FormState {
//!         &mut self.state
//!     }
//!
//!     fn validate_all(&mut self, _action: FormAction) -> bool {
//!         self.state.check_field("email", validators::email);
//!         self.state.finish_validation()
//!     }
//! }
//!
//! let data = json!({"email": "speaker@example.com"});
//! let mut form = SignupForm {
//!     state: FormState::new(
//!         data.as_object().cloned().unwrap_or_default(),
//!         Arc::new(HtmlPurifier::new()),
//!         FieldMap::new(),
//!     ),
//! };
//! form.sanitize().unwrap();
//! assert!(form.validate_all(FormAction::Create));
//! ```

mod messages;
mod state;

pub use messages::ErrorMessages;
pub use state::{FormLifecycle, FormState};

use crate::errors::FormResult;
use crate::FieldMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// What the submitted form is for; rules may differ between the two
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormAction {
    #[default]
    Create,
    Update,
}

impl FormAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormAction::Create => "create",
            FormAction::Update => "update",
        }
    }
}

impl fmt::Display for FormAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(FormAction::Create),
            "update" => Ok(FormAction::Update),
            other => Err(format!("Unknown form action: {}", other)),
        }
    }
}

/// A submitted form with subclass-defined validation
pub trait Form {
    fn state(&self) -> &FormState;

    fn state_mut(&mut self) -> &mut FormState;

    /// Check the submitted data, recording a message for each failure.
    ///
    /// Implementations end with [`FormState::finish_validation`] so the
    /// return value always equals `!has_errors()`. Calling it again on the
    /// same data adds no new messages.
    fn validate_all(&mut self, action: FormAction) -> bool;

    fn populate(&mut self, data: FieldMap) {
        self.state_mut().populate(data);
    }

    fn update(&mut self, data: FieldMap) {
        self.state_mut().update(data);
    }

    fn has_required_fields(&self) -> bool {
        self.state().has_required_fields()
    }

    fn clean_data(&self) -> Option<&FieldMap> {
        self.state().clean_data()
    }

    fn clean_fields(&self, keys: &[&str]) -> FieldMap {
        self.state().clean_fields(keys)
    }

    fn tainted_field(&self, name: &str) -> Option<&Value> {
        self.state().tainted_field(name)
    }

    fn tainted_field_or<'a>(&'a self, name: &str, default: &'a Value) -> &'a Value {
        self.state().tainted_field_or(name, default)
    }

    fn tainted_data(&self) -> &FieldMap {
        self.state().tainted_data()
    }

    fn option(&self, name: &str) -> Option<&Value> {
        self.state().option(name)
    }

    fn option_or<'a>(&'a self, name: &str, default: &'a Value) -> &'a Value {
        self.state().option_or(name, default)
    }

    fn error_messages(&self) -> &[String] {
        self.state().error_messages()
    }

    fn has_errors(&self) -> bool {
        self.state().has_errors()
    }

    fn clear_error_messages(&mut self) {
        self.state_mut().clear_error_messages();
    }

    fn sanitize(&mut self) -> FormResult<()> {
        self.state_mut().sanitize()
    }

    fn lifecycle(&self) -> FormLifecycle {
        self.state().lifecycle()
    }
}
