//! Per-form state shared by every concrete form

use super::messages::ErrorMessages;
use crate::errors::{FieldResult, FormError, FormResult};
use crate::sanitizers::Purifier;
use crate::FieldMap;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

static NULL_VALUE: Value = Value::Null;

/// Where a form is in its populate → sanitize → validate cycle
///
/// This records the last step run. [`FormState::update`] does not change it,
/// so after an update a `Sanitized` or `Validated` form holds clean data for
/// the previous raw data until [`FormState::sanitize`] runs again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormLifecycle {
    /// Raw data loaded, no clean data
    Populated,
    /// Clean data computed from the current raw data
    Sanitized,
    /// `validate_all` finished on the current data
    Validated,
}

/// Submitted data, options and error messages of one form instance
///
/// `clean_data` is `None` until [`sanitize`](Self::sanitize) runs and is
/// cleared again by [`populate`](Self::populate). Error messages are kept
/// across `populate`; use [`clear_error_messages`](Self::clear_error_messages)
/// to reuse an instance for a new submission.
pub struct FormState {
    options: FieldMap,
    required_fields: Vec<String>,
    tainted_data: FieldMap,
    clean_data: Option<FieldMap>,
    messages: ErrorMessages,
    purifier: Arc<dyn Purifier>,
    lifecycle: FormLifecycle,
}

impl FormState {
    /// Create the state and populate it with `data`
    pub fn new(data: FieldMap, purifier: Arc<dyn Purifier>, options: FieldMap) -> Self {
        let mut state = Self {
            options,
            required_fields: Vec::new(),
            tainted_data: FieldMap::new(),
            clean_data: None,
            messages: ErrorMessages::new(),
            purifier,
            lifecycle: FormLifecycle::Populated,
        };
        state.populate(data);
        state
    }

    /// Set the fields [`has_required_fields`](Self::has_required_fields)
    /// looks for. Naming a field twice is a configuration error.
    pub fn with_required_fields<I, S>(mut self, fields: I) -> FormResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.as_str()) {
                return Err(FormError::DuplicateRequiredField(field.clone()));
            }
        }

        self.required_fields = fields;
        Ok(self)
    }

    /// Replace the raw data and drop any clean data
    pub fn populate(&mut self, data: FieldMap) {
        log::debug!("Populating form with {} field(s)", data.len());
        self.tainted_data = data;
        self.clean_data = None;
        self.lifecycle = FormLifecycle::Populated;
    }

    /// Merge `data` into the raw data; its keys overwrite existing ones
    ///
    /// Clean data and the lifecycle are left as they were.
    pub fn update(&mut self, data: FieldMap) {
        log::debug!("Updating form with {} field(s)", data.len());
        for (key, value) in data {
            self.tainted_data.insert(key, value);
        }
    }

    /// Whether every required field was submitted
    pub fn has_required_fields(&self) -> bool {
        self.required_fields
            .iter()
            .all(|field| self.tainted_data.contains_key(field))
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    /// The clean data, `None` before [`sanitize`](Self::sanitize)
    pub fn clean_data(&self) -> Option<&FieldMap> {
        self.clean_data.as_ref()
    }

    /// Subset of the clean data for `keys`
    ///
    /// Keys that are missing or null in the clean data are left out. An
    /// empty `keys` returns all clean data; before sanitizing the result is
    /// empty.
    pub fn clean_fields(&self, keys: &[&str]) -> FieldMap {
        let Some(clean) = &self.clean_data else {
            return FieldMap::new();
        };

        if keys.is_empty() {
            return clean.clone();
        }

        keys.iter()
            .filter_map(|key| {
                clean
                    .get(*key)
                    .filter(|value| !value.is_null())
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }

    pub fn tainted_field(&self, name: &str) -> Option<&Value> {
        self.tainted_data.get(name)
    }

    /// The raw value of `name`, or `default` when it is absent or null
    pub fn tainted_field_or<'a>(&'a self, name: &str, default: &'a Value) -> &'a Value {
        present(self.tainted_data.get(name)).unwrap_or(default)
    }

    pub fn tainted_data(&self) -> &FieldMap {
        &self.tainted_data
    }

    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// The option `name`, or `default` when it is absent or null
    pub fn option_or<'a>(&'a self, name: &str, default: &'a Value) -> &'a Value {
        present(self.options.get(name)).unwrap_or(default)
    }

    pub fn error_messages(&self) -> &[String] {
        self.messages.as_slice()
    }

    pub fn has_errors(&self) -> bool {
        !self.messages.is_empty()
    }

    /// Record a message unless the same text is already recorded
    pub fn add_error_message<S: Into<String>>(&mut self, message: S) {
        self.messages.add(message);
    }

    pub fn clear_error_messages(&mut self) {
        self.messages.clear();
    }

    /// Run `check` on the raw value of `name` (null when absent) and record
    /// its message on failure. Returns whether the check passed.
    pub fn check_field<F>(&mut self, name: &str, check: F) -> bool
    where
        F: FnOnce(&str, &Value) -> FieldResult,
    {
        let result = check(name, self.tainted_field_or(name, &NULL_VALUE));
        self.record(result)
    }

    /// Like [`check_field`](Self::check_field) but reads the clean value
    pub fn check_clean_field<F>(&mut self, name: &str, check: F) -> bool
    where
        F: FnOnce(&str, &Value) -> FieldResult,
    {
        let value = self
            .clean_data
            .as_ref()
            .and_then(|clean| clean.get(name))
            .unwrap_or(&NULL_VALUE);
        let result = check(name, value);
        self.record(result)
    }

    fn record(&mut self, result: FieldResult) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                self.add_error_message(err.to_string());
                false
            }
        }
    }

    /// Mark validation as finished; returns `true` when no errors were recorded
    pub fn finish_validation(&mut self) -> bool {
        self.lifecycle = FormLifecycle::Validated;
        if self.has_errors() {
            log::debug!(
                "Form validation failed with {} message(s)",
                self.messages.len()
            );
            false
        } else {
            true
        }
    }

    pub fn lifecycle(&self) -> FormLifecycle {
        self.lifecycle
    }

    /// Purify every raw field into the clean data
    ///
    /// On failure the previous clean data is left untouched.
    pub fn sanitize(&mut self) -> FormResult<()> {
        let clean = self.internal_sanitize(&self.tainted_data)?;
        log::debug!("Sanitized {} field(s)", clean.len());
        self.clean_data = Some(clean);
        self.lifecycle = FormLifecycle::Sanitized;
        Ok(())
    }

    /// Purify each value of `tainted_data`, keeping keys and order; the first
    /// purifier error aborts the whole map
    pub fn internal_sanitize(&self, tainted_data: &FieldMap) -> FormResult<FieldMap> {
        tainted_data
            .iter()
            .map(|(key, value)| {
                self.purifier
                    .purify(value)
                    .map(|clean| (key.clone(), clean))
                    .map_err(|err| FormError::Sanitize(err.at_field(key)))
            })
            .collect()
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormState")
            .field("options", &self.options)
            .field("required_fields", &self.required_fields)
            .field("tainted_data", &self.tainted_data)
            .field("clean_data", &self.clean_data)
            .field("messages", &self.messages)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SanitizeError;
    use crate::sanitizers::FnPurifier;
    use crate::validators;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fields(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn upper_purifier() -> Arc<dyn Purifier> {
        Arc::new(FnPurifier::new(|value: &Value| {
            Ok(match value {
                Value::String(s) => Value::String(s.to_uppercase()),
                other => other.clone(),
            })
        }))
    }

    fn state(data: Value) -> FormState {
        FormState::new(fields(data), upper_purifier(), FieldMap::new())
    }

    #[test]
    fn test_populate_round_trip() {
        let data = fields(json!({"title": "Rust", "level": 2}));
        let mut form = state(json!({"old": true}));

        form.populate(data.clone());
        assert_eq!(form.tainted_data(), &data);
        assert_eq!(form.lifecycle(), FormLifecycle::Populated);
    }

    #[test]
    fn test_populate_clears_clean_data_but_not_messages() {
        let mut form = state(json!({"title": "rust"}));
        form.sanitize().unwrap();
        form.add_error_message("stale");
        assert!(form.clean_data().is_some());

        form.populate(fields(json!({"title": "go"})));
        assert!(form.clean_data().is_none());
        assert_eq!(form.error_messages(), &["stale"]);

        form.clear_error_messages();
        assert!(!form.has_errors());
    }

    #[test]
    fn test_update_overwrites_and_preserves() {
        let mut form = state(json!({"a": 1, "b": 2}));
        form.update(fields(json!({"b": 20, "c": 30})));

        assert_eq!(
            form.tainted_data(),
            &fields(json!({"a": 1, "b": 20, "c": 30}))
        );
        let keys: Vec<&String> = form.tainted_data().keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_required_fields() {
        let form = state(json!({"title": "x", "description": "y"}))
            .with_required_fields(["description", "title"])
            .unwrap();
        assert!(form.has_required_fields());

        let form = state(json!({"title": "x"}))
            .with_required_fields(["title", "description"])
            .unwrap();
        assert!(!form.has_required_fields());

        // Null still counts as submitted
        let form = state(json!({"title": null}))
            .with_required_fields(["title"])
            .unwrap();
        assert!(form.has_required_fields());
    }

    #[test]
    fn test_duplicate_required_fields_rejected() {
        let err = state(json!({}))
            .with_required_fields(["title", "email", "title"])
            .unwrap_err();
        assert_eq!(err, FormError::DuplicateRequiredField("title".to_string()));
    }

    #[test]
    fn test_add_error_message_dedup() {
        let mut form = state(json!({}));
        form.add_error_message("x");
        form.add_error_message("x");
        assert_eq!(form.error_messages(), &["x"]);
        assert!(form.has_errors());
    }

    #[test]
    fn test_sanitize_applies_purifier_to_every_field() {
        let mut form = state(json!({"title": "rust", "speaker": "ferris", "level": 3}));
        assert!(form.clean_data().is_none());

        form.sanitize().unwrap();
        let clean = form.clean_data().unwrap();
        assert_eq!(
            clean,
            &fields(json!({"title": "RUST", "speaker": "FERRIS", "level": 3}))
        );
        assert_eq!(form.lifecycle(), FormLifecycle::Sanitized);
    }

    #[test]
    fn test_clean_fields_subset() {
        let mut form = state(json!({"a": "x", "b": "y"}));
        assert!(form.clean_fields(&["a"]).is_empty());

        form.sanitize().unwrap();
        assert_eq!(form.clean_fields(&["a", "z"]), fields(json!({"a": "X"})));
        assert_eq!(form.clean_fields(&[]), fields(json!({"a": "X", "b": "Y"})));
    }

    #[test]
    fn test_sanitize_fails_fast() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let purifier = Arc::new(FnPurifier::new(move |value: &Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            if value == &json!("bad") {
                Err(SanitizeError::rejected("", "forbidden value"))
            } else {
                Ok(value.clone())
            }
        }));

        let mut form = FormState::new(
            fields(json!({"first": "ok", "second": "bad", "third": "ok"})),
            purifier,
            FieldMap::new(),
        );

        let err = form.sanitize().unwrap_err();
        assert_eq!(
            err,
            FormError::Sanitize(SanitizeError::rejected("second", "forbidden value"))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(form.clean_data().is_none());
    }

    #[test]
    fn test_field_and_option_accessors() {
        let options = fields(json!({"user_id": 7}));
        let form = FormState::new(fields(json!({"title": "x"})), upper_purifier(), options);
        let fallback = json!("none");

        assert_eq!(form.tainted_field("title"), Some(&json!("x")));
        assert_eq!(form.tainted_field("missing"), None);
        assert_eq!(form.tainted_field_or("missing", &fallback), &fallback);
        assert_eq!(form.option("user_id"), Some(&json!(7)));
        assert_eq!(form.option_or("speaker_id", &fallback), &fallback);
    }

    #[test]
    fn test_null_values_count_as_absent() {
        let options = fields(json!({"o": null, "p": 0}));
        let data = fields(json!({"a": null, "b": "x"}));
        let mut form = FormState::new(data, upper_purifier(), options);
        let fallback = json!("default");

        assert_eq!(form.tainted_field_or("a", &fallback), &fallback);
        assert_eq!(form.tainted_field_or("b", &fallback), &json!("x"));
        assert_eq!(form.option_or("o", &fallback), &fallback);
        assert_eq!(form.option_or("p", &fallback), &json!(0));

        // The plain accessors still report the stored null
        assert_eq!(form.tainted_field("a"), Some(&Value::Null));
        assert_eq!(form.option("o"), Some(&Value::Null));

        form.sanitize().unwrap();
        assert_eq!(form.clean_fields(&["a", "b"]), fields(json!({"b": "X"})));
        assert_eq!(form.clean_fields(&[]), fields(json!({"a": null, "b": "X"})));
    }

    #[test]
    fn test_update_keeps_lifecycle_and_clean_data() {
        let mut form = state(json!({"title": "rust"}));
        form.sanitize().unwrap();

        form.update(fields(json!({"title": "go"})));
        assert_eq!(form.lifecycle(), FormLifecycle::Sanitized);
        assert_eq!(form.clean_fields(&["title"]), fields(json!({"title": "RUST"})));

        form.sanitize().unwrap();
        assert_eq!(form.clean_fields(&["title"]), fields(json!({"title": "GO"})));
    }

    #[test]
    fn test_check_field_records_message() {
        let mut form = state(json!({"title": ""}));

        assert!(!form.check_field("title", validators::not_blank));
        assert!(!form.check_field("email", validators::required));
        assert!(form.check_field("title", |name, value| {
            validators::max_length(name, value, 10)
        }));

        assert!(!form.finish_validation());
        assert_eq!(
            form.error_messages(),
            &["The title field is required.", "The email field is required."]
        );
        assert_eq!(form.lifecycle(), FormLifecycle::Validated);
    }

    #[test]
    fn test_check_clean_field_reads_sanitized_value() {
        let mut form = state(json!({"title": "abc"}));
        let expects_upper = |_: &str, value: &Value| {
            if value == &json!("ABC") {
                Ok(())
            } else {
                Err(crate::errors::FieldError::InvalidFormat("not clean".to_string()))
            }
        };

        assert!(!form.check_clean_field("title", expects_upper));
        form.clear_error_messages();
        form.sanitize().unwrap();
        assert!(form.check_clean_field("title", expects_upper));
    }
}
