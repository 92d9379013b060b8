//! Form layer configuration
//!
//! Settings for the default purifier. Values can be supplied from the
//! environment (or a `.env` file) with the same fallback behaviour the
//! service configuration helpers use: an unparsable value logs a warning and
//! the default is kept.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_FIELD_LENGTH};

/// Tags the default purifier keeps when HTML is allowed
pub const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "p", "br", "b", "i", "em", "strong", "a", "ul", "ol", "li", "span", "div", "blockquote",
    "code", "pre", "h1", "h2", "h3", "h4", "h5", "h6", "img",
];

/// Attributes the default purifier keeps on allowed tags
pub const DEFAULT_ALLOWED_ATTRIBUTES: &[&str] = &["href", "src", "alt", "title", "class", "id"];

/// Configuration for form sanitization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Maximum characters in a single string value
    pub max_field_length: usize,
    /// Maximum nesting depth of array/object values
    pub max_depth: usize,
    /// Strip every tag instead of filtering against the allow-list
    pub strip_all_html: bool,
    /// Trim leading and trailing whitespace from string values
    pub trim_whitespace: bool,
    /// Lowercase tag names that survive sanitization
    pub allowed_tags: Vec<String>,
    /// Lowercase attribute names that survive sanitization
    pub allowed_attributes: Vec<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
            strip_all_html: false,
            trim_whitespace: true,
            allowed_tags: DEFAULT_ALLOWED_TAGS.iter().map(|t| t.to_string()).collect(),
            allowed_attributes: DEFAULT_ALLOWED_ATTRIBUTES
                .iter()
                .map(|a| a.to_string())
                .collect(),
        }
    }
}

impl FormConfig {
    /// Load configuration from `FORM_*` environment variables
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        Self {
            max_field_length: env_or("FORM_MAX_FIELD_LENGTH", defaults.max_field_length),
            max_depth: env_or("FORM_MAX_DEPTH", defaults.max_depth),
            strip_all_html: env_or("FORM_STRIP_ALL_HTML", defaults.strip_all_html),
            trim_whitespace: env_or("FORM_TRIM_WHITESPACE", defaults.trim_whitespace),
            allowed_tags: env_list("FORM_ALLOWED_TAGS").unwrap_or(defaults.allowed_tags),
            allowed_attributes: env_list("FORM_ALLOWED_ATTRIBUTES")
                .unwrap_or(defaults.allowed_attributes),
        }
    }

    /// Strip all markup from submitted values
    pub fn strict(mut self) -> Self {
        self.strip_all_html = true;
        self
    }

    pub fn with_max_field_length(mut self, max: usize) -> Self {
        self.max_field_length = max;
        self
    }

    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    pub fn with_allowed_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    pub fn with_allowed_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_attributes = attributes
            .into_iter()
            .map(|a| a.as_ref().trim().to_lowercase())
            .collect();
        self
    }
}

/// Read and parse a variable, falling back to `default`
fn env_or<T: FromStr + ToString>(var_name: &str, default: T) -> T {
    match env::var(var_name) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            log::warn!(
                "Invalid value '{}' in {}, using default {}",
                raw,
                var_name,
                default.to_string()
            );
            default
        }),
        Err(_) => default,
    }
}

/// Read a comma separated list; empty entries are dropped
fn env_list(var_name: &str) -> Option<Vec<String>> {
    let raw = env::var(var_name).ok()?;
    Some(parse_list(&raw))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}
