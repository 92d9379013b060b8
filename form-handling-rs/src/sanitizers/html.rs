//! HTML sanitization utilities
//!
//! This module provides sanitizers for HTML content, helping prevent
//! XSS (Cross-Site Scripting) in submitted form fields, and the
//! [`HtmlPurifier`] forms use by default.

use super::{normalize_unicode, remove_control_chars, trim_whitespace, Purifier, SanitizeResult};
use crate::config::{FormConfig, DEFAULT_ALLOWED_ATTRIBUTES, DEFAULT_ALLOWED_TAGS};
use crate::errors::SanitizeError;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashSet;

lazy_static! {
    /// Script and style elements are dropped together with their content
    static ref SCRIPT_BLOCK_REGEX: Regex =
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap();
    static ref STYLE_BLOCK_REGEX: Regex =
        Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap();

    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();

    // Match HTML tags with attributes
    static ref TAG_ATTR_REGEX: Regex =
        Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)([^<>]*?)(/?)>").unwrap();

    // Match attributes within a tag
    static ref ATTR_REGEX: Regex = Regex::new(
        r#"([a-zA-Z][a-zA-Z0-9\-_]*)(?:\s*=\s*(?:(?:"([^"]*)")|(?:'([^']*)')|([^\s>]+)))?"#
    ).unwrap();

    // Named entities for markup characters plus decimal and hex character
    // references; browsers accept the latter without the trailing `;`
    static ref ENTITY_REGEX: Regex = Regex::new(
        r"&(?:#[xX]([0-9a-fA-F]{1,6});?|#([0-9]{1,7});?|(lt|gt|quot|amp|apos);)"
    ).unwrap();

    static ref SCRIPT_SCHEME_REGEX: Regex =
        Regex::new(r"(?i)javascript:|data:|vbscript:|expression\(|@import").unwrap();

    static ref DEFAULT_POLICY: HtmlPolicy = HtmlPolicy::default();
}

/// Tags and attributes that survive [`sanitize_html_with`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPolicy {
    tags: HashSet<String>,
    attributes: HashSet<String>,
}

impl HtmlPolicy {
    pub fn new<T, A, S>(tags: T, attributes: A) -> Self
    where
        T: IntoIterator<Item = S>,
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tags: tags.into_iter().map(|t| t.as_ref().to_lowercase()).collect(),
            attributes: attributes
                .into_iter()
                .map(|a| a.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn allows_attribute(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }
}

impl Default for HtmlPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_TAGS.iter(), DEFAULT_ALLOWED_ATTRIBUTES.iter())
    }
}

/// Encode HTML special characters to prevent XSS
pub fn encode_html_entities(input: &str) -> SanitizeResult<String> {
    let replacements = [
        ('&', "&amp;"), // Must be first to avoid double-encoding
        ('<', "&lt;"),
        ('>', "&gt;"),
        ('"', "&quot;"),
        ('\'', "&#39;"),
    ];

    let mut result = input.to_string();
    for (from, to) in &replacements {
        result = result.replace(*from, to);
    }

    if result == input {
        SanitizeResult::unmodified(result)
    } else {
        SanitizeResult::modified(result, Some("Encoded HTML entities".to_string()))
    }
}

/// Decode HTML entities to their original characters
///
/// Decodes in a single pass, so "&amp;lt;" becomes "&lt;" and not "<".
/// Character references that name no valid character decode to U+FFFD.
pub fn decode_html_entities(input: &str) -> SanitizeResult<String> {
    let result = ENTITY_REGEX
        .replace_all(input, |caps: &Captures| {
            if let Some(hex) = caps.get(1) {
                reference_char(u32::from_str_radix(hex.as_str(), 16).ok())
            } else if let Some(dec) = caps.get(2) {
                reference_char(dec.as_str().parse().ok())
            } else {
                match &caps[3] {
                    "lt" => "<",
                    "gt" => ">",
                    "quot" => "\"",
                    "apos" => "'",
                    _ => "&",
                }
                .to_string()
            }
        })
        .to_string();

    if result == input {
        SanitizeResult::unmodified(result)
    } else {
        SanitizeResult::modified(result, Some("Decoded HTML entities".to_string()))
    }
}

fn reference_char(code: Option<u32>) -> String {
    code.and_then(char::from_u32)
        .filter(|c| *c != '\0')
        .unwrap_or(char::REPLACEMENT_CHARACTER)
        .to_string()
}

/// Remove `<script>` and `<style>` elements including their content
pub fn remove_script_blocks(input: &str) -> SanitizeResult<String> {
    let without_scripts = SCRIPT_BLOCK_REGEX.replace_all(input, "");
    let result = STYLE_BLOCK_REGEX.replace_all(&without_scripts, "").to_string();

    if result == input {
        SanitizeResult::unmodified(input.to_string())
    } else {
        SanitizeResult::modified(result, Some("Removed script blocks".to_string()))
    }
}

/// Remove all HTML tags from the input string
pub fn strip_html_tags(input: &str) -> SanitizeResult<String> {
    let result = TAG_REGEX.replace_all(input, "").to_string();

    if result == input {
        SanitizeResult::unmodified(input.to_string())
    } else {
        SanitizeResult::modified(result, Some("Removed HTML tags".to_string()))
    }
}

/// Allow-list sanitization with the default tag and attribute policy
pub fn sanitize_html(input: &str) -> SanitizeResult<String> {
    sanitize_html_with(input, &DEFAULT_POLICY)
}

/// Keep only tags and attributes allowed by `policy`
///
/// Text between tags has stray `<` and `>` escaped so that dropped markup
/// cannot be reassembled into a tag.
pub fn sanitize_html_with(input: &str, policy: &HtmlPolicy) -> SanitizeResult<String> {
    let blocks_removed = remove_script_blocks(input);
    let source = blocks_removed.sanitized.as_str();

    let mut output = String::with_capacity(source.len());
    let mut last = 0;

    for caps in TAG_ATTR_REGEX.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        output.push_str(&escape_text(&source[last..whole.start()]));
        last = whole.end();

        let closing = &caps[1];
        let tag_name = caps[2].to_lowercase();
        if !policy.allows_tag(&tag_name) {
            continue;
        }

        if !closing.is_empty() {
            output.push_str("</");
            output.push_str(&tag_name);
            output.push('>');
            continue;
        }

        output.push('<');
        output.push_str(&tag_name);
        output.push_str(&filter_attributes(&caps[3], policy));
        output.push_str(&caps[4]);
        output.push('>');
    }
    output.push_str(&escape_text(&source[last..]));

    if output == input {
        SanitizeResult::unmodified(output)
    } else {
        SanitizeResult::modified(output, Some("Sanitized HTML content".to_string()))
    }
}

/// Completely strip all HTML-related content for maximum security
///
/// The result is plain text safe to embed in HTML: markup is removed,
/// existing entities are normalized and special characters re-encoded.
pub fn strict_html_sanitize(input: &str) -> SanitizeResult<String> {
    let blocks = remove_script_blocks(input);
    let stripped = strip_html_tags(&blocks.sanitized);
    let decoded = decode_html_entities(&stripped.sanitized);
    let neutralized = SCRIPT_SCHEME_REGEX
        .replace_all(&decoded.sanitized, "[removed]")
        .to_string();
    let encoded = encode_html_entities(&neutralized);

    if encoded.sanitized == input {
        SanitizeResult::unmodified(encoded.sanitized)
    } else {
        SanitizeResult::modified(
            encoded.sanitized,
            Some("Applied strict HTML sanitization".to_string()),
        )
    }
}

fn filter_attributes(attrs: &str, policy: &HtmlPolicy) -> String {
    let mut safe_attrs = String::new();

    for attr_caps in ATTR_REGEX.captures_iter(attrs) {
        let attr_name = attr_caps[1].to_lowercase();

        if attr_name.starts_with("on") || !policy.allows_attribute(&attr_name) {
            continue;
        }

        let raw_value = attr_caps
            .get(2)
            .or_else(|| attr_caps.get(3))
            .or_else(|| attr_caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or("");
        let attr_value = decode_html_entities(raw_value).sanitized;

        if (attr_name == "href" || attr_name == "src") && has_unsafe_scheme(&attr_value) {
            continue;
        }

        safe_attrs.push(' ');
        safe_attrs.push_str(&attr_name);

        if !attr_value.is_empty() {
            safe_attrs.push_str("=\"");
            safe_attrs.push_str(&escape_attribute(&attr_value));
            safe_attrs.push('"');
        }
    }

    safe_attrs
}

/// `value` must already be entity-decoded. An `&` left in the scheme part
/// is an entity this module does not decode (e.g. `&colon;`) and is unsafe.
fn has_unsafe_scheme(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_lowercase();

    let scheme_part = compact
        .split(|c: char| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or("");
    if scheme_part.contains('&') {
        return true;
    }

    ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|scheme| compact.starts_with(scheme))
}

fn escape_text(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Default purifier: control characters, Unicode normalization, trimming and
/// HTML filtering applied to every string inside a submitted value
#[derive(Debug, Clone)]
pub struct HtmlPurifier {
    config: FormConfig,
    policy: HtmlPolicy,
}

impl HtmlPurifier {
    pub fn new() -> Self {
        Self::from_config(FormConfig::default())
    }

    pub fn from_config(config: FormConfig) -> Self {
        let policy = HtmlPolicy::new(config.allowed_tags.iter(), config.allowed_attributes.iter());
        Self { config, policy }
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Sanitize a single string
    pub fn purify_str(&self, input: &str) -> Result<SanitizeResult<String>, SanitizeError> {
        if input.chars().count() > self.config.max_field_length {
            return Err(SanitizeError::TooLong {
                field: String::new(),
                max: self.config.max_field_length,
            });
        }

        let mut result = SanitizeResult::unmodified(input.to_string())
            .then(remove_control_chars)
            .then(normalize_unicode);

        if self.config.trim_whitespace {
            result = result.then(trim_whitespace);
        }

        result = if self.config.strip_all_html {
            result.then(strict_html_sanitize)
        } else {
            result.then(|s| sanitize_html_with(s, &self.policy))
        };

        Ok(result)
    }

    fn purify_at_depth(&self, value: &Value, depth: usize) -> Result<Value, SanitizeError> {
        match value {
            Value::String(s) => {
                let result = self.purify_str(s)?;
                if result.was_modified {
                    log::trace!(
                        "Purified string value: {}",
                        result.details.as_deref().unwrap_or("modified")
                    );
                }
                Ok(Value::String(result.sanitized))
            }
            Value::Array(items) => {
                self.check_depth(depth + 1)?;
                let cleaned = items
                    .iter()
                    .map(|item| self.purify_at_depth(item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(cleaned))
            }
            Value::Object(map) => {
                self.check_depth(depth + 1)?;
                let mut cleaned = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    cleaned.insert(key.clone(), self.purify_at_depth(item, depth + 1)?);
                }
                Ok(Value::Object(cleaned))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), SanitizeError> {
        if depth > self.config.max_depth {
            Err(SanitizeError::ExceededMaxDepth {
                field: String::new(),
                max: self.config.max_depth,
            })
        } else {
            Ok(())
        }
    }
}

impl Default for HtmlPurifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Purifier for HtmlPurifier {
    fn purify(&self, value: &Value) -> Result<Value, SanitizeError> {
        self.purify_at_depth(value, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_html_entities() {
        let input = "Test <script>alert('XSS')</script>";
        let result = encode_html_entities(input);

        assert!(result.was_modified);
        assert_eq!(
            result.sanitized,
            "Test &lt;script&gt;alert(&#39;XSS&#39;)&lt;/script&gt;"
        );

        let clean = "Plain text without special chars";
        let result = encode_html_entities(clean);
        assert!(!result.was_modified);
        assert_eq!(result.sanitized, clean);
    }

    #[test]
    fn test_decode_html_entities() {
        let input = "Test &lt;script&gt;alert(&quot;XSS&quot;)&lt;/script&gt;";
        let result = decode_html_entities(input);

        assert!(result.was_modified);
        assert_eq!(result.sanitized, "Test <script>alert(\"XSS\")</script>");

        // Escaped entities are decoded exactly once
        assert_eq!(decode_html_entities("&amp;lt;").sanitized, "&lt;");
        assert_eq!(decode_html_entities("&amp;#106;").sanitized, "&#106;");
    }

    #[test]
    fn test_decode_character_references() {
        assert_eq!(decode_html_entities("jav&#x61;script:").sanitized, "javascript:");
        assert_eq!(decode_html_entities("&#106;avascript:").sanitized, "javascript:");
        assert_eq!(decode_html_entities("&#X6A;&#97").sanitized, "ja");
        assert_eq!(decode_html_entities("&#39;&#x27;&apos;").sanitized, "'''");
        assert_eq!(decode_html_entities("&#0;&#xD800;").sanitized, "\u{FFFD}\u{FFFD}");

        let plain = decode_html_entities("R&D & more");
        assert!(!plain.was_modified);
        assert_eq!(plain.sanitized, "R&D & more");
    }

    #[test]
    fn test_strip_html_tags() {
        let input = "<p>Test <strong>bold</strong> text</p>";
        let result = strip_html_tags(input);

        assert!(result.was_modified);
        assert_eq!(result.sanitized, "Test bold text");

        let clean = "Plain text without HTML";
        assert!(!strip_html_tags(clean).was_modified);
    }

    #[test]
    fn test_sanitize_html() {
        let safe =
            "<p>Test <strong>bold</strong> text with <a href=\"https://example.com\">link</a></p>";
        let result = sanitize_html(safe);
        assert!(!result.was_modified);
        assert_eq!(result.sanitized, safe);

        let unsafe_tags = "<p>Test <script>alert('XSS')</script> code</p>";
        let result = sanitize_html(unsafe_tags);
        assert!(result.was_modified);
        assert_eq!(result.sanitized, "<p>Test  code</p>");

        let unsafe_attrs =
            "<p><a href=\"javascript:alert('XSS')\" onclick=\"evil()\">Bad Link</a></p>";
        let result = sanitize_html(unsafe_attrs);
        assert!(result.was_modified);
        assert_eq!(result.sanitized, "<p><a>Bad Link</a></p>");
    }

    #[test]
    fn test_sanitize_html_drops_entity_encoded_schemes() {
        for input in [
            "<a href=\"jav&#x61;script:alert(1)\">x</a>",
            "<a href=\"&#106;avascript:alert(1)\">x</a>",
            "<a href='&#x6A&#x61vascript:alert(1)'>x</a>",
            "<a href=\"javascript&colon;alert(1)\">x</a>",
        ] {
            let result = sanitize_html(input);
            assert!(result.was_modified, "{input}");
            assert_eq!(result.sanitized, "<a>x</a>", "{input}");
        }

        let result = sanitize_html("<img src=\"d&#97;ta:text/html;base64,PHNjcmlwdD4=\">");
        assert_eq!(result.sanitized, "<img>");

        let cleaned = HtmlPurifier::new()
            .purify(&json!("<a href=\"jav&#x61;script:alert(1)\">x</a>"))
            .unwrap();
        assert_eq!(cleaned, json!("<a>x</a>"));
    }

    #[test]
    fn test_sanitize_html_reencodes_attribute_values() {
        let kept = "<a href=\"/search?q=rust&amp;page=2\">next</a>";
        let result = sanitize_html(kept);
        assert!(!result.was_modified);
        assert_eq!(result.sanitized, kept);

        let result = sanitize_html("<a href=\"/search?q=rust&page=2\" title='a&#34;b'>next</a>");
        assert_eq!(
            result.sanitized,
            "<a href=\"/search?q=rust&amp;page=2\" title=\"a&quot;b\">next</a>"
        );
    }

    #[test]
    fn test_sanitize_html_escapes_leftover_brackets() {
        let result = sanitize_html("1 < 2 and <iframe src=\"x\"></iframe>done");
        assert!(result.was_modified);
        assert_eq!(result.sanitized, "1 &lt; 2 and done");
    }

    #[test]
    fn test_sanitize_html_with_custom_policy() {
        let policy = HtmlPolicy::new(["em"], ["title"]);
        let result = sanitize_html_with("<p><em title='x'>hi</em></p>", &policy);
        assert_eq!(result.sanitized, "<em title=\"x\">hi</em>");
    }

    #[test]
    fn test_strict_html_sanitize() {
        let input = "<p>Test <script>alert('XSS')</script> with javascript:alert('Evil')</p>";
        let result = strict_html_sanitize(input);

        assert!(result.was_modified);
        assert_eq!(result.sanitized, "Test  with [removed]alert(&#39;Evil&#39;)");

        let result = strict_html_sanitize("&#106;avascript:alert(1)");
        assert_eq!(result.sanitized, "[removed]alert(1)");

        // Encoded markup cannot come back as a live tag
        let result = strict_html_sanitize("&lt;b&gt;x&lt;/b&gt;");
        assert_eq!(result.sanitized, "&lt;b&gt;x&lt;/b&gt;");
        assert!(!result.was_modified);
    }

    #[test]
    fn test_purifier_handles_nested_values() {
        let purifier = HtmlPurifier::new();
        let value = json!({
            "title": "  <b>Rust</b><script>x()</script> ",
            "tags": ["<i>a</i>", 3, null, true],
        });

        let cleaned = purifier.purify(&value).unwrap();
        assert_eq!(
            cleaned,
            json!({
                "title": "<b>Rust</b>",
                "tags": ["<i>a</i>", 3, null, true],
            })
        );
    }

    #[test]
    fn test_purifier_strict_mode() {
        let purifier = HtmlPurifier::from_config(FormConfig::default().strict());
        let cleaned = purifier.purify(&json!("<p>Hello & welcome</p>")).unwrap();
        assert_eq!(cleaned, json!("Hello &amp; welcome"));
    }

    #[test]
    fn test_purifier_limits() {
        let purifier = HtmlPurifier::from_config(
            FormConfig::default()
                .with_max_field_length(5)
                .with_max_depth(1),
        );

        assert!(matches!(
            purifier.purify(&json!("too long")),
            Err(SanitizeError::TooLong { max: 5, .. })
        ));
        assert!(purifier.purify(&json!(["ok"])).is_ok());
        assert!(matches!(
            purifier.purify(&json!([["nested"]])),
            Err(SanitizeError::ExceededMaxDepth { max: 1, .. })
        ));
    }
}
