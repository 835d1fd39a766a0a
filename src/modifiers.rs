//! Modifier capability and built-in modifiers
//!
//! Modifiers are chainable `Value -> Value` transforms referenced after the
//! `|` of a token. The built-in modifiers operate on the string form of their
//! input, so `{{ price | upper }}` works on a float as well as on a string.

use crate::value::{SCALAR_TYPES, Value, ValueError};
use base64::Engine as _;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Bytes left as-is by [`UrlEncode`]: ASCII alphanumerics and `-_.`
const URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Capability contract every modifier implements
pub trait Modifier: Send + Sync {
    /// Transforms the in-flight value
    fn transform(&self, value: Value) -> Result<Value, ValueError>;

    /// Returns the declared input type label (documentation only)
    fn input_type(&self) -> &str {
        SCALAR_TYPES
    }

    /// Returns the declared output type label (documentation only)
    fn output_type(&self) -> &str;

    /// Returns human-readable documentation
    fn documentation(&self) -> &str {
        ""
    }
}

/// Converts the value to its string form
#[derive(Debug, Clone, Copy, Default)]
pub struct AsString;

impl Modifier for AsString {
    fn transform(&self, value: Value) -> Result<Value, ValueError> {
        Ok(Value::String(value.into_template_string()))
    }

    fn output_type(&self) -> &str {
        "string"
    }

    fn documentation(&self) -> &str {
        "Converts the value to string"
    }
}

/// Standard padded base64 of the string form
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64;

impl Modifier for Base64 {
    fn transform(&self, value: Value) -> Result<Value, ValueError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(value.into_template_string());
        Ok(Value::String(encoded))
    }

    fn output_type(&self) -> &str {
        "string"
    }

    fn documentation(&self) -> &str {
        "Encodes the value with standard padded base64 (RFC 4648)"
    }
}

/// Lowercases the string form
#[derive(Debug, Clone, Copy, Default)]
pub struct Lowercase;

impl Modifier for Lowercase {
    fn transform(&self, value: Value) -> Result<Value, ValueError> {
        Ok(Value::String(value.into_template_string().to_lowercase()))
    }

    fn output_type(&self) -> &str {
        "string"
    }

    fn documentation(&self) -> &str {
        "Converts the value to lowercase string"
    }
}

/// Uppercases the string form
#[derive(Debug, Clone, Copy, Default)]
pub struct Uppercase;

impl Modifier for Uppercase {
    fn transform(&self, value: Value) -> Result<Value, ValueError> {
        Ok(Value::String(value.into_template_string().to_uppercase()))
    }

    fn output_type(&self) -> &str {
        "string"
    }

    fn documentation(&self) -> &str {
        "Converts the value to uppercase string"
    }
}

/// Form encoding of the string form
///
/// Every byte except ASCII alphanumerics and `-_.` is percent-encoded and a
/// space becomes `+`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlEncode;

impl Modifier for UrlEncode {
    fn transform(&self, value: Value) -> Result<Value, ValueError> {
        let text = value.into_template_string();
        let encoded = utf8_percent_encode(&text, URL_ENCODE_SET)
            .to_string()
            .replace("%20", "+");
        Ok(Value::String(encoded))
    }

    fn output_type(&self) -> &str {
        "string"
    }

    fn documentation(&self) -> &str {
        "Encodes the value for safe use in URLs using standard URL encoding."
    }
}

/// Escapes a string for use inside a JSON string literal
///
/// The surrounding quotes are not added. Non-string values pass through
/// unchanged, which makes this modifier suitable as the final-string
/// modifier of an engine producing JSON bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSubString;

impl Modifier for JsonSubString {
    fn transform(&self, value: Value) -> Result<Value, ValueError> {
        match value {
            Value::String(text) => {
                let quoted = serde_json::Value::String(text).to_string();
                let inner = quoted
                    .strip_prefix('"')
                    .and_then(|rest| rest.strip_suffix('"'))
                    .unwrap_or(&quoted);
                Ok(Value::String(inner.to_string()))
            }
            other => Ok(other),
        }
    }

    fn output_type(&self) -> &str {
        SCALAR_TYPES
    }

    fn documentation(&self) -> &str {
        "Escapes the value for safe inclusion inside a JSON string"
    }
}

/// Modifier backed by a closure
pub struct FnModifier {
    transform: Box<dyn Fn(Value) -> Value + Send + Sync>,
    input_type: String,
    output_type: String,
    documentation: String,
}

impl FnModifier {
    /// Creates a modifier accepting any scalar
    pub fn new<F>(transform: F, output_type: impl Into<String>) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self {
            transform: Box::new(transform),
            input_type: SCALAR_TYPES.to_string(),
            output_type: output_type.into(),
            documentation: String::new(),
        }
    }

    /// Sets the declared input type label
    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = input_type.into();
        self
    }

    /// Sets the documentation text
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }
}

impl std::fmt::Debug for FnModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnModifier")
            .field("input_type", &self.input_type)
            .field("output_type", &self.output_type)
            .finish_non_exhaustive()
    }
}

impl Modifier for FnModifier {
    fn transform(&self, value: Value) -> Result<Value, ValueError> {
        Ok((self.transform)(value))
    }

    fn input_type(&self) -> &str {
        &self.input_type
    }

    fn output_type(&self) -> &str {
        &self.output_type
    }

    fn documentation(&self) -> &str {
        &self.documentation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(modifier: &dyn Modifier, value: impl Into<Value>) -> Value {
        modifier.transform(value.into()).unwrap()
    }

    #[test]
    fn test_as_string() {
        assert_eq!(apply(&AsString, 2.75), Value::from("2.75"));
        assert_eq!(apply(&AsString, 10), Value::from("10"));
        assert_eq!(apply(&AsString, true), Value::from("1"));
        assert_eq!(apply(&AsString, Value::Null), Value::from(""));
        assert_eq!(AsString.input_type(), "string|int|float|bool|null");
        assert_eq!(AsString.output_type(), "string");
    }

    #[test]
    fn test_base64() {
        assert_eq!(apply(&Base64, "orange"), Value::from("b3Jhbmdl"));
        assert_eq!(apply(&Base64, "ab"), Value::from("YWI="));
        assert_eq!(apply(&Base64, Value::Null), Value::from(""));
    }

    #[test]
    fn test_case_conversion_is_unicode_aware() {
        assert_eq!(apply(&Uppercase, "gagarin@cosmos.ru"), Value::from("GAGARIN@COSMOS.RU"));
        assert_eq!(apply(&Lowercase, "ГАГАРИН"), Value::from("гагарин"));
        assert_eq!(apply(&Uppercase, 1.5), Value::from("1.5"));
    }

    #[test]
    fn test_url_encode() {
        assert_eq!(apply(&UrlEncode, "a b&c=d/é"), Value::from("a+b%26c%3Dd%2F%C3%A9"));
        assert_eq!(apply(&UrlEncode, "plain-text_1.2"), Value::from("plain-text_1.2"));
        assert_eq!(apply(&UrlEncode, "a*b~c"), Value::from("a%2Ab%7Ec"));
        assert_eq!(apply(&UrlEncode, "x+y 100%"), Value::from("x%2By+100%25"));
    }

    #[test]
    fn test_json_sub_string_escapes() {
        assert_eq!(
            apply(&JsonSubString, "say \"hi\"\n\\ ok"),
            Value::from(r#"say \"hi\"\n\\ ok"#)
        );
        assert_eq!(apply(&JsonSubString, "a/b ü"), Value::from("a/b ü"));
    }

    #[test]
    fn test_json_sub_string_passes_non_strings() {
        assert_eq!(apply(&JsonSubString, 3), Value::Integer(3));
        assert_eq!(apply(&JsonSubString, Value::Null), Value::Null);
        assert_eq!(apply(&JsonSubString, false), Value::Boolean(false));
        assert_eq!(JsonSubString.output_type(), SCALAR_TYPES);
    }

    #[test]
    fn test_fn_modifier() {
        let reverse = FnModifier::new(
            |value: Value| Value::String(value.into_template_string().chars().rev().collect()),
            "string",
        )
        .with_input_type("string")
        .with_documentation("Reverses the string form");

        assert_eq!(apply(&reverse, "abc"), Value::from("cba"));
        assert_eq!(reverse.input_type(), "string");
        assert_eq!(reverse.output_type(), "string");
        assert_eq!(reverse.documentation(), "Reverses the string form");
    }

    #[test]
    fn test_documentation_texts() {
        assert_eq!(Lowercase.documentation(), "Converts the value to lowercase string");
        assert_eq!(
            UrlEncode.documentation(),
            "Encodes the value for safe use in URLs using standard URL encoding."
        );
    }
}
