//! Macro capability and built-in macros
//!
//! A macro is a named producer of a [`Value`]. The engine owns every macro it
//! knows about and only talks to it through the [`Macro`] trait: resolving a
//! value for a token, validating the token's parameter, and describing itself
//! for the documentation snapshot.

use crate::error::ValidationError;
use crate::value::{Value, ValueError};

/// Everything a macro learns about the token being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Trimmed parameter after `:`, if any
    pub parameter: Option<&'a str>,
    /// Name the macro was referenced by
    pub name: &'a str,
    /// Full matched token text, braces included
    pub token: &'a str,
}

/// Capability contract every macro implements
pub trait Macro: Send + Sync {
    /// Returns whether the macro accepts a parameter
    fn has_parameter(&self) -> bool;

    /// Returns the permitted parameter values, or `None` when unrestricted
    fn allowed_parameter_values(&self) -> Option<&[String]> {
        None
    }

    /// Produces the value for one token occurrence
    fn resolve(&self, invocation: &Invocation<'_>) -> Result<Value, ValueError>;

    /// Checks the raw parameter of a token without producing a value
    fn validate_parameter(&self, parameter: Option<&str>) -> Result<(), ValidationError>;

    /// Returns human-readable documentation
    fn documentation(&self) -> &str {
        ""
    }

    /// Returns the label of the produced type, e.g. `string|null`
    fn output_type(&self) -> &str;
}

/// Parameter rules shared by the built-in macros
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParameterPolicy {
    /// Only a token without parameter is valid
    #[default]
    NotAllowed,
    /// The parameter must be one of the listed values
    AllowOnly(Vec<String>),
    /// Any parameter, or none, is valid
    Any,
}

impl ParameterPolicy {
    /// Creates an allow-list policy
    pub fn allow_only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParameterPolicy::AllowOnly(values.into_iter().map(Into::into).collect())
    }

    /// Returns whether a parameter may be given at all
    pub fn accepts_parameter(&self) -> bool {
        !matches!(self, ParameterPolicy::NotAllowed)
    }

    /// Returns the allow-list, if any
    pub fn allowed_values(&self) -> Option<&[String]> {
        match self {
            ParameterPolicy::AllowOnly(values) => Some(values),
            _ => None,
        }
    }

    /// Validates a raw parameter against the policy
    pub fn validate(&self, parameter: Option<&str>) -> Result<(), ValidationError> {
        match (self, parameter) {
            (ParameterPolicy::Any, _) | (ParameterPolicy::NotAllowed, None) => Ok(()),
            (ParameterPolicy::NotAllowed, Some(_)) => {
                Err(ValidationError::new("param not allowed"))
            }
            (ParameterPolicy::AllowOnly(values), _) if values.is_empty() => {
                Err(ValidationError::new("there are no available parameters"))
            }
            (ParameterPolicy::AllowOnly(values), Some(p)) if values.iter().any(|v| v == p) => {
                Ok(())
            }
            (ParameterPolicy::AllowOnly(values), p) => Err(ValidationError::new(format!(
                "invalid param `{}`, allowed only: `{}`",
                p.unwrap_or_default(),
                values.join("`, `")
            ))),
        }
    }
}

/// Producer signature for lazily computed macros
///
/// The result is checked at resolution time: arrays and objects are outside
/// the scalar domain.
pub type Producer = Box<dyn Fn(&Invocation<'_>) -> serde_json::Value + Send + Sync>;

/// Macro returning a fixed value
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    value: Value,
    output_type: String,
    documentation: String,
}

impl Constant {
    /// Creates a constant macro
    pub fn new(value: impl Into<Value>, output_type: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            output_type: output_type.into(),
            documentation: String::new(),
        }
    }

    /// Sets the documentation text
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }
}

impl Macro for Constant {
    fn has_parameter(&self) -> bool {
        false
    }

    fn resolve(&self, _invocation: &Invocation<'_>) -> Result<Value, ValueError> {
        Ok(self.value.clone())
    }

    fn validate_parameter(&self, parameter: Option<&str>) -> Result<(), ValidationError> {
        ParameterPolicy::NotAllowed.validate(parameter)
    }

    fn documentation(&self) -> &str {
        &self.documentation
    }

    fn output_type(&self) -> &str {
        &self.output_type
    }
}

/// Macro computing its value on every resolution
pub struct LazyLoad {
    producer: Producer,
    output_type: String,
    documentation: String,
    parameters: ParameterPolicy,
}

impl LazyLoad {
    /// Creates a lazy macro that accepts no parameter
    pub fn new<F>(producer: F, output_type: impl Into<String>) -> Self
    where
        F: Fn(&Invocation<'_>) -> serde_json::Value + Send + Sync + 'static,
    {
        Self {
            producer: Box::new(producer),
            output_type: output_type.into(),
            documentation: String::new(),
            parameters: ParameterPolicy::NotAllowed,
        }
    }

    /// Sets the documentation text
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Sets the parameter policy
    pub fn with_parameters(mut self, parameters: ParameterPolicy) -> Self {
        self.parameters = parameters;
        self
    }
}

impl std::fmt::Debug for LazyLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyLoad")
            .field("output_type", &self.output_type)
            .field("documentation", &self.documentation)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl Macro for LazyLoad {
    fn has_parameter(&self) -> bool {
        self.parameters.accepts_parameter()
    }

    fn allowed_parameter_values(&self) -> Option<&[String]> {
        self.parameters.allowed_values()
    }

    fn resolve(&self, invocation: &Invocation<'_>) -> Result<Value, ValueError> {
        Value::try_from((self.producer)(invocation))
    }

    fn validate_parameter(&self, parameter: Option<&str>) -> Result<(), ValidationError> {
        self.parameters.validate(parameter)
    }

    fn documentation(&self) -> &str {
        &self.documentation
    }

    fn output_type(&self) -> &str {
        &self.output_type
    }
}

/// Where a [`ConstantOrLazyLoad`] takes its value from
pub enum Source {
    Constant(Value),
    Lazy(Producer),
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Source::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Macro backed by either a fixed value or a producer, chosen at construction
#[derive(Debug)]
pub struct ConstantOrLazyLoad {
    source: Source,
    output_type: String,
    documentation: String,
}

impl ConstantOrLazyLoad {
    /// Creates the macro from a fixed value
    pub fn constant(value: impl Into<Value>, output_type: impl Into<String>) -> Self {
        Self {
            source: Source::Constant(value.into()),
            output_type: output_type.into(),
            documentation: String::new(),
        }
    }

    /// Creates the macro from a producer
    pub fn lazy<F>(producer: F, output_type: impl Into<String>) -> Self
    where
        F: Fn(&Invocation<'_>) -> serde_json::Value + Send + Sync + 'static,
    {
        Self {
            source: Source::Lazy(Box::new(producer)),
            output_type: output_type.into(),
            documentation: String::new(),
        }
    }

    /// Sets the documentation text
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Returns true if the value is computed on resolution
    pub fn is_lazy(&self) -> bool {
        matches!(self.source, Source::Lazy(_))
    }
}

impl Macro for ConstantOrLazyLoad {
    fn has_parameter(&self) -> bool {
        false
    }

    fn resolve(&self, invocation: &Invocation<'_>) -> Result<Value, ValueError> {
        match &self.source {
            Source::Constant(value) => Ok(value.clone()),
            Source::Lazy(producer) => Value::try_from(producer(invocation)),
        }
    }

    fn validate_parameter(&self, parameter: Option<&str>) -> Result<(), ValidationError> {
        ParameterPolicy::NotAllowed.validate(parameter)
    }

    fn documentation(&self) -> &str {
        &self.documentation
    }

    fn output_type(&self) -> &str {
        &self.output_type
    }
}

/// Passthrough macro echoing the raw token text
///
/// This is the default stand-in for names missing from the registry, which
/// leaves unknown tokens in the output exactly as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nothing;

impl Macro for Nothing {
    fn has_parameter(&self) -> bool {
        true
    }

    fn resolve(&self, invocation: &Invocation<'_>) -> Result<Value, ValueError> {
        Ok(Value::from(invocation.token))
    }

    fn validate_parameter(&self, _parameter: Option<&str>) -> Result<(), ValidationError> {
        Ok(())
    }

    fn documentation(&self) -> &str {
        "No modification; uses the macro as-is."
    }

    fn output_type(&self) -> &str {
        "string"
    }
}
