//! Template engine: registration, resolution, validation and documentation
//!
//! An engine is configured once and then used read-only:
//!
//! ```rust
//! use templa::{Constant, TemplaEngine, Uppercase, Value};
//!
//! let mut engine = TemplaEngine::new();
//! engine
//!     .add_macro("fruit", Constant::new("orange", "string"))
//!     .add_modifier("upper", Uppercase);
//!
//! assert_eq!(engine.resolve_str("{{ fruit | upper }}"), Value::from("ORANGE"));
//! assert_eq!(engine.resolve_str("I like {{ fruit }}s"), Value::from("I like oranges"));
//! ```

use crate::deserializer::from_node;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
use crate::doc::{Documentation, MacroDoc, ModifierDoc};
use crate::error::{Errors, PathSegment, TemplaError, Valid, ValidationError};
use crate::macros::{Invocation, Macro, Nothing};
use crate::modifiers::Modifier;
use crate::node::Node;
use crate::registry::Registry;
use crate::token::{self, Token};
use crate::value::Value;
use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use std::fmt;

const FINAL_STRING_MODIFIER: &str = "final_string_modifier";

/// Macro-substitution engine
pub struct TemplaEngine {
    macros: Registry<dyn Macro>,
    modifiers: Registry<dyn Modifier>,
    not_found_macro: Box<dyn Macro>,
    final_string_modifier: Option<Box<dyn Modifier>>,
    sink: Box<dyn DiagnosticSink>,
}

/// Builder for engines with non-default collaborators
#[derive(Default)]
pub struct EngineBuilder {
    not_found_macro: Option<Box<dyn Macro>>,
    final_string_modifier: Option<Box<dyn Modifier>>,
    sink: Option<Box<dyn DiagnosticSink>>,
}

impl EngineBuilder {
    /// Creates a builder with every collaborator at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the modifier applied last to every string result
    pub fn with_final_string_modifier(mut self, modifier: impl Modifier + 'static) -> Self {
        self.final_string_modifier = Some(Box::new(modifier));
        self
    }

    /// Sets the macro used for names missing from the registry
    pub fn with_not_found_macro(mut self, fallback: impl Macro + 'static) -> Self {
        self.not_found_macro = Some(Box::new(fallback));
        self
    }

    /// Sets the receiver of resolution warnings
    pub fn with_diagnostic_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Builds an engine with empty registries
    pub fn build(self) -> TemplaEngine {
        TemplaEngine {
            macros: Registry::new("macro"),
            modifiers: Registry::new("modifier"),
            not_found_macro: self.not_found_macro.unwrap_or_else(|| Box::new(Nothing)),
            final_string_modifier: self.final_string_modifier,
            sink: self.sink.unwrap_or_else(|| Box::new(TracingSink)),
        }
    }
}

impl TemplaEngine {
    /// Creates an engine with the default collaborators
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    /// Creates a builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Registers a macro under `name`
    ///
    /// # Panics
    ///
    /// Panics with `duplicate macro name: <name>` if the name is taken.
    pub fn add_macro(
        &mut self,
        name: impl Into<String>,
        item: impl Macro + 'static,
    ) -> &mut Self {
        self.macros.insert(name.into(), Box::new(item));
        self
    }

    /// Registers a modifier under `name`
    ///
    /// # Panics
    ///
    /// Panics with `duplicate modifier name: <name>` if the name is taken.
    pub fn add_modifier(
        &mut self,
        name: impl Into<String>,
        item: impl Modifier + 'static,
    ) -> &mut Self {
        self.modifiers.insert(name.into(), Box::new(item));
        self
    }

    /// Returns the registered macro names in registration order
    pub fn macro_names(&self) -> Vec<&str> {
        self.macros.names().collect()
    }

    /// Returns the registered modifier names in registration order
    pub fn modifier_names(&self) -> Vec<&str> {
        self.modifiers.names().collect()
    }

    /// Returns true if a macro is registered under `name`
    pub fn has_macro(&self, name: &str) -> bool {
        self.macros.contains(name)
    }

    /// Returns true if a modifier is registered under `name`
    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.contains(name)
    }

    /// Resolves a template string
    ///
    /// A template made of exactly one token yields the pipeline result in its
    /// native type. Otherwise every token is replaced by the string form of
    /// its result and a [`Value::String`] is returned.
    pub fn resolve_str(&self, template: &str) -> Value {
        if let Some(token) = token::match_whole(template) {
            return self.resolve_token(&token);
        }
        let rendered = token::substitute(template, |token| {
            self.resolve_token(token).into_template_string()
        });
        Value::String(rendered.into_owned())
    }

    /// Resolves every string leaf of a structure
    ///
    /// Map keys and non-string leaves are copied unchanged.
    pub fn resolve_node(&self, node: &Node) -> Node {
        match node {
            Node::Value(Value::String(template)) => Node::Value(self.resolve_str(template)),
            Node::Value(value) => Node::Value(value.clone()),
            Node::Map(map) => Node::Map(
                map.iter()
                    .map(|(key, child)| (key.clone(), self.resolve_node(child)))
                    .collect(),
            ),
            Node::List(list) => {
                Node::List(list.iter().map(|child| self.resolve_node(child)).collect())
            }
        }
    }

    /// Validates every token of a string against the registered macros
    ///
    /// Each parameter error is reported with the macro name as its path. The
    /// `required` names are checked only when no other error was found; the
    /// first missing one is reported alone.
    pub fn validate_str(&self, template: &str, required: &[&str]) -> Result<Valid, Errors> {
        let mut errors = Vec::new();
        let mut used = IndexSet::new();
        self.check_str(template, &mut errors, &mut used);
        finish_validation(errors, used, required)
    }

    /// Validates every string leaf of a structure
    ///
    /// Error paths start at the root: `{"a": {"b": "{{ x: bad }}"}}` reports
    /// `a.b.x`. List positions appear as index segments.
    pub fn validate_node(&self, node: &Node, required: &[&str]) -> Result<Valid, Errors> {
        let mut used = IndexSet::new();
        let errors = self.check_node(node, &mut used);
        finish_validation(errors, used, required)
    }

    /// Returns a snapshot of the registries
    pub fn documentation(&self) -> Documentation {
        Documentation {
            macros: self
                .macros
                .iter()
                .map(|(name, item)| MacroDoc::describe(name, item))
                .collect(),
            modifiers: self
                .modifiers
                .iter()
                .map(|(name, item)| ModifierDoc::describe(name, item))
                .collect(),
        }
    }

    /// Validates, resolves and deserializes a structure into `T`
    pub fn render<T>(&self, node: &Node, required: &[&str]) -> Result<T, TemplaError>
    where
        T: DeserializeOwned,
    {
        self.validate_node(node, required)?;
        from_node(self.resolve_node(node))
    }

    fn lookup(&self, name: &str) -> &dyn Macro {
        self.macros
            .get(name)
            .unwrap_or_else(|| &*self.not_found_macro)
    }

    fn resolve_token(&self, token: &Token<'_>) -> Value {
        let invocation = Invocation {
            parameter: token.parameter,
            name: token.name,
            token: token.raw,
        };

        let mut value = match self.lookup(token.name).resolve(&invocation) {
            Ok(value) => value,
            Err(err) => {
                self.warn(
                    Diagnostic::new(
                        DiagnosticKind::OutOfDomainValue,
                        "macro produced a value outside string|int|float|bool|null",
                    )
                    .with_context("macro", token.raw)
                    .with_context("found", err.found()),
                );
                Value::Null
            }
        };

        for step in token.modifier_steps() {
            if step.optional && value.is_null() {
                continue;
            }
            match self.modifiers.get(step.name) {
                Some(modifier) => value = self.apply(modifier, value, token, step.name),
                None => self.warn(
                    Diagnostic::new(
                        DiagnosticKind::ModifierNotFound,
                        format!("modifier not found: {}", step.name),
                    )
                    .with_context("macro", token.raw)
                    .with_context("modifier", step.name),
                ),
            }
        }

        match &self.final_string_modifier {
            Some(modifier) if value.is_string() => {
                self.apply(&**modifier, value, token, FINAL_STRING_MODIFIER)
            }
            _ => value,
        }
    }

    fn apply(
        &self,
        modifier: &dyn Modifier,
        value: Value,
        token: &Token<'_>,
        name: &str,
    ) -> Value {
        modifier.transform(value).unwrap_or_else(|err| {
            self.warn(
                Diagnostic::new(
                    DiagnosticKind::OutOfDomainValue,
                    "modifier produced a value outside string|int|float|bool|null",
                )
                .with_context("macro", token.raw)
                .with_context("modifier", name)
                .with_context("found", err.found()),
            );
            Value::Null
        })
    }

    fn check_str(
        &self,
        template: &str,
        errors: &mut Vec<ValidationError>,
        used: &mut IndexSet<String>,
    ) {
        for token in token::scan(template) {
            if let Err(error) = self.lookup(token.name).validate_parameter(token.parameter) {
                errors.push(error.with_path([token.name].into_iter().collect()));
            }
            used.insert(token.name.to_string());
        }
    }

    fn check_node(&self, node: &Node, used: &mut IndexSet<String>) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match node {
            Node::Value(Value::String(template)) => self.check_str(template, &mut errors, used),
            Node::Value(_) => {}
            Node::Map(map) => {
                for (key, child) in map {
                    self.check_child(child, PathSegment::from(key.as_str()), &mut errors, used);
                }
            }
            Node::List(list) => {
                for (index, child) in list.iter().enumerate() {
                    self.check_child(child, PathSegment::Index(index), &mut errors, used);
                }
            }
        }
        errors
    }

    fn check_child(
        &self,
        child: &Node,
        segment: PathSegment,
        errors: &mut Vec<ValidationError>,
        used: &mut IndexSet<String>,
    ) {
        for mut error in self.check_node(child, used) {
            error.prepend(segment.clone());
            errors.push(error);
        }
    }

    fn warn(&self, diagnostic: Diagnostic) {
        self.sink.warn(&diagnostic);
    }
}

fn finish_validation(
    errors: Vec<ValidationError>,
    used: IndexSet<String>,
    required: &[&str],
) -> Result<Valid, Errors> {
    if let Some(errors) = Errors::from_vec(errors) {
        return Err(errors);
    }
    if let Some(missing) = required.iter().find(|name| !used.contains(**name)) {
        return Err(Errors::one(format!("required macro: {} not found", missing)));
    }
    Ok(Valid::new(used))
}

impl Default for TemplaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplaEngine")
            .field("macros", &self.macro_names())
            .field("modifiers", &self.modifier_names())
            .field("not_found_macro", &self.not_found_macro.output_type())
            .field("final_string_modifier", &self.final_string_modifier.is_some())
            .finish_non_exhaustive()
    }
}
