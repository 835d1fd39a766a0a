//! # Templa
//!
//! A macro-substitution engine for `{{ name }}` placeholders in strings and
//! nested structures.
//!
//! ## Overview
//!
//! Callers register named **macros** (producers of scalar values) and
//! **modifiers** (chainable value transforms) on a [`TemplaEngine`], then
//! resolve templates against them. A template that is exactly one token keeps
//! the native type of the result, so a JSON body template can yield numbers,
//! booleans and nulls; tokens embedded in text are replaced by their string
//! form.
//!
//! ## Token Syntax
//!
//! ```text
//! {{ name }}                        plain macro
//! {{ name: param }}                 macro with a parameter
//! {{ name | modifier | modifier }}  modifier chain, applied left to right
//! {{ name | ?modifier }}            optional step, skipped when the value is null
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use templa::{AsString, Base64, Constant, Node, TemplaEngine, Value};
//!
//! let mut engine = TemplaEngine::new();
//! engine
//!     .add_macro("fruit", Constant::new("orange", "string"))
//!     .add_macro("price", Constant::new(2.5, "float"))
//!     .add_modifier("string", AsString)
//!     .add_modifier("base64", Base64);
//!
//! // Whole-token templates keep the native type
//! assert_eq!(engine.resolve_str("{{ price }}"), Value::Float(2.5));
//! assert_eq!(engine.resolve_str("{{ price | string }}"), Value::from("2.5"));
//!
//! // Embedded tokens are interpolated
//! assert_eq!(engine.resolve_str("{{ price }} USD"), Value::from("2.5 USD"));
//!
//! let template = Node::from(serde_json::json!({
//!     "item": {"name": "{{ fruit }}", "code": "{{ fruit | base64 }}"},
//! }));
//! let resolved = serde_json::Value::from(engine.resolve_node(&template));
//! assert_eq!(resolved["item"]["code"], "b3Jhbmdl");
//! ```
//!
//! ## Validation
//!
//! Validation checks token parameters without producing values and reports
//! every problem with its path from the root of the structure:
//!
//! ```rust
//! use templa::{Constant, Node, TemplaEngine};
//!
//! let mut engine = TemplaEngine::new();
//! engine.add_macro("fruit", Constant::new("orange", "string"));
//!
//! let template = Node::from(serde_json::json!({"a": {"b": "{{ fruit: big }}"}}));
//! let errors = engine.validate_node(&template, &[]).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors.first().to_string(), "a.b.fruit: param not allowed");
//!
//! let valid = engine
//!     .validate_str("{{ fruit }} and {{ fruit }}", &["fruit"])
//!     .unwrap();
//! assert_eq!(valid.used_macros().len(), 1);
//! ```
//!
//! ## Diagnostics
//!
//! Resolution never fails. Unknown modifiers and out-of-domain producer
//! results are reported to a [`DiagnosticSink`] (by default through
//! `tracing`) and the value degrades gracefully:
//!
//! ```rust
//! use templa::{Constant, MemorySink, TemplaEngine, Value};
//!
//! let sink = MemorySink::new();
//! let mut engine = TemplaEngine::builder()
//!     .with_diagnostic_sink(sink.clone())
//!     .build();
//! engine.add_macro("fruit", Constant::new("orange", "string"));
//!
//! assert_eq!(engine.resolve_str("{{ fruit | nosuch }}"), Value::from("orange"));
//! assert_eq!(sink.diagnostics()[0].message, "modifier not found: nosuch");
//! ```
//!
//! ## Documentation Snapshot
//!
//! [`TemplaEngine::documentation`] describes every registered macro and
//! modifier; the result serializes to JSON for help pages and editors.

pub mod deserializer;
pub mod diagnostics;
pub mod doc;
pub mod engine;
pub mod error;
pub mod macros;
pub mod modifiers;
pub mod node;
mod registry;
pub mod token;
pub mod value;

#[cfg(test)]
mod engine_tests;

// Re-export main types and functions
pub use deserializer::{NodeDeserializer, from_node};
pub use engine::{EngineBuilder, TemplaEngine};
pub use error::{Errors, Path, PathSegment, SerdeError, TemplaError, Valid, ValidationError};
pub use node::{Node, NodeMap};
pub use value::{SCALAR_TYPES, Value, ValueError};

// Re-export capability contracts and built-ins
pub use macros::{
    Constant, ConstantOrLazyLoad, Invocation, LazyLoad, Macro, Nothing, ParameterPolicy,
};
pub use modifiers::{
    AsString, Base64, FnModifier, JsonSubString, Lowercase, Modifier, UrlEncode, Uppercase,
};

// Re-export diagnostics and documentation types
pub use diagnostics::{
    Diagnostic, DiagnosticKind, DiagnosticSink, MemorySink, NullSink, TracingSink,
};
pub use doc::{Documentation, MacroDoc, MacroParam, ModifierDoc};
