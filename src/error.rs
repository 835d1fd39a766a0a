//! Error types and path tracking for template validation
//!
//! Validation never fails by unwinding: problems are collected as
//! [`ValidationError`]s carrying the [`Path`] from the root structure down to
//! the offending macro, and returned together as [`Errors`]. A clean pass
//! returns [`Valid`] with the names of every macro that was referenced.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

/// One step of a path: a map key, a list index, or a macro name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl PartialEq<str> for PathSegment {
    fn eq(&self, other: &str) -> bool {
        matches!(self, PathSegment::Key(key) if key == other)
    }
}

impl PartialEq<&str> for PathSegment {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<usize> for PathSegment {
    fn eq(&self, other: &usize) -> bool {
        matches!(self, PathSegment::Index(index) if index == other)
    }
}

/// Ordered key chain, read outer-to-inner
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path(SmallVec<[PathSegment; 4]>);

impl Path {
    /// Creates an empty path
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends an ancestor segment
    pub fn push_front(&mut self, segment: impl Into<PathSegment>) {
        self.0.insert(0, segment.into());
    }

    /// Appends a descendant segment
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Returns a copy of the path extended by one descendant segment
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Returns the segments, outermost first
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns the number of segments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the path has no segments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the segments, outermost first
    pub fn iter(&self) -> std::slice::Iter<'_, PathSegment> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
            }
        }
        Ok(())
    }
}

impl<S> FromIterator<S> for Path
where
    S: Into<PathSegment>,
{
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A single validation failure located by its path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
    path: Path,
}

impl ValidationError {
    /// Creates an error with an empty path
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Path::new(),
        }
    }

    /// Replaces the path of the error
    pub fn with_path(mut self, path: Path) -> Self {
        self.path = path;
        self
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the location of the error
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prepends an ancestor key while unwinding a nested structure
    pub fn prepend(&mut self, segment: impl Into<PathSegment>) {
        self.path.push_front(segment);
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Non-empty collection of validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} validation error(s): {}", .errors.len(), join_errors(.errors))]
pub struct Errors {
    errors: Vec<ValidationError>,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Errors {
    /// Creates a collection holding exactly one error
    pub fn one(error: impl Into<ValidationError>) -> Self {
        Self {
            errors: vec![error.into()],
        }
    }

    /// Creates a collection from a vector, or `None` when it is empty
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Returns the collected errors in discovery order
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Returns the first error
    pub fn first(&self) -> &ValidationError {
        // Constructors guarantee at least one element
        &self.errors[0]
    }

    /// Returns the number of errors (always at least one)
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over the errors
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Consumes the collection and returns the errors
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl From<&str> for ValidationError {
    fn from(message: &str) -> Self {
        ValidationError::new(message)
    }
}

impl From<String> for ValidationError {
    fn from(message: String) -> Self {
        ValidationError::new(message)
    }
}

impl TryFrom<Vec<ValidationError>> for Errors {
    type Error = Vec<ValidationError>;

    fn try_from(errors: Vec<ValidationError>) -> Result<Self, Self::Error> {
        if errors.is_empty() {
            Err(errors)
        } else {
            Ok(Self { errors })
        }
    }
}

impl IntoIterator for Errors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Successful validation carrying every distinct macro name referenced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Valid {
    used_macros: IndexSet<String>,
}

impl Valid {
    /// Creates a result from the set of referenced macro names
    pub fn new(used_macros: IndexSet<String>) -> Self {
        Self { used_macros }
    }

    /// Returns the referenced macro names in first-occurrence order
    pub fn used_macros(&self) -> &IndexSet<String> {
        &self.used_macros
    }

    /// Returns true if the macro was referenced at least once
    pub fn uses(&self, name: &str) -> bool {
        self.used_macros.contains(name)
    }

    /// Consumes the result and returns the referenced names
    pub fn into_used_macros(self) -> IndexSet<String> {
        self.used_macros
    }
}

/// Main error type for typed template rendering
#[derive(Debug, Error)]
pub enum TemplaError {
    /// The template did not pass validation
    #[error("Validation error: {0}")]
    Validation(#[from] Errors),

    /// The resolved structure did not match the requested type
    #[error("Serde error: {0}")]
    Serde(#[from] SerdeError),
}

/// Serde integration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeError {
    /// Custom serde error message
    #[error("{0}")]
    Custom(String),

    /// Error raised while deserializing a nested node
    #[error("{message} at {path}")]
    AtPath { message: String, path: Path },
}

impl SerdeError {
    /// Attaches the node path to an error that does not have one yet
    pub fn at(self, path: &Path) -> Self {
        match self {
            SerdeError::Custom(message) if !path.is_empty() => SerdeError::AtPath {
                message,
                path: path.clone(),
            },
            other => other,
        }
    }
}

impl serde::de::Error for SerdeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}

impl serde::de::Error for TemplaError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        TemplaError::Serde(SerdeError::Custom(msg.to_string()))
    }
}
