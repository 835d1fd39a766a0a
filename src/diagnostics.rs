//! Warning side channel for soft resolution failures
//!
//! Resolution never fails. When a producer yields an out-of-domain value or a
//! modifier chain names an unknown modifier, the engine degrades the result
//! and reports a [`Diagnostic`] to its [`DiagnosticSink`]. The default sink
//! forwards to `tracing`; [`MemorySink`] keeps diagnostics for inspection.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Module tag attached to every diagnostic emitted by the engine
pub const MODULE: &str = "templa";

/// Kind of soft failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A macro or modifier produced a value outside the scalar domain
    OutOfDomainValue,
    /// A modifier chain referenced an unregistered modifier
    ModifierNotFound,
}

/// A warning with structured context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub context: Vec<(&'static str, String)>,
    pub module: &'static str,
}

impl Diagnostic {
    /// Creates a diagnostic tagged with the engine module
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::new(),
            module: MODULE,
        }
    }

    /// Adds a context entry
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Looks up a context entry by key
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.module, self.message)?;
        for (key, value) in &self.context {
            write!(f, " {}={:?}", key, value)?;
        }
        Ok(())
    }
}

/// Receiver for engine warnings
///
/// Sinks are fire-and-forget: they cannot influence resolution.
pub trait DiagnosticSink: Send + Sync {
    /// Records a warning
    fn warn(&self, diagnostic: &Diagnostic);
}

/// Sink forwarding warnings to `tracing` under the `templa` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, diagnostic: &Diagnostic) {
        tracing::warn!(
            target: "templa",
            module = diagnostic.module,
            kind = ?diagnostic.kind,
            "macro" = diagnostic.context_value("macro"),
            modifier = diagnostic.context_value("modifier"),
            found = diagnostic.context_value("found"),
            "{}",
            diagnostic.message
        );
    }
}

/// Sink discarding every warning
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn warn(&self, _diagnostic: &Diagnostic) {}
}

/// Sink recording warnings in memory
///
/// Clones share the same buffer, so a clone can be handed to the engine while
/// the original is kept for assertions.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        // Poisoned locks still guard a valid Vec
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns a snapshot of the recorded diagnostics
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Returns the number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every recorded diagnostic
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn warn(&self, diagnostic: &Diagnostic) {
        self.lock().push(diagnostic.clone());
    }
}
