//! Structured diagnostics produced by inference.
//!
//! Diagnostics are data: a level, a message template id, a position and a
//! list of already-rendered arguments. Rendering to text is deferred to
//! [`Diagnostic::message`] so that callers which only inspect templates never
//! pay for string formatting.

use crate::position::Position;
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Severity of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Level {
    Error,
    Warning,
    Info,
}

/// Identifies the message text of a diagnostic.
///
/// | Template | Arguments |
/// |----------|-----------|
/// | `NoCalleeMatching` | input types, candidate signatures |
/// | `ActualNotInBounds` | type formal, actual, violated bounds |
/// | `ArityMismatch` | actual count, arity range |
/// | `SignatureInputMismatch` | signature, expected types, actual types |
/// | `TypeActualsUnavailable` | signature, input types, context type |
/// | `ArgumentListSizeMismatch` | actual count, arity range |
/// | `NamedArgumentMismatch` | name |
/// | `DuplicateName` | name |
/// | `NoFormalForActual` | actual index |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MessageTemplate {
    NoCalleeMatching,
    ActualNotInBounds,
    ArityMismatch,
    SignatureInputMismatch,
    TypeActualsUnavailable,
    ArgumentListSizeMismatch,
    NamedArgumentMismatch,
    DuplicateName,
    NoFormalForActual,
}

impl MessageTemplate {
    /// English message text with `{0}`, `{1}`, ... placeholders.
    pub const fn text(self) -> &'static str {
        match self {
            Self::NoCalleeMatching => "No callee matches inputs {0}; candidates were {1}",
            Self::ActualNotInBounds => "Type actual {1} for {0} is not within {2}",
            Self::ArityMismatch => "Got {0} arguments but expected {1}",
            Self::SignatureInputMismatch => "Inputs {2} do not fit {0} which expects {1}",
            Self::TypeActualsUnavailable => {
                "Cannot infer type actuals for {0} from inputs {1} in context {2}"
            }
            Self::ArgumentListSizeMismatch => "Argument count {0} does not fit arity {1}",
            Self::NamedArgumentMismatch => "No input is named {0}",
            Self::DuplicateName => "Input {0} is supplied more than once",
            Self::NoFormalForActual => "No input accepts the argument at index {0}",
        }
    }

    pub const fn default_level(self) -> Level {
        Level::Error
    }

    /// Renders the template text with `args`.
    #[must_use]
    pub fn format(self, args: &[DiagnosticArg]) -> String {
        let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
        let borrowed: Vec<&str> = rendered.iter().map(String::as_str).collect();
        format_message(self.text(), &borrowed)
    }
}

/// A diagnostic argument, rendered eagerly from solver values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DiagnosticArg {
    Text(String),
    Int(i64),
    List(Vec<DiagnosticArg>),
}

impl DiagnosticArg {
    pub fn list<T: Into<DiagnosticArg>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for DiagnosticArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for DiagnosticArg {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for DiagnosticArg {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<usize> for DiagnosticArg {
    fn from(n: usize) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<i64> for DiagnosticArg {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// A structured diagnostic record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: Level,
    pub template: MessageTemplate,
    pub position: Position,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<DiagnosticArg>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub fn error(template: MessageTemplate, position: Position, args: Vec<DiagnosticArg>) -> Self {
        Self {
            level: Level::Error,
            template,
            position,
            args,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// The rendered message text.
    #[must_use]
    pub fn message(&self) -> String {
        self.template.format(&self.args)
    }

    /// One JSON object per diagnostic, for tooling that consumes sink output.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}: {}", self.level, self.position, self.message())
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

// =============================================================================
// Log sinks
// =============================================================================

/// Receives diagnostics as they are reported.
pub trait LogSink {
    fn log(&self, diagnostic: &Diagnostic);
}

/// Drops every diagnostic.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _diagnostic: &Diagnostic) {}
}

/// Stores every diagnostic in arrival order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything logged so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for CollectingSink {
    fn log(&self, diagnostic: &Diagnostic) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic.clone());
    }
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
