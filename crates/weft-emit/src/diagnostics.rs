//! Non-fatal generation events.
//!
//! Every entry is also logged through `tracing` at the point it is raised.

use std::fmt;

use tracing::warn;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A type reference matched no known shape and was approximated.
    UnrecognizedType,
    /// A pointer typedef could not be recognized as a function pointer.
    UnrecognizedDelegate,
    /// A type override names nothing in the model.
    StaleTypeOverride,
    /// A callable override names nothing in the model.
    StaleCallableOverride,
    /// A callable override key is not a parameter index or `-1`.
    MalformedOverrideKey,
    /// A callable override targets a parameter the signature does not have.
    OverrideIndexOutOfRange,
    /// A configured boolean type is not a one- or four-byte integer.
    UnsupportedBooleanType,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::UnrecognizedType => "unrecognized-type",
            DiagnosticKind::UnrecognizedDelegate => "unrecognized-delegate",
            DiagnosticKind::StaleTypeOverride => "stale-type-override",
            DiagnosticKind::StaleCallableOverride => "stale-callable-override",
            DiagnosticKind::MalformedOverrideKey => "malformed-override-key",
            DiagnosticKind::OverrideIndexOutOfRange => "override-index-out-of-range",
            DiagnosticKind::UnsupportedBooleanType => "unsupported-boolean-type",
        };
        f.write_str(label)
    }
}

/// A single warning raised during generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Canonical name (and position) the warning is about.
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning[{}]: {}: {}", self.kind, self.subject, self.message)
    }
}

/// Diagnostics accumulated over one run, in the order they were raised.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        warn!(kind = %diagnostic.kind, subject = %diagnostic.subject, "{}", diagnostic.message);
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_count() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        diags.push(DiagnosticKind::UnrecognizedType, "foo.bar", "no such type");
        diags.push(DiagnosticKind::StaleTypeOverride, "Gone", "matches nothing");
        diags.push(DiagnosticKind::UnrecognizedType, "foo.baz", "no such type");
        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count(DiagnosticKind::UnrecognizedType), 2);
        assert_eq!(diags.entries()[1].subject, "Gone");
    }

    #[test]
    fn display_format() {
        let d = Diagnostic {
            kind: DiagnosticKind::UnrecognizedDelegate,
            subject: "sfArrayPtr".to_string(),
            message: "not a function pointer".to_string(),
        };
        assert_eq!(
            d.to_string(),
            "warning[unrecognized-delegate]: sfArrayPtr: not a function pointer"
        );
    }
}
