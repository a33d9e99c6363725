//! # Diagnostics
//!
//! The generator never fails with an error value on user input; it
//! accumulates diagnostics and returns the full list. Any Error-severity
//! diagnostic suppresses the generated text; warnings do not.

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// Machine-readable classification of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum DiagnosticKind {
    /// Malformed document or unknown top-level fields.
    Structural,
    UnknownInputRef,
    UnknownOutputRef,
    UnknownFilterRef,
    DuplicateName,
    InvalidName,
    InvalidUrl,
    MissingSecretKey,
    UnknownSecretKey,
    ConflictingOptions,
    UnusedEntity,
    Deprecation,
    Unsupported,
    Internal,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Structural => "Structural",
            DiagnosticKind::UnknownInputRef => "UnknownInputRef",
            DiagnosticKind::UnknownOutputRef => "UnknownOutputRef",
            DiagnosticKind::UnknownFilterRef => "UnknownFilterRef",
            DiagnosticKind::DuplicateName => "DuplicateName",
            DiagnosticKind::InvalidName => "InvalidName",
            DiagnosticKind::InvalidUrl => "InvalidURL",
            DiagnosticKind::MissingSecretKey => "MissingSecretKey",
            DiagnosticKind::UnknownSecretKey => "UnknownSecretKey",
            DiagnosticKind::ConflictingOptions => "ConflictingOptions",
            DiagnosticKind::UnusedEntity => "UnusedEntity",
            DiagnosticKind::Deprecation => "Deprecation",
            DiagnosticKind::Unsupported => "Unsupported",
            DiagnosticKind::Internal => "Internal",
        }
    }
}

/// One finding about the input document.
///
/// `ref_path` addresses the offending entity in the document, e.g.
/// `outputs/my-cloudwatch` or `pipelines/0/inputRefs/2`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub ref_path: String,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, ref_path: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            kind,
            message: message.into(),
            ref_path: ref_path.into(),
        }
    }

    pub fn warning(kind: DiagnosticKind, ref_path: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            ref_path: ref_path.into(),
        }
    }
}

/// Ordered accumulator for diagnostics.
///
/// Diagnostics are recorded in document-walk order; `into_sorted` keeps
/// that order stable and only breaks ties on kind, matching the ordering
/// contract exposed to callers.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<(usize, Diagnostic)>,
    position: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the document position for subsequently pushed diagnostics.
    pub fn at_position(&mut self, position: usize) {
        self.position = position;
    }

    pub fn push(&mut self, d: Diagnostic) {
        self.items.push((self.position, d));
    }

    pub fn error(&mut self, kind: DiagnosticKind, ref_path: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::error(kind, ref_path, message));
    }

    pub fn warning(&mut self, kind: DiagnosticKind, ref_path: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::warning(kind, ref_path, message));
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|(_, d)| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Document order first, kind as the tie-break.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.items.sort_by(|(pa, da), (pb, db)| pa.cmp(pb).then(da.kind.cmp(&db.kind)));
        self.items.into_iter().map(|(_, d)| d).collect()
    }
}
