//! Structured diagnostics shared across every stage (§7, §9 "Deterministic
//! iteration" — diagnostics accumulate into one ordered `Vec` so re-running
//! the pipeline on the same input reproduces byte-identical output, per §8
//! property 6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    MalformedSource,
    UnresolvedSymbol,
    MissingLocationRole,
    MalformedLocationRole,
    OrphanLabel,
    AmbiguousLabel,
    DuplicateLabel,
    DanglingEnd,
    MultipointLabelMismatch,
    UnknownCircuitCurrent,
    GaugeInfeasible,
    RatingExceeded,
}

/// Where a diagnostic points: a component reference, a wire label, or a bare
/// coordinate, whichever the stage had on hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Location {
    Component(String),
    WireLabel(String),
    Coordinate { sheet: u32, x: f64, y: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub location: Location,
    pub message: String,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            location,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Append-only diagnostics sink threaded through the whole pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn push(&mut self, d: Diagnostic) {
        if d.severity == Severity::Warning {
            tracing::warn!(kind = ?d.kind, message = %d.message, "diagnostic");
        } else {
            tracing::error!(kind = ?d.kind, message = %d.message, "diagnostic");
        }
        self.0.push(d);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.severity == Severity::Error).count()
    }
}
