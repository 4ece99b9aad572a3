//! Diagnostic records and the ordered collector the compiler reports into.
//!
//! Every recoverable problem in the pipeline (lexical, parse, import,
//! semantic) becomes a [`Diagnostic`] in a [`DiagnosticBag`] instead of an
//! early return. The bag preserves report order, which is part of the
//! compiler's determinism contract: compiling the same sources twice yields
//! byte-identical diagnostic sequences.
//!
//! Severity levels follow the editor-protocol convention (`Error` = 1 …
//! `Log` = 4). Success of a compilation is defined as "zero diagnostics at
//! `Error` severity"; warnings never fail a compile.

use serde::{Deserialize, Serialize};

use crate::span::{Position, Span};

/// Severity of a diagnostic, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Info = 3,
    Log = 4,
}

/// A single reported problem with its source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    /// Anchor position of the diagnostic (1-based).
    pub position: Position,
    /// Optional exact extent, when the reporter knows more than a point.
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            position,
            span: None,
        }
    }

    pub fn warning(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
            position,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Log => "log",
        };
        write!(f, "{}: {} at {}", label, self.message, self.position)
    }
}

/// An ordered collector of diagnostics with per-severity counts.
///
/// Report order is preserved; iteration yields diagnostics exactly as they
/// were reported.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            _ => {}
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>, position: Position) {
        self.report(Diagnostic::error(message, position));
    }

    pub fn warning(&mut self, message: impl Into<String>, position: Position) {
        self.report(Diagnostic::warning(message, position));
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Consumes the bag, yielding the diagnostics in report order.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Moves every diagnostic from `other` into this bag, preserving order.
    pub fn absorb(&mut self, other: DiagnosticBag) {
        self.errors += other.errors;
        self.warnings += other.warnings;
        self.diagnostics.extend(other.diagnostics);
    }
}

impl<'a> IntoIterator for &'a DiagnosticBag {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}
