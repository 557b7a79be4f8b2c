//! Positioned diagnostics shared by the lexer, the parser and the compiler.
//!
//! A diagnostic renders as `Ln <startLine>:<endLine>, Col <startCol>:<endCol>- <message>.`,
//! the format consumed by editor integrations to place inline markers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A region of source text.
///
/// Lines and columns are 1-based. `end_line` is one past the last line of the
/// region and `end_column` is one past its last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(start_line: usize, end_line: usize, start_column: usize, end_column: usize) -> Self {
        Self {
            start_line,
            end_line,
            start_column,
            end_column,
        }
    }

    /// The span reported for a source text without any token.
    pub fn empty_file() -> Self {
        Self::new(1, 2, 1, 1)
    }

    /// Returns the region starting at `self` and ending at `end`.
    pub fn to(&self, end: &Span) -> Span {
        Span {
            start_line: self.start_line,
            end_line: end.end_line,
            start_column: self.start_column,
            end_column: end.end_column,
        }
    }
}

/// The stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    LexError,
    SyntaxError,
    CompileError,
}

/// A single error reported against the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error(
    "Ln {}:{}, Col {}:{}- {}.",
    .span.start_line,
    .span.end_line,
    .span.start_column,
    .span.end_column,
    .message
)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticKind::LexError, message, span)
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticKind::SyntaxError, message, span)
    }

    pub fn compile(message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticKind::CompileError, message, span)
    }

    pub fn start_line(&self) -> usize {
        self.span.start_line
    }

    pub fn end_line(&self) -> usize {
        self.span.end_line
    }

    pub fn start_column(&self) -> usize {
        self.span.start_column
    }

    pub fn end_column(&self) -> usize {
        self.span.end_column
    }
}
