//! Error kinds and diagnostics for structure extraction.
//!
//! Only [`ExtractError::UnsupportedLanguage`] and a parser that yields no tree
//! at all are fatal for a file. Everything else is downgraded to a
//! [`Diagnostic`] attached to the partial result and forwarded to a
//! [`DiagnosticSink`].

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::warn;

/// Errors produced while extracting structure from a single file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("failed to parse {language} source: {message}")]
    ParseFailure { language: String, message: String },

    #[error("{pattern} pattern failed: {message}")]
    QueryFailure { pattern: PatternKind, message: String },

    #[error("text at bytes {start}..{end} is not valid UTF-8")]
    DecodeFailure { start: usize, end: usize },
}

impl ExtractError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            ExtractError::UnsupportedLanguage(_) => DiagnosticKind::UnsupportedLanguage,
            ExtractError::ParseFailure { .. } => DiagnosticKind::ParseFailure,
            ExtractError::QueryFailure { .. } => DiagnosticKind::QueryFailure,
            ExtractError::DecodeFailure { .. } => DiagnosticKind::DecodeFailure,
        }
    }
}

/// Result alias used across the extraction core.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// The three structural patterns a language profile carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Type,
    Declaration,
    Comment,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Type => "type",
            PatternKind::Declaration => "declaration",
            PatternKind::Comment => "comment",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a non-fatal problem found during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnsupportedLanguage,
    ParseFailure,
    QueryFailure,
    DecodeFailure,
}

/// A recoverable problem recorded while extracting one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<ExtractError> for Diagnostic {
    fn from(err: ExtractError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Receiver for diagnostics emitted by an extractor.
///
/// Extraction never configures logging itself; callers inject the sink they
/// want. Implementations must be shareable across threads because one
/// extractor may serve many files concurrently.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        warn!(kind = ?diagnostic.kind, "{}", diagnostic.message);
    }
}

/// Keeps every reported diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push(diagnostic.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_from_error() {
        let diagnostic = Diagnostic::from(ExtractError::QueryFailure {
            pattern: PatternKind::Type,
            message: "invalid node type".into(),
        });
        assert_eq!(diagnostic.kind, DiagnosticKind::QueryFailure);
        assert_eq!(diagnostic.message, "type pattern failed: invalid node type");
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.report(&Diagnostic::new(DiagnosticKind::DecodeFailure, "bad bytes"));
        sink.report(&Diagnostic::new(DiagnosticKind::ParseFailure, "error node"));

        let kinds: Vec<_> = sink.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::DecodeFailure, DiagnosticKind::ParseFailure]
        );
    }
}
