//! Error types for stubfmt
//!
//! All fallible operations return `Result<T, Error>`.
//! Spacing ambiguity is never an error: unsupported constructs degrade to
//! more separation and no collapse instead of failing the pass.

use thiserror::Error;

use crate::parser::tokenizer::Span;

/// stubfmt error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Syntax or indentation violation while reading declaration text
    #[error("Parse error at {span}: {message}")]
    Parse { message: String, span: Span },

    /// Tree shape the normalizer's invariants rule out (upstream defect)
    #[error("Structural invariant violation: {0}")]
    StructuralInvariant(String),

    /// A second formatting pass changed the output
    #[error("Unstable formatting: {0}")]
    Unstable(String),

    /// The statement sequence of the output differs from the source
    #[error("Output not equivalent to source: {0}")]
    NotEquivalent(String),

    /// Invalid configuration value or unreadable configuration document
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(message: impl Into<String>, span: Span) -> Self {
        Error::Parse {
            message: message.into(),
            span,
        }
    }
}

/// Result type alias for stubfmt operations
pub type Result<T> = std::result::Result<T, Error>;
