use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a grammar table from loading or a run from starting.
///
/// Problems found in the document being validated are never errors; they are
/// reported as [`Diagnostic`](crate::diagnostics::Diagnostic)s.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed header in {path}: {message}")]
    MalformedHeader { path: PathBuf, message: String },

    #[error("Grammar for link {link} is unavailable: {reason}")]
    SchemaMissing { link: String, reason: String },

    #[error("Invalid expression '{expression}': {message}")]
    InvalidExpression { expression: String, message: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

pub type Result<T> = std::result::Result<T, GrammarError>;

impl GrammarError {
    pub(crate) fn expression(expression: &str, message: impl Into<String>) -> Self {
        GrammarError::InvalidExpression {
            expression: expression.to_string(),
            message: message.into(),
        }
    }
}
