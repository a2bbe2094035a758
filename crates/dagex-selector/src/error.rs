//! Error types for selector compilation and evaluation.

use dagex_dag::DagError;

/// Errors that can occur while building, decoding or walking selectors.
#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    /// A path expression could not be compiled.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A serialised selector could not be decoded.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// Loading or decoding a block during a walk failed.
    #[error(transparent)]
    Dag(#[from] DagError),
}

/// Convenience alias for selector results.
pub type SelectorResult<T> = Result<T, SelectorError>;
