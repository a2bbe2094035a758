//! Error types for node resolution.

use cid::Cid;
use dagex_dag::DagError;

/// Errors that can occur while classifying or presenting a node.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Loading or decoding the node failed.
    #[error(transparent)]
    Dag(#[from] DagError),

    /// A DAG-PB node carries a UnixFS type that cannot be presented.
    #[error("unknown ufs type {kind} ({cid})")]
    UnknownUnixfsType { cid: Cid, kind: String },

    /// A listing was requested for something that is not a directory.
    #[error("not a dir: {cid} is {kind}")]
    NotADirectory { cid: Cid, kind: String },

    /// A byte stream was requested for something that is not a file.
    #[error("not a file: {cid} is {kind}")]
    NotAFile { cid: Cid, kind: String },

    /// Reading the head of a file for sniffing failed.
    #[error("cannot detect content-type: {0}")]
    Sniff(std::io::Error),

    /// The stream could not be repositioned after sniffing.
    #[error("seeker can't seek")]
    Seek(#[source] std::io::Error),
}

/// Convenience alias for resolver results.
pub type ResolveResult<T> = Result<T, ResolveError>;
