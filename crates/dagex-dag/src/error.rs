//! Error types for DAG decoding and traversal.

use cid::Cid;
use dagex_store::StoreError;

/// Errors that can occur while loading or interpreting DAG nodes.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// The underlying block store failed, or the block is absent.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A DAG-PB block could not be decoded.
    #[error("invalid dag-pb node {cid}: {reason}")]
    Protobuf { cid: Cid, reason: String },

    /// A link inside a DAG-PB node does not carry a valid CID.
    #[error("invalid link {index} in {cid}: {reason}")]
    InvalidLink {
        cid: Cid,
        index: usize,
        reason: String,
    },

    /// The UnixFS descriptor inside a DAG-PB node is malformed.
    #[error("invalid unixfs data in {cid}: {reason}")]
    Unixfs { cid: Cid, reason: String },

    /// A block whose codec promises DAG-CBOR failed to decode.
    #[error("invalid dag-cbor node {cid}: {reason}")]
    Cbor { cid: Cid, reason: String },

    /// A file operation was attempted on something that is not a file.
    #[error("{cid} is not a file ({kind})")]
    NotAFile { cid: Cid, kind: String },

    /// Building a node failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl DagError {
    /// True when the error is caused by a block that is not held locally.
    pub fn is_missing(&self) -> bool {
        matches!(self, DagError::Store(StoreError::NotFound(_)))
    }
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
