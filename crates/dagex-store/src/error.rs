use cid::Cid;

/// Errors from block store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested block is not held by any tier.
    #[error("block not found: {0}")]
    NotFound(Cid),

    /// Block bytes do not hash to the CID they were stored under.
    #[error("hash mismatch for {cid}: computed digest {computed}")]
    HashMismatch { cid: Cid, computed: String },

    /// The CID uses a hash function the store cannot verify.
    #[error("cannot verify {cid}: unsupported multihash code 0x{code:x}")]
    UnsupportedHash { cid: Cid, code: u64 },

    /// The archive does not declare exactly one root.
    #[error("wanted exactly one root, archive declares {0}")]
    WrongRootCount(usize),

    /// The archive header could not be decoded.
    #[error("invalid archive header: {0}")]
    InvalidHeader(String),

    /// A section extends past the end of the archive.
    #[error("truncated archive at offset {offset}: {reason}")]
    Truncated { offset: usize, reason: String },

    /// A section's CID or framing is malformed.
    #[error("corrupt archive section at offset {offset}: {reason}")]
    CorruptSection { offset: usize, reason: String },

    /// Encoding a header or block failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The store does not accept writes.
    #[error("store is read-only")]
    ReadOnly,

    /// I/O error from an underlying reader.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
