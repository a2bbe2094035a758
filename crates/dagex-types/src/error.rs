use thiserror::Error;

/// Errors produced by type parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid provider address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("invalid deal id {0:?}")]
    InvalidDealId(String),

    #[error("invalid token amount {0:?}")]
    InvalidAmount(String),

    #[error("invalid cid {input:?}: {reason}")]
    InvalidCid { input: String, reason: String },
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;
