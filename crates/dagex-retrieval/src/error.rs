//! Error types for retrieval.

use cid::Cid;
use dagex_types::{DealId, ProviderAddress, TokenAmount};
use thiserror::Error;

use crate::types::PriceCeiling;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("offer from {provider}: {reason}")]
    OfferFailed {
        provider: ProviderAddress,
        reason: String,
    },

    #[error("offer error: {0}")]
    OfferRejected(String),

    #[error("failed to find offer satisfying max price: {ceiling} (min {min_price})")]
    PriceExceeded {
        ceiling: PriceCeiling,
        min_price: TokenAmount,
    },

    #[error("error setting up retrieval updates: {0}")]
    SubscribeFailed(String),

    #[error("error setting up retrieval: {0}")]
    SubmitFailed(String),

    #[error("Retrieval Proposal Rejected: {0}")]
    DealRejected(String),

    #[error("Retrieval Error: {0}")]
    DealNotFound(String),

    #[error("Retrieval Error: {0}")]
    DealErrored(String),

    #[error("retrieval event stream closed before deal {0} finished")]
    EventStreamClosed(DealId),

    #[error("Retrieval Timed Out (deal {deal_id})")]
    TimedOut { deal_id: DealId },

    #[error("unknown deal {0}")]
    UnknownDeal(DealId),

    #[error("piece {piece} does not hold {root}")]
    RootNotInPiece { piece: Cid, root: Cid },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("store error: {0}")]
    Store(#[from] dagex_store::StoreError),

    #[error("dag error: {0}")]
    Dag(#[from] dagex_dag::DagError),

    #[error("selector error: {0}")]
    Selector(#[from] dagex_selector::SelectorError),

    #[error("ping {provider}: {reason}")]
    PingFailed {
        provider: ProviderAddress,
        reason: String,
    },

    #[error("background task failed: {0}")]
    Task(String),

    #[error("invalid chain data: {0}")]
    Chain(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RetrievalError {
    /// True for a deadline or cancellation, as opposed to a negotiation
    /// failure. A timed-out retrieval may succeed with a longer deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RetrievalError::TimedOut { .. })
    }
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;
