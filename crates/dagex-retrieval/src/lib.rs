//! Retrieval for dagex.
//!
//! A retrieval moves the part of a DAG named by a selector from a storage
//! provider into a per-request, verified block store. The provider side is
//! an opaque service ([`RetrievalService`]); this crate drives it.
//!
//! # Flow
//!
//! 1. [`Negotiator`] requests an offer, checks it against the
//!    [`PriceCeiling`], opens the event subscription, submits the order and
//!    follows the deal's events to a terminal status.
//! 2. [`Fetcher`] exports the resulting archive and opens it as a
//!    [`CarBlockStore`](dagex_store::CarBlockStore) tiered over an empty
//!    in-memory overlay.
//!
//! Chain-state lookups ([`ChainService`]) and the bounded [`fanout`] used to
//! map sector deals to piece CIDs live here as well, together with
//! [`LocalProvider`], a provider backed by a directory of archives.

pub mod config;
pub mod error;
pub mod fanout;
pub mod fetcher;
pub mod local;
pub mod negotiator;
pub mod service;
pub mod types;

pub use config::{LocalProviderConfig, RetrievalConfig};
pub use error::{RetrievalError, RetrievalResult};
pub use fetcher::{Fetcher, Retrieved, Target};
pub use local::{piece_path, ChainSnapshot, LocalProvider};
pub use negotiator::Negotiator;
pub use service::{ArchiveStream, ChainService, RetrievalService};
pub use types::{
    storage_miners, ClientDeal, ClientEvent, DealProposal, DealStatus, ExportRef,
    MarketParticipant, NegotiationState, PriceCeiling, ProviderInfo, QueryOffer, RetrievalEvent,
    RetrievalOrder, SectorInfo, StorageDeal,
};
