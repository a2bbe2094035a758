//! Verified block storage for dagex.
//!
//! Blocks are immutable byte strings addressed by their CID. This crate
//! provides the storage layers a single retrieval request is served from:
//!
//! - [`CarBlockStore`] -- read-only view over a retrieved CAR archive, with
//!   every read checked against the CID's own multihash
//! - [`MemoryBlockStore`] -- `HashMap`-based overlay for synthesized blocks
//! - [`TieredBlockStore`] -- cold (verified) source first, warm overlay second
//!
//! # Design Rules
//!
//! 1. The archive is authoritative: a key present in both tiers always
//!    resolves to the archive's bytes.
//! 2. No block leaves the store without its hash being checked.
//! 3. Stores are per-request; nothing here is shared across retrievals.
//! 4. All I/O and integrity errors are propagated, never silently ignored.

pub mod block;
pub mod car;
pub mod error;
pub mod memory;
pub mod tiered;
pub mod traits;
pub mod verify;

pub use block::Block;
pub use car::{CarBlockStore, CarHeader, CarWriter};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryBlockStore;
pub use tiered::TieredBlockStore;
pub use traits::BlockStore;
pub use verify::verify_block;
