use cid::Cid;

use crate::block::Block;
use crate::error::{StoreError, StoreResult};

/// Content-addressed block store.
///
/// All implementations must satisfy these invariants:
/// - Blocks are immutable once written; a CID always maps to the same bytes.
/// - Blocks returned by `get` have been checked against their CID.
/// - Concurrent reads are always safe.
/// - The store never interprets block contents.
pub trait BlockStore: Send + Sync {
    /// Read a block by CID.
    ///
    /// Returns `Ok(None)` if the block is not held.
    /// Returns `Err` on I/O failure or integrity failure.
    fn get(&self, cid: &Cid) -> StoreResult<Option<Block>>;

    /// Check whether a block is held, without reading it.
    fn has(&self, cid: &Cid) -> StoreResult<bool>;

    /// Store a block. Idempotent for an already-present CID.
    fn put(&self, block: Block) -> StoreResult<()>;

    /// Read a block that must exist.
    fn require(&self, cid: &Cid) -> StoreResult<Block> {
        self.get(cid)?.ok_or(StoreError::NotFound(*cid))
    }
}

impl<T: BlockStore + ?Sized> BlockStore for std::sync::Arc<T> {
    fn get(&self, cid: &Cid) -> StoreResult<Option<Block>> {
        (**self).get(cid)
    }

    fn has(&self, cid: &Cid) -> StoreResult<bool> {
        (**self).has(cid)
    }

    fn put(&self, block: Block) -> StoreResult<()> {
        (**self).put(block)
    }
}
