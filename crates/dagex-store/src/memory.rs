use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use cid::Cid;

use crate::block::Block;
use crate::error::StoreResult;
use crate::traits::BlockStore;
use crate::verify::verify_block;

/// In-memory, HashMap-based block store.
///
/// Used as the warm overlay of a [`TieredBlockStore`](crate::TieredBlockStore)
/// and in tests. Blocks are verified on `put`, so reads can hand them out
/// without re-hashing.
pub struct MemoryBlockStore {
    blocks: RwLock<HashMap<Cid, Bytes>>,
}

impl MemoryBlockStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store holding `blocks`, verifying each one.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> StoreResult<Self> {
        let store = Self::new();
        for block in blocks {
            store.put(block)?;
        }
        Ok(store)
    }

    /// Number of blocks currently stored.
    pub fn len(&self) -> usize {
        self.blocks.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().expect("lock poisoned").is_empty()
    }

    /// Total payload bytes across all blocks.
    pub fn total_bytes(&self) -> u64 {
        self.blocks
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }
}

impl Default for MemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore for MemoryBlockStore {
    fn get(&self, cid: &Cid) -> StoreResult<Option<Block>> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.get(cid).map(|data| Block::new(*cid, data.clone())))
    }

    fn has(&self, cid: &Cid) -> StoreResult<bool> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.contains_key(cid))
    }

    fn put(&self, block: Block) -> StoreResult<()> {
        verify_block(&block.cid, &block.data)?;
        let mut map = self.blocks.write().expect("lock poisoned");
        map.entry(block.cid).or_insert(block.data);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlockStore")
            .field("block_count", &self.len())
            .finish()
    }
}
