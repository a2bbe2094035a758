use cid::Cid;

use crate::block::Block;
use crate::error::StoreResult;
use crate::traits::BlockStore;

/// Two-tier block store: a read-only cold source in front of a writable
/// warm overlay.
///
/// Reads consult the cold tier first and fall through to the warm tier only
/// when the cold tier does not hold the key, so verified archive content can
/// never be shadowed. Writes always land in the warm tier.
pub struct TieredBlockStore<C, W> {
    cold: C,
    warm: W,
}

impl<C: BlockStore, W: BlockStore> TieredBlockStore<C, W> {
    pub fn new(cold: C, warm: W) -> Self {
        Self { cold, warm }
    }

    pub fn cold(&self) -> &C {
        &self.cold
    }

    pub fn warm(&self) -> &W {
        &self.warm
    }
}

impl<C: BlockStore, W: BlockStore> BlockStore for TieredBlockStore<C, W> {
    fn get(&self, cid: &Cid) -> StoreResult<Option<Block>> {
        if let Some(block) = self.cold.get(cid)? {
            return Ok(Some(block));
        }
        self.warm.get(cid)
    }

    fn has(&self, cid: &Cid) -> StoreResult<bool> {
        Ok(self.cold.has(cid)? || self.warm.has(cid)?)
    }

    fn put(&self, block: Block) -> StoreResult<()> {
        self.warm.put(block)
    }
}

impl<C, W> std::fmt::Debug for TieredBlockStore<C, W>
where
    C: std::fmt::Debug,
    W: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredBlockStore")
            .field("cold", &self.cold)
            .field("warm", &self.warm)
            .finish()
    }
}
