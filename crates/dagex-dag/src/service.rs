//! Node loading over a block store.

use std::sync::Arc;

use cid::Cid;
use dagex_store::{Block, BlockStore};
use tracing::debug;

use crate::error::DagResult;
use crate::node::Node;

/// Loads and stores DAG nodes through a shared block store.
#[derive(Clone)]
pub struct DagService {
    store: Arc<dyn BlockStore>,
}

impl DagService {
    pub fn new(store: Arc<dyn BlockStore>) -> Self {
        Self { store }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn BlockStore> {
        &self.store
    }

    /// Load a block that must be present.
    pub fn block(&self, cid: &Cid) -> DagResult<Block> {
        debug!(%cid, "loading block");
        Ok(self.store.require(cid)?)
    }

    /// Load a block if it is present.
    pub fn try_block(&self, cid: &Cid) -> DagResult<Option<Block>> {
        Ok(self.store.get(cid)?)
    }

    /// Load and decode a node.
    pub fn node(&self, cid: &Cid) -> DagResult<Node> {
        Node::decode(&self.block(cid)?)
    }

    /// Whether the block is held locally.
    pub fn has(&self, cid: &Cid) -> DagResult<bool> {
        Ok(self.store.has(cid)?)
    }

    /// Add a block, returning its CID.
    pub fn add(&self, block: Block) -> DagResult<Cid> {
        let cid = block.cid;
        self.store.put(block)?;
        Ok(cid)
    }
}

impl std::fmt::Debug for DagService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DagService").finish_non_exhaustive()
    }
}
