//! From a retrieval request to a browsable block store.

use std::sync::Arc;

use bytes::BytesMut;
use cid::Cid;
use dagex_dag::DagService;
use dagex_selector::Selector;
use dagex_store::{CarBlockStore, MemoryBlockStore, TieredBlockStore};
use dagex_types::{DealId, ProviderAddress};
use futures::TryStreamExt;
use tracing::debug;

use crate::config::RetrievalConfig;
use crate::error::RetrievalResult;
use crate::negotiator::Negotiator;
use crate::service::{ArchiveStream, RetrievalService};
use crate::types::RetrievalOrder;

/// What to retrieve: a root CID inside a piece held by a provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub provider: ProviderAddress,
    pub piece_cid: Cid,
    pub root: Cid,
}

/// A retrieved sub-DAG, scoped to one request.
#[derive(Clone, Debug)]
pub struct Retrieved {
    /// The archive's root: the node the selector's path leads to.
    pub root: Cid,
    pub deal_id: DealId,
    pub archive_bytes: usize,
    /// Archive blocks first, then an empty writable overlay.
    pub dag: DagService,
}

/// Runs retrievals against one service with one set of client settings.
#[derive(Clone)]
pub struct Fetcher {
    service: Arc<dyn RetrievalService>,
    negotiator: Negotiator,
    config: RetrievalConfig,
}

impl Fetcher {
    pub fn new(service: Arc<dyn RetrievalService>, config: RetrievalConfig) -> Self {
        Self {
            negotiator: Negotiator::new(service.clone()),
            service,
            config,
        }
    }

    pub fn service(&self) -> &Arc<dyn RetrievalService> {
        &self.service
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Build the order for `target` with `selector` attached.
    pub fn order(&self, target: &Target, selector: &Selector) -> RetrievalOrder {
        RetrievalOrder {
            provider: target.provider.clone(),
            piece_cid: target.piece_cid,
            root: target.root,
            selector: selector.to_json_string(),
            price_ceiling: self.config.price_ceiling,
            payer: self.config.payer.clone(),
        }
    }

    /// Retrieve and stream the raw archive.
    pub async fn fetch_archive(
        &self,
        target: &Target,
        selector: &Selector,
    ) -> RetrievalResult<ArchiveStream> {
        let order = self.order(target, selector);
        let export = self.negotiator.retrieve(&order, self.config.timeout()).await?;
        self.service.export_archive(&order, &export).await
    }

    /// Retrieve, buffer the archive and open it as a verified store.
    ///
    /// Fails unless the archive declares exactly one root. Nothing is
    /// returned for an archive that does not open cleanly.
    pub async fn fetch_dag(&self, target: &Target, selector: &Selector) -> RetrievalResult<Retrieved> {
        let order = self.order(target, selector);
        let export = self.negotiator.retrieve(&order, self.config.timeout()).await?;
        let mut stream = self.service.export_archive(&order, &export).await?;

        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.try_next().await? {
            buf.extend_from_slice(&chunk);
        }
        let archive_bytes = buf.len();

        let car = CarBlockStore::open(buf.freeze())?;
        let root = car.single_root()?;
        debug!(%root, blocks = car.len(), archive_bytes, "assembled retrieval store");

        let store = TieredBlockStore::new(car, MemoryBlockStore::new());
        Ok(Retrieved {
            root,
            deal_id: export.deal_id,
            archive_bytes,
            dag: DagService::new(Arc::new(store)),
        })
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").field("config", &self.config).finish_non_exhaustive()
    }
}
