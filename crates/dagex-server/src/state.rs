use std::sync::Arc;

use dagex_retrieval::{ChainService, Fetcher, LocalProvider, RetrievalService};
use dagex_selector::TraversalLimits;

use crate::config::ExplorerConfig;
use crate::error::ServerResult;

/// Shared, read-only handler state. Every request builds its own block
/// store; nothing mutable is shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Fetcher,
    pub chain: Arc<dyn ChainService>,
    pub limits: TraversalLimits,
    pub fanout_concurrency: usize,
}

impl AppState {
    pub fn new(
        retrieval: Arc<dyn RetrievalService>,
        chain: Arc<dyn ChainService>,
        config: &ExplorerConfig,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(retrieval, config.retrieval.clone()),
            chain,
            limits: config.limits,
            fanout_concurrency: config.fanout_concurrency.max(1),
        }
    }

    /// State backed by a [`LocalProvider`] for both retrieval and chain
    /// lookups.
    pub fn local(config: &ExplorerConfig) -> ServerResult<Self> {
        let provider = Arc::new(LocalProvider::new(&config.provider)?);
        Ok(Self::new(provider.clone(), provider, config))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("fetcher", &self.fetcher)
            .field("limits", &self.limits)
            .field("fanout_concurrency", &self.fanout_concurrency)
            .finish_non_exhaustive()
    }
}
