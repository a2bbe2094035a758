use std::net::SocketAddr;
use std::path::Path;

use dagex_retrieval::{LocalProviderConfig, RetrievalConfig};
use dagex_selector::TraversalLimits;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Explorer configuration, usually read from a TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub bind_addr: SocketAddr,
    pub limits: TraversalLimits,
    pub retrieval: RetrievalConfig,
    pub provider: LocalProviderConfig,
    /// Concurrent chain lookups in the sector view.
    pub fanout_concurrency: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5658)),
            limits: TraversalLimits::default(),
            retrieval: RetrievalConfig::default(),
            provider: LocalProviderConfig::default(),
            fanout_concurrency: 16,
        }
    }
}

impl ExplorerConfig {
    /// Read a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw).map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
