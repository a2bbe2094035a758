use std::path::PathBuf;
use std::time::Duration;

use dagex_types::TokenAmount;
use serde::{Deserialize, Serialize};

use crate::types::PriceCeiling;

/// Client-side retrieval settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub price_ceiling: PriceCeiling,
    /// Deadline for the deal event loop, in seconds.
    pub timeout_secs: u64,
    pub payer: Option<String>,
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            price_ceiling: PriceCeiling::default(),
            timeout_secs: 120,
            payer: None,
        }
    }
}

/// Settings of the directory-backed provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalProviderConfig {
    /// Directory of `<piece-cid>.car` archives.
    pub pieces_dir: PathBuf,
    /// Price quoted for every retrieval.
    pub price: TokenAmount,
    /// Optional JSON file with storage deals and sectors.
    pub deals_file: Option<PathBuf>,
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            pieces_dir: PathBuf::from("pieces"),
            price: TokenAmount::zero(),
            deals_file: None,
        }
    }
}
