use tokio::net::TcpListener;

use crate::config::ExplorerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// The explorer HTTP server.
pub struct ExplorerServer {
    config: ExplorerConfig,
    state: AppState,
}

impl ExplorerServer {
    pub fn new(config: ExplorerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Server over a [`LocalProvider`](dagex_retrieval::LocalProvider)
    /// configured from `config.provider`.
    pub fn local(config: ExplorerConfig) -> ServerResult<Self> {
        let state = AppState::local(&config)?;
        Ok(Self::new(config, state))
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = build_router(self.state);
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("dagex explorer listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ExplorerConfig::default();
        config.provider.pieces_dir = dir.path().to_path_buf();
        let server = ExplorerServer::local(config).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:5658".parse().unwrap());
        let _router = server.router();
    }

    #[test]
    fn missing_deals_file_fails() {
        let mut config = ExplorerConfig::default();
        config.provider.deals_file = Some("/nonexistent/deals.json".into());
        assert!(ExplorerServer::local(config).is_err());
    }
}
