//! Deal, sector, miner and provider views over chain state.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::{Html, Json};
use dagex_resolver::content_type::{from_prefix, SNIFF_LEN};
use dagex_resolver::{classify_block, list_directory, ContentReader, NodeKind};
use dagex_retrieval::fanout::{piece_cids, sector_deals};
use dagex_retrieval::{storage_miners, ProviderInfo, RetrievalError, Target};
use dagex_selector::{presets, TraversalLimits};
use dagex_types::{parse_cid, size_str, DealId, ProviderAddress};
use serde::Deserialize;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ServerError, ServerResult};
use crate::render::{self, DealSummary};
use crate::state::AppState;

/// Bound on each step of a miner ping.
const PING_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Deserialize)]
pub struct DealQuery {
    pub expand: Option<String>,
}

/// `GET /deal/:id`: the deal proposal, and a description of the payload
/// root named by its label. `?expand=1` lists a directory root.
pub async fn deal_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<DealQuery>,
) -> ServerResult<Html<String>> {
    let deal = state.chain.storage_deal(DealId(id)).await?;
    let root = parse_cid(&deal.proposal.label)?;
    let target = Target {
        provider: deal.proposal.provider.clone(),
        piece_cid: deal.proposal.piece_cid,
        root,
    };
    let retrieved = state
        .fetcher
        .fetch_dag(&target, &presets::first_leaf_chain(state.limits.max_depth))
        .await?;
    let kind = classify_block(&retrieved.dag.block(&retrieved.root)?)?;

    let mut summary = DealSummary {
        root: retrieved.root,
        kind: kind.label(),
        size: kind.size().map(size_str).unwrap_or_default(),
        links: None,
        entries: Vec::new(),
    };
    match kind {
        NodeKind::Directory { entries, .. } | NodeKind::ShardedDirectory { links: entries, .. } => {
            summary.kind = "DIR".to_string();
            summary.links = Some(entries);
            if query.expand.as_deref() == Some("1") {
                // Names and sizes only; nothing past the root was retrieved.
                let limits = TraversalLimits {
                    max_dir_type_checks: 0,
                    ..state.limits
                };
                summary.entries = list_directory(&retrieved.dag, &retrieved.root, &limits)?;
            }
        }
        NodeKind::File { .. } | NodeKind::RawFile { .. } => {
            let mut reader = ContentReader::open(&retrieved.dag, &retrieved.root)?;
            summary.kind = format!("FILE({})", from_prefix(None, &reader.head(SNIFF_LEN)?));
        }
        NodeKind::StructuredData { .. } | NodeKind::Symlink { .. } => {}
        NodeKind::Unknown { codec } => return Err(ServerError::UnknownCodec(codec)),
    }
    debug!(deal = %deal.id, root = %summary.root, kind = %summary.kind, "described deal");
    Ok(Html(render::deal(&deal, &summary)))
}

/// `GET /minersectors/:provider`: every sector with the piece CIDs of its
/// deals. Deals whose lookup fails are shown without a piece.
pub async fn sectors_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> ServerResult<Html<String>> {
    let provider = ProviderAddress::parse(&provider)?;
    let sectors = state.chain.miner_sectors(&provider).await?;
    let deals = sector_deals(&sectors);
    let pieces = piece_cids(state.chain.clone(), deals, state.fanout_concurrency).await;
    Ok(Html(render::sectors(&provider, &sectors, &pieces)))
}

/// `GET /provider/:provider`: the provider's peer identity and addresses.
pub async fn provider_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> ServerResult<Json<ProviderInfo>> {
    let provider = ProviderAddress::parse(&provider)?;
    Ok(Json(state.fetcher.service().provider_info(&provider).await?))
}

/// `GET /`
pub async fn index_handler() -> Html<String> {
    Html(render::index())
}

/// `GET /miners`: storage miners holding collateral, most locked first.
pub async fn miners_handler(State(state): State<AppState>) -> ServerResult<Html<String>> {
    let miners = storage_miners(state.chain.market_participants().await?);
    Ok(Html(render::miners(&miners)))
}

/// `GET /deals`: this client's storage deals.
pub async fn deals_handler(State(state): State<AppState>) -> ServerResult<Html<String>> {
    let deals = state.chain.client_deals().await?;
    Ok(Html(render::client_deals(&deals)))
}

/// `GET /ping/miner/:id`: `<peer id> <round trip>`, the round trip rounded
/// to milliseconds. Lookup and ping each get [`PING_TIMEOUT`].
pub async fn ping_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> ServerResult<Html<String>> {
    let provider = ProviderAddress::parse(&provider)?;
    let timed_out = |step: &str| RetrievalError::PingFailed {
        provider: provider.clone(),
        reason: format!("{step} timed out after {PING_TIMEOUT:?}"),
    };
    let service = state.fetcher.service();
    let info = timeout(PING_TIMEOUT, service.provider_info(&provider))
        .await
        .map_err(|_| timed_out("peer lookup"))??;
    let rtt = timeout(PING_TIMEOUT, service.ping(&provider))
        .await
        .map_err(|_| timed_out("ping"))??;
    debug!(%provider, peer = %info.peer_id, ?rtt, "pinged miner");
    Ok(Html(format!("{} {}", render::escape(&info.peer_id), round_trip(rtt))))
}

fn round_trip(rtt: Duration) -> String {
    format!("{}ms", (rtt.as_micros() + 500) / 1000)
}
