//! A provider serving retrievals from a directory of archives.
//!
//! Each piece is a CAR file named `<piece-cid>.car`. A submitted order is
//! answered by walking its selector over the piece and keeping exactly the
//! blocks the walk loads; the export is a fresh archive of those blocks
//! rooted at the node the selector matched first.
//!
//! Deals are tracked from submission until they are exported, cancelled, or
//! left without updates for longer than the deal TTL.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use dagex_dag::DagService;
use dagex_selector::{Selector, Walk};
use dagex_store::{Block, BlockStore, CarBlockStore, CarWriter};
use dagex_types::{DealId, ProviderAddress, TokenAmount};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::LocalProviderConfig;
use crate::error::{RetrievalError, RetrievalResult};
use crate::service::{ArchiveStream, ChainService, RetrievalService};
use crate::types::{
    ClientDeal, ClientEvent, DealStatus, ExportRef, MarketParticipant, ProviderInfo, QueryOffer,
    RetrievalEvent, RetrievalOrder, SectorInfo, StorageDeal,
};

const EVENT_CAPACITY: usize = 256;
const EXPORT_CHUNK: usize = 64 * 1024;
const DEAL_TTL: Duration = Duration::from_secs(10 * 60);

/// Chain state served by [`LocalProvider`]'s chain view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    #[serde(default)]
    pub deals: Vec<StorageDeal>,
    /// Sectors keyed by provider address.
    #[serde(default)]
    pub sectors: BTreeMap<String, Vec<SectorInfo>>,
    #[serde(default)]
    pub participants: Vec<MarketParticipant>,
    #[serde(default)]
    pub client_deals: Vec<ClientDeal>,
}

impl ChainSnapshot {
    /// Read a snapshot from a JSON file.
    pub fn load(path: &Path) -> RetrievalResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| RetrievalError::Chain(format!("{}: {e}", path.display())))
    }
}

/// Blocks selected for a deal, waiting to be exported.
struct Prepared {
    root: Cid,
    blocks: Vec<Block>,
}

/// A deal between submission and export.
struct Tracked {
    latest: RetrievalEvent,
    ready: Option<Prepared>,
    updated: Instant,
}

type Deals = Arc<Mutex<HashMap<DealId, Tracked>>>;

/// Directory-backed [`RetrievalService`] and [`ChainService`].
pub struct LocalProvider {
    pieces_dir: PathBuf,
    price: TokenAmount,
    chain: ChainSnapshot,
    events: broadcast::Sender<RetrievalEvent>,
    next_deal: AtomicU64,
    deals: Deals,
    deal_ttl: Duration,
}

impl LocalProvider {
    pub fn new(config: &LocalProviderConfig) -> RetrievalResult<Self> {
        let chain = match &config.deals_file {
            Some(path) => ChainSnapshot::load(path)?,
            None => ChainSnapshot::default(),
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            pieces_dir: config.pieces_dir.clone(),
            price: config.price,
            chain,
            events,
            next_deal: AtomicU64::new(1),
            deals: Arc::new(Mutex::new(HashMap::new())),
            deal_ttl: DEAL_TTL,
        })
    }

    /// Replace the chain view.
    pub fn with_chain(mut self, chain: ChainSnapshot) -> Self {
        self.chain = chain;
        self
    }

    /// Forget deals that saw no update for `ttl`. Checked on every submit.
    pub fn with_deal_ttl(mut self, ttl: Duration) -> Self {
        self.deal_ttl = ttl;
        self
    }

    pub fn pieces_dir(&self) -> &Path {
        &self.pieces_dir
    }

    /// Path of the archive holding `piece`.
    pub fn piece_path(&self, piece: &Cid) -> PathBuf {
        piece_path(&self.pieces_dir, piece)
    }

    /// Deals submitted but not yet exported, cancelled or expired.
    pub fn tracked_deals(&self) -> usize {
        self.deals.lock().expect("lock poisoned").len()
    }

    /// Start tracking a new deal with `first` as its latest update.
    fn track(&self, first: RetrievalEvent) {
        let mut deals = self.deals.lock().expect("lock poisoned");
        let before = deals.len();
        deals.retain(|_, tracked| tracked.updated.elapsed() < self.deal_ttl);
        if deals.len() < before {
            debug!(expired = before - deals.len(), "forgot stale deals");
        }
        deals.insert(
            first.deal_id,
            Tracked {
                latest: first.clone(),
                ready: None,
                updated: Instant::now(),
            },
        );
        drop(deals);
        let _ = self.events.send(first);
    }
}

/// Location of a piece archive inside `dir`.
pub fn piece_path(dir: &Path, piece: &Cid) -> PathBuf {
    dir.join(format!("{piece}.car"))
}

/// Run CPU-bound work (walks, hash checks) off the async workers.
async fn blocking<T, F>(work: F) -> RetrievalResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> RetrievalResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RetrievalError::Task(e.to_string()))?
}

async fn open_piece(dir: &Path, piece: &Cid) -> RetrievalResult<CarBlockStore> {
    let data = tokio::fs::read(piece_path(dir, piece)).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RetrievalError::NotFound(format!("piece {piece}"))
        } else {
            RetrievalError::Io(e)
        }
    })?;
    blocking(move || Ok(CarBlockStore::open(data)?)).await
}

fn prepare(piece: CarBlockStore, order: &RetrievalOrder) -> RetrievalResult<Prepared> {
    let selector = Selector::from_json_str(&order.selector)?;
    let dag = DagService::new(Arc::new(piece));
    let mut walk = Walk::new(&dag);
    walk.run(&order.root, &selector)?;
    let root = walk.first_match().copied().ok_or_else(|| {
        RetrievalError::NotFound(format!("no node under {} matches the selector", order.root))
    })?;
    Ok(Prepared {
        root,
        blocks: walk.into_blocks(),
    })
}

async fn load_and_prepare(dir: PathBuf, order: RetrievalOrder) -> RetrievalResult<Prepared> {
    let piece = open_piece(&dir, &order.piece_cid).await?;
    blocking(move || prepare(piece, &order)).await
}

/// Store `event` as its deal's latest update and publish it. Updates for
/// deals no longer tracked (cancelled or expired) are dropped.
fn record(deals: &Deals, events: &broadcast::Sender<RetrievalEvent>, event: RetrievalEvent) {
    {
        let mut deals = deals.lock().expect("lock poisoned");
        let Some(tracked) = deals.get_mut(&event.deal_id) else {
            debug!(deal_id = %event.deal_id, status = event.status.short_name(), "update for untracked deal dropped");
            return;
        };
        tracked.latest = event.clone();
        tracked.updated = Instant::now();
    }
    // No subscribers is not an error.
    let _ = events.send(event);
}

fn update(
    deal_id: DealId,
    status: DealStatus,
    event: ClientEvent,
    bytes_received: u64,
    total_paid: TokenAmount,
    message: Option<String>,
) -> RetrievalEvent {
    RetrievalEvent {
        deal_id,
        status,
        event: Some(event),
        bytes_received,
        total_paid,
        message,
    }
}

#[async_trait]
impl RetrievalService for LocalProvider {
    async fn provider_info(&self, provider: &ProviderAddress) -> RetrievalResult<ProviderInfo> {
        Ok(ProviderInfo {
            peer_id: format!("local-{provider}"),
            multiaddrs: vec![format!("file://{}", self.pieces_dir.display())],
        })
    }

    async fn query_offer(
        &self,
        _provider: &ProviderAddress,
        root: &Cid,
        piece: &Cid,
    ) -> RetrievalResult<QueryOffer> {
        let store = match open_piece(&self.pieces_dir, piece).await {
            Ok(store) => store,
            Err(RetrievalError::NotFound(what)) => {
                return Ok(QueryOffer {
                    min_price: self.price,
                    size: 0,
                    error: Some(format!("{what} not found")),
                })
            }
            Err(e) => return Err(e),
        };
        let root = *root;
        let (has_root, size) = blocking(move || {
            let size = store.blocks().try_fold(0u64, |n, b| b.map(|b| n + b.len() as u64))?;
            Ok((store.has(&root)?, size))
        })
        .await?;
        let error = (!has_root).then(|| RetrievalError::RootNotInPiece { piece: *piece, root }.to_string());
        Ok(QueryOffer {
            min_price: self.price,
            size,
            error,
        })
    }

    async fn subscribe_events(&self) -> RetrievalResult<broadcast::Receiver<RetrievalEvent>> {
        Ok(self.events.subscribe())
    }

    async fn submit_retrieval(&self, order: &RetrievalOrder) -> RetrievalResult<DealId> {
        let deal_id = DealId(self.next_deal.fetch_add(1, Ordering::SeqCst));
        info!(%deal_id, root = %order.root, piece = %order.piece_cid, "retrieval submitted");

        if !order.price_ceiling.allows(self.price) {
            self.track(update(
                deal_id,
                DealStatus::Rejected,
                ClientEvent::DealRejected,
                0,
                TokenAmount::zero(),
                Some(format!("price {} above ceiling {}", self.price, order.price_ceiling)),
            ));
            return Ok(deal_id);
        }

        self.track(update(
            deal_id,
            DealStatus::Accepted,
            ClientEvent::DealAccepted,
            0,
            TokenAmount::zero(),
            None,
        ));
        let dir = self.pieces_dir.clone();
        let events = self.events.clone();
        let deals = self.deals.clone();
        let price = self.price;
        let order = order.clone();
        tokio::spawn(async move {
            match load_and_prepare(dir, order).await {
                Ok(ready) => {
                    let bytes: u64 = ready.blocks.iter().map(|b| b.len() as u64).sum();
                    let blocks = ready.blocks.len();
                    {
                        let mut tracked = deals.lock().expect("lock poisoned");
                        let Some(deal) = tracked.get_mut(&deal_id) else {
                            debug!(%deal_id, "deal cancelled during preparation");
                            return;
                        };
                        deal.ready = Some(ready);
                    }
                    debug!(%deal_id, blocks, bytes, "deal prepared");
                    record(
                        &deals,
                        &events,
                        update(deal_id, DealStatus::Ongoing, ClientEvent::BlocksReceived, bytes, TokenAmount::zero(), None),
                    );
                    record(
                        &deals,
                        &events,
                        update(deal_id, DealStatus::Completed, ClientEvent::Complete, bytes, price, None),
                    );
                }
                Err(e) => {
                    warn!(%deal_id, error = %e, "deal failed");
                    let status = match e {
                        RetrievalError::NotFound(_) => DealStatus::DealNotFound,
                        _ => DealStatus::Errored,
                    };
                    record(
                        &deals,
                        &events,
                        update(deal_id, status, ClientEvent::DataTransferError, 0, TokenAmount::zero(), Some(e.to_string())),
                    );
                }
            }
        });
        Ok(deal_id)
    }

    async fn cancel_retrieval(&self, deal_id: DealId) -> RetrievalResult<()> {
        self.deals.lock().expect("lock poisoned").remove(&deal_id);
        let _ = self.events.send(update(
            deal_id,
            DealStatus::Cancelled,
            ClientEvent::CancelComplete,
            0,
            TokenAmount::zero(),
            None,
        ));
        Ok(())
    }

    async fn deal_status(&self, deal_id: DealId) -> RetrievalResult<Option<RetrievalEvent>> {
        Ok(self
            .deals
            .lock()
            .expect("lock poisoned")
            .get(&deal_id)
            .map(|tracked| tracked.latest.clone()))
    }

    /// A local provider is reachable when its pieces directory is.
    async fn ping(&self, provider: &ProviderAddress) -> RetrievalResult<Duration> {
        let started = Instant::now();
        let failed = |reason: String| RetrievalError::PingFailed {
            provider: provider.clone(),
            reason,
        };
        let meta = tokio::fs::metadata(&self.pieces_dir)
            .await
            .map_err(|e| failed(format!("{}: {e}", self.pieces_dir.display())))?;
        if !meta.is_dir() {
            return Err(failed(format!("{} is not a directory", self.pieces_dir.display())));
        }
        Ok(started.elapsed())
    }

    async fn export_archive(
        &self,
        _order: &RetrievalOrder,
        export: &ExportRef,
    ) -> RetrievalResult<ArchiveStream> {
        let ready = {
            let mut deals = self.deals.lock().expect("lock poisoned");
            match deals.get_mut(&export.deal_id).and_then(|tracked| tracked.ready.take()) {
                Some(ready) => {
                    deals.remove(&export.deal_id);
                    ready
                }
                None => return Err(RetrievalError::UnknownDeal(export.deal_id)),
            }
        };

        let mut writer = CarWriter::new(ready.root);
        for block in &ready.blocks {
            writer.add_block(block);
        }
        let archive = Bytes::from(writer.finish()?);
        let chunks: Vec<RetrievalResult<Bytes>> = (0..archive.len())
            .step_by(EXPORT_CHUNK)
            .map(|start| Ok(archive.slice(start..archive.len().min(start + EXPORT_CHUNK))))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

#[async_trait]
impl ChainService for LocalProvider {
    async fn storage_deal(&self, id: DealId) -> RetrievalResult<StorageDeal> {
        self.chain
            .deals
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| RetrievalError::NotFound(format!("deal {id}")))
    }

    async fn miner_sectors(&self, provider: &ProviderAddress) -> RetrievalResult<Vec<SectorInfo>> {
        self.chain
            .sectors
            .get(provider.as_str())
            .cloned()
            .ok_or_else(|| RetrievalError::NotFound(format!("miner {provider}")))
    }

    async fn market_participants(&self) -> RetrievalResult<Vec<MarketParticipant>> {
        Ok(self.chain.participants.clone())
    }

    async fn client_deals(&self) -> RetrievalResult<Vec<ClientDeal>> {
        Ok(self.chain.client_deals.clone())
    }
}

impl std::fmt::Debug for LocalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProvider")
            .field("pieces_dir", &self.pieces_dir)
            .field("price", &self.price)
            .field("deals", &self.chain.deals.len())
            .field("deal_ttl", &self.deal_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalConfig;
    use crate::fetcher::{Fetcher, Target};
    use crate::types::{DealProposal, PriceCeiling};
    use dagex_dag::DagBuilder;
    use dagex_selector::{compile_path, presets, walk};
    use dagex_store::MemoryBlockStore;
    use dagex_types::Codec;

    struct Fixture {
        _dir: tempfile::TempDir,
        config: LocalProviderConfig,
        piece: Cid,
        root: Cid,
        children: Vec<Cid>,
    }

    /// A piece holding a directory of three small files.
    fn fixture(price: TokenAmount) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryBlockStore::new());
        let dag = DagService::new(store);
        let builder = DagBuilder::new(dag.clone());
        let files: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| builder.add_file(format!("contents of {name}").into_bytes()).unwrap())
            .collect();
        let entries = files.iter().zip(["a.txt", "b.txt", "c.txt"]).map(|(f, n)| f.link(n)).collect();
        let root = builder.add_directory(entries).unwrap();

        let piece = Block::encode(Codec::RAW, &b"piece"[..]).cid;
        let mut writer = CarWriter::new(root.cid);
        for block in walk(&dag, &root.cid, &presets::full_export()).unwrap() {
            writer.add_block(&block);
        }
        std::fs::write(piece_path(dir.path(), &piece), writer.finish().unwrap()).unwrap();

        Fixture {
            config: LocalProviderConfig {
                pieces_dir: dir.path().to_path_buf(),
                price,
                deals_file: None,
            },
            _dir: dir,
            piece,
            root: root.cid,
            children: files.iter().map(|f| f.cid).collect(),
        }
    }

    fn provider() -> ProviderAddress {
        ProviderAddress::parse("f01000").unwrap()
    }

    #[tokio::test]
    async fn offer_for_known_root() {
        let fx = fixture(TokenAmount::from_atto(5));
        let local = LocalProvider::new(&fx.config).unwrap();
        let offer = local.query_offer(&provider(), &fx.root, &fx.piece).await.unwrap();
        assert!(offer.error.is_none());
        assert_eq!(offer.min_price, TokenAmount::from_atto(5));
        assert!(offer.size > 0);
    }

    #[tokio::test]
    async fn offer_for_missing_piece_carries_error() {
        let fx = fixture(TokenAmount::zero());
        let local = LocalProvider::new(&fx.config).unwrap();
        let offer = local.query_offer(&provider(), &fx.root, &fx.root).await.unwrap();
        assert!(offer.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn path_retrieval_exports_only_walked_blocks() {
        let fx = fixture(TokenAmount::zero());
        let local = Arc::new(LocalProvider::new(&fx.config).unwrap());
        let fetcher = Fetcher::new(local, RetrievalConfig::default());
        let target = Target {
            provider: provider(),
            piece_cid: fx.piece,
            root: fx.root,
        };
        let selector = compile_path("Links/1/Hash", presets::head()).unwrap();
        let retrieved = fetcher.fetch_dag(&target, &selector).await.unwrap();

        assert_eq!(retrieved.root, fx.children[1]);
        assert!(retrieved.dag.has(&fx.root).unwrap());
        assert!(retrieved.dag.has(&fx.children[1]).unwrap());
        assert!(!retrieved.dag.has(&fx.children[0]).unwrap());
    }

    #[tokio::test]
    async fn paid_piece_with_free_ceiling_is_rejected() {
        let fx = fixture(TokenAmount::from_atto(10));
        let local = Arc::new(LocalProvider::new(&fx.config).unwrap());
        let fetcher = Fetcher::new(local, RetrievalConfig::default());
        let target = Target {
            provider: provider(),
            piece_cid: fx.piece,
            root: fx.root,
        };
        let err = fetcher.fetch_dag(&target, &presets::head()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::PriceExceeded { .. }));
    }

    #[tokio::test]
    async fn paid_piece_with_unlimited_ceiling_completes() {
        let fx = fixture(TokenAmount::from_atto(10));
        let local = Arc::new(LocalProvider::new(&fx.config).unwrap());
        let config = RetrievalConfig {
            price_ceiling: PriceCeiling::Unlimited,
            ..RetrievalConfig::default()
        };
        let target = Target {
            provider: provider(),
            piece_cid: fx.piece,
            root: fx.root,
        };
        let retrieved = Fetcher::new(local, config)
            .fetch_dag(&target, &presets::full_export())
            .await
            .unwrap();
        assert_eq!(retrieved.root, fx.root);
        for child in &fx.children {
            assert!(retrieved.dag.has(child).unwrap());
        }
    }

    #[tokio::test]
    async fn selector_matching_nothing_fails_the_deal() {
        let fx = fixture(TokenAmount::zero());
        let local = Arc::new(LocalProvider::new(&fx.config).unwrap());
        let fetcher = Fetcher::new(local, RetrievalConfig::default());
        let target = Target {
            provider: provider(),
            piece_cid: fx.piece,
            root: fx.root,
        };
        let selector = compile_path("Links/7/Hash", presets::head()).unwrap();
        let err = fetcher.fetch_dag(&target, &selector).await.unwrap_err();
        assert!(matches!(err, RetrievalError::DealNotFound(_)), "{err}");
    }

    #[tokio::test]
    async fn export_is_single_use() {
        let fx = fixture(TokenAmount::zero());
        let local = LocalProvider::new(&fx.config).unwrap();
        let err = local
            .export_archive(
                &crate::negotiator::tests::order(PriceCeiling::default()),
                &ExportRef {
                    root: fx.root,
                    deal_id: DealId(99),
                },
            )
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RetrievalError::UnknownDeal(DealId(99))));
    }

    #[tokio::test]
    async fn chain_view_from_deals_file() {
        let fx = fixture(TokenAmount::zero());
        let snapshot = ChainSnapshot {
            deals: vec![StorageDeal {
                id: DealId(42),
                proposal: DealProposal {
                    piece_cid: fx.piece,
                    piece_size: 2048,
                    verified: true,
                    client: "f0100".into(),
                    provider: provider(),
                    label: fx.root.to_string(),
                    start_epoch: 10,
                    end_epoch: 20,
                    storage_price_per_epoch: TokenAmount::zero(),
                },
            }],
            sectors: BTreeMap::from([(
                "f01000".to_string(),
                vec![SectorInfo {
                    sector_number: 1,
                    deal_ids: vec![DealId(42)],
                }],
            )]),
            participants: vec![MarketParticipant {
                address: provider(),
                locked: TokenAmount::from_atto(7),
                miner: true,
            }],
            client_deals: Vec::new(),
        };
        let deals_file = fx.config.pieces_dir.join("deals.json");
        std::fs::write(&deals_file, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let config = LocalProviderConfig {
            deals_file: Some(deals_file),
            ..fx.config.clone()
        };
        let local = LocalProvider::new(&config).unwrap();
        assert_eq!(local.storage_deal(DealId(42)).await.unwrap().proposal.piece_cid, fx.piece);
        assert!(matches!(
            local.storage_deal(DealId(1)).await,
            Err(RetrievalError::NotFound(_))
        ));
        assert_eq!(local.miner_sectors(&provider()).await.unwrap().len(), 1);
        assert_eq!(local.market_participants().await.unwrap().len(), 1);
        assert!(local.client_deals().await.unwrap().is_empty());
    }

    fn full_order(fx: &Fixture) -> RetrievalOrder {
        RetrievalOrder {
            provider: provider(),
            piece_cid: fx.piece,
            root: fx.root,
            selector: presets::full_export().to_json_string(),
            price_ceiling: PriceCeiling::default(),
            payer: None,
        }
    }

    async fn wait_for(
        events: &mut broadcast::Receiver<RetrievalEvent>,
        deal_id: DealId,
        status: DealStatus,
    ) -> RetrievalEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let event = events.recv().await.unwrap();
                if event.deal_id == deal_id && event.status == status {
                    return event;
                }
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn cancel_before_preparation_leaves_nothing_behind() {
        let fx = fixture(TokenAmount::zero());
        let local = LocalProvider::new(&fx.config).unwrap();
        let mut events = local.subscribe_events().await.unwrap();
        let order = full_order(&fx);

        // The current-thread runtime has not polled the preparation task yet.
        let deal_id = local.submit_retrieval(&order).await.unwrap();
        local.cancel_retrieval(deal_id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event.status);
        }
        assert_eq!(seen, vec![DealStatus::Accepted, DealStatus::Cancelled]);
        assert_eq!(local.tracked_deals(), 0);
        assert!(local.deal_status(deal_id).await.unwrap().is_none());
        let export = ExportRef { root: fx.root, deal_id };
        assert!(matches!(
            local.export_archive(&order, &export).await.err(),
            Some(RetrievalError::UnknownDeal(_))
        ));
    }

    #[tokio::test]
    async fn unexported_deals_expire() {
        let fx = fixture(TokenAmount::zero());
        let local = LocalProvider::new(&fx.config).unwrap().with_deal_ttl(Duration::ZERO);
        let mut events = local.subscribe_events().await.unwrap();
        let order = full_order(&fx);

        let stale = local.submit_retrieval(&order).await.unwrap();
        wait_for(&mut events, stale, DealStatus::Completed).await;
        let fresh = local.submit_retrieval(&order).await.unwrap();

        assert_eq!(local.tracked_deals(), 1);
        let export = ExportRef { root: fx.root, deal_id: stale };
        assert!(matches!(
            local.export_archive(&order, &export).await.err(),
            Some(RetrievalError::UnknownDeal(_))
        ));
        assert!(local.deal_status(fresh).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deal_status_reports_latest_update() {
        let fx = fixture(TokenAmount::from_atto(3));
        let local = LocalProvider::new(&fx.config).unwrap();
        let mut events = local.subscribe_events().await.unwrap();
        let order = RetrievalOrder {
            price_ceiling: PriceCeiling::Unlimited,
            ..full_order(&fx)
        };

        let deal_id = local.submit_retrieval(&order).await.unwrap();
        let completed = wait_for(&mut events, deal_id, DealStatus::Completed).await;
        let latest = local.deal_status(deal_id).await.unwrap().unwrap();
        assert_eq!(latest, completed);
        assert_eq!(latest.total_paid, TokenAmount::from_atto(3));

        let export = ExportRef { root: fx.root, deal_id };
        assert!(local.export_archive(&order, &export).await.is_ok());
        assert_eq!(local.tracked_deals(), 0);
    }

    #[tokio::test]
    async fn ping_checks_pieces_dir() {
        let fx = fixture(TokenAmount::zero());
        let local = LocalProvider::new(&fx.config).unwrap();
        assert!(local.ping(&provider()).await.is_ok());

        let gone = LocalProviderConfig {
            pieces_dir: fx.config.pieces_dir.join("missing"),
            ..fx.config.clone()
        };
        let err = LocalProvider::new(&gone).unwrap().ping(&provider()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::PingFailed { .. }), "{err}");
    }
}
