//! Service boundaries consumed by the negotiator.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use dagex_types::{DealId, ProviderAddress};
use futures::stream::BoxStream;
use tokio::sync::broadcast;

use crate::error::RetrievalResult;
use crate::types::{
    ClientDeal, ExportRef, MarketParticipant, ProviderInfo, QueryOffer, RetrievalEvent,
    RetrievalOrder, SectorInfo, StorageDeal,
};

/// Archive bytes as they arrive from a provider.
pub type ArchiveStream = BoxStream<'static, RetrievalResult<Bytes>>;

/// Deal negotiation and data transfer with storage providers.
///
/// Payment and transport are the implementation's concern. Events for all
/// deals arrive on one shared stream; subscribers filter by deal id.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn provider_info(&self, provider: &ProviderAddress) -> RetrievalResult<ProviderInfo>;

    async fn query_offer(
        &self,
        provider: &ProviderAddress,
        root: &Cid,
        piece: &Cid,
    ) -> RetrievalResult<QueryOffer>;

    /// Open a subscription. Must be called before [`Self::submit_retrieval`]
    /// so no event for the new deal is missed.
    async fn subscribe_events(&self) -> RetrievalResult<broadcast::Receiver<RetrievalEvent>>;

    async fn submit_retrieval(&self, order: &RetrievalOrder) -> RetrievalResult<DealId>;

    async fn cancel_retrieval(&self, deal_id: DealId) -> RetrievalResult<()>;

    /// Latest update of a deal the service still tracks. Subscribers that
    /// fell behind on the event stream resynchronise through this.
    async fn deal_status(&self, deal_id: DealId) -> RetrievalResult<Option<RetrievalEvent>>;

    /// Connect to the provider and measure one round trip.
    async fn ping(&self, provider: &ProviderAddress) -> RetrievalResult<Duration>;

    /// Stream the verified archive of a completed retrieval. The archive
    /// carries exactly one root.
    async fn export_archive(
        &self,
        order: &RetrievalOrder,
        export: &ExportRef,
    ) -> RetrievalResult<ArchiveStream>;
}

/// Read-only chain state.
#[async_trait]
pub trait ChainService: Send + Sync {
    async fn storage_deal(&self, id: DealId) -> RetrievalResult<StorageDeal>;

    async fn miner_sectors(&self, provider: &ProviderAddress) -> RetrievalResult<Vec<SectorInfo>>;

    /// Every storage market participant with its escrow balance.
    async fn market_participants(&self) -> RetrievalResult<Vec<MarketParticipant>>;

    /// Storage deals made by this client.
    async fn client_deals(&self) -> RetrievalResult<Vec<ClientDeal>>;
}
