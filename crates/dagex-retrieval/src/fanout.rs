//! Bounded concurrent lookups of sector deals.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use cid::Cid;
use dagex_types::DealId;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::service::ChainService;
use crate::types::SectorInfo;

/// All deal ids packed into `sectors`, in sector order.
pub fn sector_deals(sectors: &[SectorInfo]) -> Vec<DealId> {
    sectors
        .iter()
        .flat_map(|s| s.deal_ids.iter().copied())
        .collect()
}

/// Look up the piece CID of every deal, at most `concurrency` at a time.
///
/// All lookups run to completion before this returns. A failed lookup is
/// left out of the result rather than failing the whole set.
pub async fn piece_cids(
    chain: Arc<dyn ChainService>,
    deals: Vec<DealId>,
    concurrency: usize,
) -> BTreeMap<DealId, Cid> {
    let results = Arc::new(Mutex::new(BTreeMap::new()));
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for deal in deals {
        let chain = chain.clone();
        let results = results.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            match chain.storage_deal(deal).await {
                Ok(found) => {
                    results
                        .lock()
                        .expect("lock poisoned")
                        .insert(deal, found.proposal.piece_cid);
                }
                Err(e) => debug!(%deal, error = %e, "skipping deal lookup"),
            }
        });
    }
    while tasks.join_next().await.is_some() {}

    let mut results = results.lock().expect("lock poisoned");
    std::mem::take(&mut *results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RetrievalError, RetrievalResult};
    use crate::types::{ClientDeal, DealProposal, MarketParticipant, StorageDeal};
    use async_trait::async_trait;
    use dagex_store::Block;
    use dagex_types::{Codec, ProviderAddress, TokenAmount};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Odd deal ids fail; tracks peak concurrency.
    struct Chain {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    fn piece(id: u64) -> Cid {
        Block::encode(Codec::RAW, id.to_be_bytes().to_vec()).cid
    }

    #[async_trait]
    impl ChainService for Chain {
        async fn storage_deal(&self, id: DealId) -> RetrievalResult<StorageDeal> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            if id.get() % 2 == 1 {
                return Err(RetrievalError::NotFound(format!("deal {id}")));
            }
            Ok(StorageDeal {
                id,
                proposal: DealProposal {
                    piece_cid: piece(id.get()),
                    piece_size: 2048,
                    verified: false,
                    client: "f0100".into(),
                    provider: ProviderAddress::parse("f01000").unwrap(),
                    label: String::new(),
                    start_epoch: 0,
                    end_epoch: 100,
                    storage_price_per_epoch: TokenAmount::zero(),
                },
            })
        }

        async fn miner_sectors(&self, _: &ProviderAddress) -> RetrievalResult<Vec<SectorInfo>> {
            Ok(vec![])
        }

        async fn market_participants(&self) -> RetrievalResult<Vec<MarketParticipant>> {
            Ok(vec![])
        }

        async fn client_deals(&self) -> RetrievalResult<Vec<ClientDeal>> {
            Ok(vec![])
        }
    }

    #[test]
    fn deals_flatten_in_order() {
        let sectors = vec![
            SectorInfo { sector_number: 1, deal_ids: vec![DealId(4), DealId(5)] },
            SectorInfo { sector_number: 2, deal_ids: vec![] },
            SectorInfo { sector_number: 3, deal_ids: vec![DealId(1)] },
        ];
        assert_eq!(sector_deals(&sectors), vec![DealId(4), DealId(5), DealId(1)]);
    }

    #[tokio::test]
    async fn failures_are_skipped_and_concurrency_bounded() {
        let chain = Arc::new(Chain {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let deals = (0..20).map(DealId).collect();
        let found = piece_cids(chain.clone(), deals, 4).await;

        assert_eq!(found.len(), 10);
        assert!(found.keys().all(|d| d.get() % 2 == 0));
        assert_eq!(found[&DealId(6)], piece(6));
        assert!(chain.peak.load(Ordering::SeqCst) <= 4);
    }
}
