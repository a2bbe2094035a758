//! The retrieval state machine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dagex_types::{size_str, DealId};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::error::{RetrievalError, RetrievalResult};
use crate::service::RetrievalService;
use crate::types::{DealStatus, ExportRef, NegotiationState, PriceCeiling, RetrievalOrder};

/// Drives one retrieval per call to a terminal outcome. Never retries.
#[derive(Clone)]
pub struct Negotiator {
    service: Arc<dyn RetrievalService>,
}

impl Negotiator {
    pub fn new(service: Arc<dyn RetrievalService>) -> Self {
        Self { service }
    }

    /// Negotiate and follow `order` until its deal completes.
    ///
    /// The price check happens before anything is submitted. Once the deal
    /// is submitted, hitting `timeout` (or dropping the returned future)
    /// requests cancellation of the deal in the background.
    pub async fn retrieve(
        &self,
        order: &RetrievalOrder,
        timeout: Duration,
    ) -> RetrievalResult<ExportRef> {
        let deadline = tokio::time::Instant::now() + timeout;
        transition(NegotiationState::RequestingOffer, order);

        let offer = self
            .service
            .query_offer(&order.provider, &order.root, &order.piece_cid)
            .await
            .map_err(|e| {
                transition(NegotiationState::Errored, order);
                RetrievalError::OfferFailed {
                    provider: order.provider.clone(),
                    reason: e.to_string(),
                }
            })?;
        transition(NegotiationState::OfferReceived, order);
        if let Some(reason) = offer.error {
            transition(NegotiationState::Rejected, order);
            return Err(RetrievalError::OfferRejected(reason));
        }

        transition(NegotiationState::PriceCheck, order);
        if order.price_ceiling == PriceCeiling::Unlimited {
            warn!(provider = %order.provider, min_price = %offer.min_price, "retrieving without a price ceiling");
        }
        if !order.price_ceiling.allows(offer.min_price) {
            transition(NegotiationState::Rejected, order);
            return Err(RetrievalError::PriceExceeded {
                ceiling: order.price_ceiling,
                min_price: offer.min_price,
            });
        }

        let mut events = self
            .service
            .subscribe_events()
            .await
            .map_err(|e| RetrievalError::SubscribeFailed(e.to_string()))?;
        let deal_id = self
            .service
            .submit_retrieval(order)
            .await
            .map_err(|e| RetrievalError::SubmitFailed(e.to_string()))?;
        transition(NegotiationState::Submitted, order);

        let mut guard = CancelOnDrop::new(self.service.clone(), deal_id);
        let started = Instant::now();
        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);

        loop {
            let event = tokio::select! {
                _ = &mut sleep => {
                    transition(NegotiationState::Cancelled, order);
                    return Err(RetrievalError::TimedOut { deal_id });
                }
                received = events.recv() => match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        // Our own terminal event may be among the skipped ones.
                        warn!(%deal_id, skipped, "retrieval event subscriber lagged, resynchronising");
                        match self.service.deal_status(deal_id).await? {
                            Some(current) => current,
                            None => continue,
                        }
                    }
                    Err(RecvError::Closed) => {
                        return Err(RetrievalError::EventStreamClosed(deal_id));
                    }
                },
            };
            if event.deal_id != deal_id {
                continue;
            }

            info!(
                %deal_id,
                received = %size_str(event.bytes_received),
                paid = %event.total_paid,
                event = event.event_name(),
                status = event.status.short_name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "retrieval progress"
            );

            match event.status {
                DealStatus::Completed => {
                    guard.disarm();
                    transition(NegotiationState::Completed, order);
                    return Ok(ExportRef {
                        root: order.root,
                        deal_id,
                    });
                }
                DealStatus::Rejected => {
                    guard.disarm();
                    transition(NegotiationState::Rejected, order);
                    return Err(RetrievalError::DealRejected(event.message().to_string()));
                }
                DealStatus::DealNotFound => {
                    guard.disarm();
                    transition(NegotiationState::NotFound, order);
                    return Err(RetrievalError::DealNotFound(event.message().to_string()));
                }
                DealStatus::Errored => {
                    guard.disarm();
                    transition(NegotiationState::Errored, order);
                    return Err(RetrievalError::DealErrored(event.message().to_string()));
                }
                _ => {}
            }
        }
    }
}

impl std::fmt::Debug for Negotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiator").finish_non_exhaustive()
    }
}

fn transition(state: NegotiationState, order: &RetrievalOrder) {
    if state.is_terminal() {
        info!(?state, provider = %order.provider, root = %order.root, "retrieval finished");
    } else {
        debug!(?state, provider = %order.provider, root = %order.root, "retrieval state");
    }
}

/// Requests cancellation of a deal when dropped, unless disarmed.
///
/// The request runs on its own task; the dropping caller never waits for it
/// and a failure is only logged.
struct CancelOnDrop {
    service: Arc<dyn RetrievalService>,
    deal_id: DealId,
    armed: bool,
}

impl CancelOnDrop {
    fn new(service: Arc<dyn RetrievalService>, deal_id: DealId) -> Self {
        Self {
            service,
            deal_id,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let deal_id = self.deal_id;
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(%deal_id, "no runtime to cancel retrieval deal");
            return;
        };
        let service = self.service.clone();
        handle.spawn(async move {
            if let Err(e) = service.cancel_retrieval(deal_id).await {
                error!(%deal_id, error = %e, "cancelling deal failed");
            }
        });
    }
}
