use std::fmt;
use std::str::FromStr;

use cid::Cid;
use dagex_types::codec::cid_string;
use dagex_types::{DealId, ProviderAddress, TokenAmount, TypeError};
use serde::{Deserialize, Serialize};

/// The highest price a retrieval may be quoted.
///
/// `Limit(0)` accepts only free retrievals. `Unlimited` is the explicit
/// "any price" setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PriceCeiling {
    Limit(TokenAmount),
    Unlimited,
}

impl PriceCeiling {
    pub fn allows(&self, price: TokenAmount) -> bool {
        match self {
            PriceCeiling::Limit(max) => price <= *max,
            PriceCeiling::Unlimited => true,
        }
    }
}

impl Default for PriceCeiling {
    fn default() -> Self {
        PriceCeiling::Limit(TokenAmount::zero())
    }
}

impl fmt::Display for PriceCeiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceCeiling::Limit(max) => write!(f, "{max}"),
            PriceCeiling::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// `any` or an attoFIL integer.
impl FromStr for PriceCeiling {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "any" | "unlimited" => Ok(PriceCeiling::Unlimited),
            other => other.parse().map(PriceCeiling::Limit),
        }
    }
}

impl TryFrom<String> for PriceCeiling {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PriceCeiling> for String {
    fn from(ceiling: PriceCeiling) -> Self {
        match ceiling {
            PriceCeiling::Limit(max) => String::from(max),
            PriceCeiling::Unlimited => "any".into(),
        }
    }
}

/// One retrieval attempt. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievalOrder {
    pub provider: ProviderAddress,
    pub piece_cid: Cid,
    pub root: Cid,
    /// DAG-JSON encoded selector.
    pub selector: String,
    pub price_ceiling: PriceCeiling,
    pub payer: Option<String>,
}

/// A provider's quote for a retrieval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOffer {
    pub min_price: TokenAmount,
    pub size: u64,
    /// Set when the provider cannot serve the request.
    pub error: Option<String>,
}

/// How to reach a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub peer_id: String,
    pub multiaddrs: Vec<String>,
}

/// Handle to a completed retrieval, used to export its archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportRef {
    pub root: Cid,
    pub deal_id: DealId,
}

/// Status of a retrieval deal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealStatus {
    New,
    WaitForAcceptance,
    PaymentChannelCreating,
    PaymentChannelAddingFunds,
    Accepted,
    Ongoing,
    FundsNeeded,
    SendFunds,
    FundsNeededLastPayment,
    BlocksComplete,
    Finalizing,
    Completed,
    Rejected,
    DealNotFound,
    Errored,
    Cancelling,
    Cancelled,
}

impl DealStatus {
    /// Canonical name, e.g. `DealStatusCompleted`.
    pub fn name(&self) -> &'static str {
        match self {
            DealStatus::New => "DealStatusNew",
            DealStatus::WaitForAcceptance => "DealStatusWaitForAcceptance",
            DealStatus::PaymentChannelCreating => "DealStatusPaymentChannelCreating",
            DealStatus::PaymentChannelAddingFunds => "DealStatusPaymentChannelAddingFunds",
            DealStatus::Accepted => "DealStatusAccepted",
            DealStatus::Ongoing => "DealStatusOngoing",
            DealStatus::FundsNeeded => "DealStatusFundsNeeded",
            DealStatus::SendFunds => "DealStatusSendFunds",
            DealStatus::FundsNeededLastPayment => "DealStatusFundsNeededLastPayment",
            DealStatus::BlocksComplete => "DealStatusBlocksComplete",
            DealStatus::Finalizing => "DealStatusFinalizing",
            DealStatus::Completed => "DealStatusCompleted",
            DealStatus::Rejected => "DealStatusRejected",
            DealStatus::DealNotFound => "DealStatusDealNotFound",
            DealStatus::Errored => "DealStatusErrored",
            DealStatus::Cancelling => "DealStatusCancelling",
            DealStatus::Cancelled => "DealStatusCancelled",
        }
    }

    /// Name without the `DealStatus` prefix.
    pub fn short_name(&self) -> &'static str {
        let name = self.name();
        name.strip_prefix("DealStatus").unwrap_or(name)
    }
}

/// Client-side event that caused a status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientEvent {
    Open,
    DealProposed,
    DealRejected,
    DealNotFound,
    DealAccepted,
    PaymentChannelReady,
    BlocksReceived,
    AllBlocksReceived,
    PaymentRequested,
    PaymentSent,
    Complete,
    DataTransferError,
    Cancel,
    CancelComplete,
    ProviderCancelled,
}

impl ClientEvent {
    /// Canonical name, e.g. `ClientEventBlocksReceived`.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Open => "ClientEventOpen",
            ClientEvent::DealProposed => "ClientEventDealProposed",
            ClientEvent::DealRejected => "ClientEventDealRejected",
            ClientEvent::DealNotFound => "ClientEventDealNotFound",
            ClientEvent::DealAccepted => "ClientEventDealAccepted",
            ClientEvent::PaymentChannelReady => "ClientEventPaymentChannelReady",
            ClientEvent::BlocksReceived => "ClientEventBlocksReceived",
            ClientEvent::AllBlocksReceived => "ClientEventAllBlocksReceived",
            ClientEvent::PaymentRequested => "ClientEventPaymentRequested",
            ClientEvent::PaymentSent => "ClientEventPaymentSent",
            ClientEvent::Complete => "ClientEventComplete",
            ClientEvent::DataTransferError => "ClientEventDataTransferError",
            ClientEvent::Cancel => "ClientEventCancel",
            ClientEvent::CancelComplete => "ClientEventCancelComplete",
            ClientEvent::ProviderCancelled => "ClientEventProviderCancelled",
        }
    }

    /// Name without the `ClientEvent` prefix.
    pub fn short_name(&self) -> &'static str {
        let name = self.name();
        name.strip_prefix("ClientEvent").unwrap_or(name)
    }
}

/// One update on the shared retrieval event stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievalEvent {
    pub deal_id: DealId,
    pub status: DealStatus,
    pub event: Option<ClientEvent>,
    pub bytes_received: u64,
    pub total_paid: TokenAmount,
    pub message: Option<String>,
}

impl RetrievalEvent {
    /// Short event name; `New` when the update carries no event.
    pub fn event_name(&self) -> &'static str {
        self.event.map(|e| e.short_name()).unwrap_or("New")
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

/// Negotiation states, in the order a successful retrieval passes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NegotiationState {
    RequestingOffer,
    OfferReceived,
    PriceCheck,
    Submitted,
    Completed,
    Rejected,
    NotFound,
    Errored,
    Cancelled,
}

impl NegotiationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NegotiationState::Completed
                | NegotiationState::Rejected
                | NegotiationState::NotFound
                | NegotiationState::Errored
                | NegotiationState::Cancelled
        )
    }
}

/// On-chain storage deal proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealProposal {
    #[serde(with = "cid_string")]
    pub piece_cid: Cid,
    pub piece_size: u64,
    #[serde(default)]
    pub verified: bool,
    pub client: String,
    pub provider: ProviderAddress,
    /// Usually the payload root CID in string form.
    pub label: String,
    pub start_epoch: i64,
    pub end_epoch: i64,
    #[serde(default)]
    pub storage_price_per_epoch: TokenAmount,
}

/// On-chain storage deal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDeal {
    pub id: DealId,
    pub proposal: DealProposal,
}

/// A provider's sector and the deals packed into it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorInfo {
    pub sector_number: u64,
    #[serde(default)]
    pub deal_ids: Vec<DealId>,
}

/// Escrow balance of a storage market participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParticipant {
    pub address: ProviderAddress,
    pub locked: TokenAmount,
    /// Set when the address belongs to a storage miner actor.
    #[serde(default)]
    pub miner: bool,
}

/// Storage miners with locked collateral, most locked funds first.
pub fn storage_miners(mut participants: Vec<MarketParticipant>) -> Vec<MarketParticipant> {
    participants.retain(|p| p.miner && !p.locked.is_zero());
    participants.sort_by(|a, b| b.locked.cmp(&a.locked));
    participants
}

/// Deal state of an active storage deal.
pub const STORAGE_DEAL_ACTIVE: &str = "StorageDealActive";

/// A storage deal made by this client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDeal {
    #[serde(with = "cid_string")]
    pub proposal_cid: Cid,
    pub state: String,
    #[serde(default)]
    pub message: String,
    pub provider: ProviderAddress,
    #[serde(with = "cid_string")]
    pub root: Cid,
    #[serde(with = "cid_string")]
    pub piece_cid: Cid,
    pub size: u64,
    #[serde(default)]
    pub price_per_epoch: TokenAmount,
    pub duration: u64,
    /// On-chain id, once the deal is published.
    #[serde(default)]
    pub deal_id: Option<DealId>,
    #[serde(default)]
    pub verified: bool,
}

impl ClientDeal {
    pub fn is_active(&self) -> bool {
        self.state == STORAGE_DEAL_ACTIVE
    }
}
