//! Persisted types for the compute engine (§3 "Compute").

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Uint128};
use meridian_kv::{Item, Map};
use meridian_types::Height;

/// Weights for the Bayesian-style reputation blend (§4.5 "Reputation update
/// ... tunable weights"). Exposed as a governance parameter rather than a
/// hard-coded constant, per the Open Question resolution in §9.
#[cw_serde]
pub struct ReputationWeights {
    pub reliability_bps: u64,
    pub accuracy_bps: u64,
    pub speed_bps: u64,
    pub availability_bps: u64,
}

impl ReputationWeights {
    /// The defaults named in §4.5: reliability 40%, accuracy 30%,
    /// speed 20%, availability 10%.
    pub fn defaults() -> Self {
        Self {
            reliability_bps: 4_000,
            accuracy_bps: 3_000,
            speed_bps: 2_000,
            availability_bps: 1_000,
        }
    }
}

#[cw_serde]
pub struct Params {
    pub min_stake: Uint128,
    pub min_reputation_floor: u64,
    pub challenge_window: u64,
    pub slash_fraction_result: cosmwasm_std::Decimal,
    pub failure_rate_threshold_bps: u64,
    pub verification_pass_threshold: u64,
    pub reputation_weights: ReputationWeights,
}

#[cw_serde]
#[derive(Copy, PartialOrd, Ord, Eq)]
pub enum ProviderStatus {
    Active,
    Paused,
    Slashed,
}

#[cw_serde]
pub struct Provider {
    pub address: String,
    pub endpoint: String,
    pub price_per_unit: Uint128,
    pub stake: Uint128,
    pub status: ProviderStatus,
    pub reputation_score: u64,
    pub completed: u64,
    pub failed: u64,
    pub public_key: Binary,
    /// Supplemented (SPEC_FULL.md §3.1): last height this provider's
    /// registration was touched by `UpdateProvider` or a successful
    /// assignment; used to weight the availability signal in reputation
    /// updates.
    pub last_heartbeat_height: Height,
}

#[cw_serde]
#[derive(Copy, PartialOrd, Ord, Eq)]
pub enum RequestStatus {
    Pending,
    Assigned,
    Processing,
    Challenged,
    Completed,
    Failed,
    Cancelled,
}

#[cw_serde]
pub struct Request {
    pub id: u64,
    pub requester: String,
    pub provider: Option<String>,
    pub payload: Binary,
    pub max_price: Uint128,
    pub deadline_height: Height,
    pub status: RequestStatus,
    pub escrow_amount: Uint128,
    pub nonce: u64,
}

#[cw_serde]
pub struct ResultRecord {
    pub request_id: u64,
    pub provider_signature: Binary,
    pub result_hash: Binary,
    pub proof_blob: Binary,
    pub submitted_at: Height,
    pub verification_score: u64,
}

#[cw_serde]
#[derive(Copy, PartialOrd, Ord, Eq)]
pub enum EscrowState {
    Locked,
    Challenged,
    Released,
    Refunded,
}

#[cw_serde]
pub struct Escrow {
    pub request_id: u64,
    pub amount: Uint128,
    pub state: EscrowState,
    pub locked_at: Height,
    pub challenge_end_height: Height,
    /// Exactly one of `released_at`/`refunded_at` is set once the request
    /// reaches a terminal state (§3 "Compute").
    pub released_at: Option<Height>,
    pub refunded_at: Option<Height>,
}

pub const PARAMS: Item<Params> = Item::new("compute__params");
pub const NEXT_REQUEST_ID: Item<u64> = Item::new("compute__next_request_id");
pub const PROVIDERS: Map<&str, Provider> = Map::new("compute__providers");
pub const REQUESTS: Map<u64, Request> = Map::new("compute__requests");
pub const RESULTS: Map<u64, ResultRecord> = Map::new("compute__results");
pub const ESCROWS: Map<u64, Escrow> = Map::new("compute__escrows");
/// Global used-nonce set (§3 "A `(provider,nonce)` pair is used at most
/// once"). A request's nonce is bound to whichever provider it is
/// eventually assigned to by `SubmitResult`'s signature check, so rejecting
/// a bare nonce reuse at `SubmitRequest` time is the simplest invariant
/// that implies the narrower per-provider one.
pub const USED_NONCES: Map<u64, bool> = Map::new("compute__used_nonces");
/// Count of requests currently assigned to a provider (ASSIGNED,
/// PROCESSING or CHALLENGED); `DeregisterProvider` refuses to run while
/// this is nonzero.
pub const PROVIDER_ACTIVE_REQUESTS: Map<&str, u64> = Map::new("compute__provider_active_requests");
