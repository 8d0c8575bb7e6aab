//! Persisted types for the oracle engine (§3 "Oracle").

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Decimal;
use meridian_kv::{Item, Map};
use meridian_types::Height;

#[cw_serde]
pub struct Params {
    pub vote_window_blocks: u64,
    pub vote_threshold_bps: u64,
    /// Max allowed deviation, in bps, of an individual submission from the
    /// aggregated price before it is classified "bad data" (§4.4 step 6).
    pub reward_band_bps: u64,
    pub slash_fraction_miss: Decimal,
    pub slash_fraction_bad_data: Decimal,
    pub miss_window: u64,
    pub max_misses: u64,
    /// Supplemented (SPEC_FULL.md §3.1): sanity-band multiple used by
    /// `SubmitPrice` against the last aggregated price.
    pub extreme_ratio: Decimal,
    /// Supplemented (SPEC_FULL.md §3.1): number of trailing blocks the
    /// `twap` query averages over by default.
    pub twap_window: u64,
}

#[cw_serde]
pub struct ValidatorPrice {
    pub validator: String,
    pub asset: String,
    pub price: Decimal,
    pub height: Height,
}

#[cw_serde]
pub struct AggregatedPrice {
    pub asset: String,
    pub price: Decimal,
    pub height: Height,
    pub block_time: u64,
}

#[cw_serde]
pub struct PriceSnapshot {
    pub asset: String,
    pub height: Height,
    pub price: Decimal,
}

#[cw_serde]
pub struct FeederDelegation {
    pub validator: String,
    pub feeder: String,
}

#[cw_serde]
pub struct ValidatorMissCounter {
    pub validator: String,
    pub miss_streak: u64,
    pub last_active_height: Height,
    /// Height of the last window boundary this validator was charged a
    /// miss at, kept for observability rather than scoring (§4.4).
    pub last_missed_height: Height,
}

impl ValidatorMissCounter {
    pub fn fresh(validator: &str) -> Self {
        Self {
            validator: validator.to_string(),
            miss_streak: 0,
            last_active_height: 0,
            last_missed_height: 0,
        }
    }
}

pub const PARAMS: Item<Params> = Item::new("oracle__params");
/// Keyed `(asset, validator)` so EndBlock aggregation can range-scan one
/// asset's submissions as a contiguous byte-lexicographic slice (§5).
pub const VALIDATOR_PRICES: Map<(&str, &str), ValidatorPrice> = Map::new("oracle__validator_prices");
pub const AGGREGATED_PRICES: Map<&str, AggregatedPrice> = Map::new("oracle__aggregated_prices");
pub const DELEGATIONS: Map<&str, FeederDelegation> = Map::new("oracle__delegations");
/// Reverse index of `DELEGATIONS`, keyed by feeder, maintained in lockstep.
pub const FEEDER_INDEX: Map<&str, String> = Map::new("oracle__feeder_index");
pub const MISS_COUNTERS: Map<&str, ValidatorMissCounter> = Map::new("oracle__miss_counters");
