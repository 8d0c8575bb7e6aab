//! Persisted types for the DEX engine (§3 "DEX"). Reserves and shares are
//! plain integers; the pair index keeps the unordered `(tokenA, tokenB)`
//! to `poolId` mapping normalized so at most one pool can ever exist per
//! pair, mirroring the teacher's single-pair-per-`PairInfo` invariant.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;
use meridian_kv::{Item, Map};
use meridian_types::Height;

#[cw_serde]
pub struct Pool {
    pub id: u64,
    pub token_a: String,
    pub token_b: String,
    pub reserve_a: Uint128,
    pub reserve_b: Uint128,
    pub total_shares: Uint128,
    pub lp_fee_bps: u64,
    pub protocol_fee_bps: u64,
    pub created_at: Height,
    pub last_trade_height: Height,
    /// Supplemented accumulator (SPEC_FULL.md §3.1): protocol-fee portion
    /// of every swap, held aside from the reserves until an explicit
    /// `sweep_protocol_fees` call pays it out.
    pub protocol_fee_accrued_a: Uint128,
    pub protocol_fee_accrued_b: Uint128,
}

impl Pool {
    pub fn is_empty(&self) -> bool {
        self.total_shares.is_zero()
    }
}

#[cw_serde]
pub struct LiquidityPosition {
    pub pool_id: u64,
    pub owner: String,
    pub shares: Uint128,
}

/// Normalizes a token pair into lexicographic order so the index below is
/// keyed consistently regardless of the order the caller names them in.
pub fn normalize_pair(token_a: &str, token_b: &str) -> (String, String) {
    if token_a <= token_b {
        (token_a.to_string(), token_b.to_string())
    } else {
        (token_b.to_string(), token_a.to_string())
    }
}

pub const NEXT_POOL_ID: Item<u64> = Item::new("dex__next_pool_id");
pub const POOLS: Map<u64, Pool> = Map::new("dex__pools");
/// Keyed by the normalized pair; at most one pool per unordered pair (§3).
pub const PAIR_INDEX: Map<(&str, &str), u64> = Map::new("dex__pair_index");
/// Keyed by `(poolId, owner)`; a position is removed once its shares hit
/// zero rather than left behind as a zero-share record.
pub const POSITIONS: Map<(u64, &str), LiquidityPosition> = Map::new("dex__positions");
