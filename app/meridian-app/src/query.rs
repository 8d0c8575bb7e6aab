//! Read-only query endpoints, served off a committed snapshot (§6
//! "Query endpoints"). Queries never take `&mut dyn Storage` and never
//! consult the circuit breaker — a halted module still answers reads.

use cosmwasm_std::{Addr, Decimal, Storage, Uint128};

use meridian_breaker::BreakerState;
use meridian_compute::{Escrow, Provider, Request};
use meridian_dex::{LiquidityPosition, Pool};
use meridian_oracle::ValidatorMissCounter;
use meridian_types::Height;

use crate::error::{AppError, AppResult};

pub fn pool(store: &dyn Storage, pool_id: u64) -> AppResult<Pool> {
    Ok(meridian_dex::get_pool(store, pool_id)?)
}

pub fn position(store: &dyn Storage, pool_id: u64, owner: &Addr) -> AppResult<LiquidityPosition> {
    Ok(meridian_dex::get_position(store, pool_id, owner)?)
}

/// Looks a pool up by its (unordered) token pair, mirroring the DEX
/// engine's own pair index rather than linear-scanning every pool.
pub fn pool_by_pair(store: &dyn Storage, token_a: &str, token_b: &str) -> AppResult<Pool> {
    let (norm_a, norm_b) = meridian_dex::state::normalize_pair(token_a, token_b);
    let pool_id = meridian_dex::state::PAIR_INDEX
        .may_load(store, (norm_a.as_str(), norm_b.as_str()))
        .map_err(meridian_types::error::CoreError::from)?
        .ok_or(meridian_dex::DexError::PoolNotFound(0))?;
    pool(store, pool_id)
}

/// Constant-product quote with no state mutation: same formula `swap`
/// uses internally, read back out for a simulation query.
pub fn simulate_swap(store: &dyn Storage, pool_id: u64, token_in: &str, amount_in: Uint128) -> AppResult<Uint128> {
    let pool = meridian_dex::get_pool(store, pool_id)?;
    let (reserve_in, reserve_out) = if token_in == pool.token_a {
        (pool.reserve_a, pool.reserve_b)
    } else if token_in == pool.token_b {
        (pool.reserve_b, pool.reserve_a)
    } else {
        return Err(meridian_dex::DexError::UnknownToken(token_in.to_string()).into());
    };
    let total_fee_bps = pool.lp_fee_bps + pool.protocol_fee_bps;
    let amount_in_after_fee = meridian_math::mul_div(
        amount_in,
        Uint128::from(meridian_math::BPS_DENOMINATOR as u64 - total_fee_bps),
        Uint128::from(meridian_math::BPS_DENOMINATOR as u64),
    )?;
    let amount_out = meridian_math::mul_div(amount_in_after_fee, reserve_out, reserve_in + amount_in_after_fee)?;
    Ok(amount_out)
}

pub fn latest_price(store: &dyn Storage, asset: &str) -> AppResult<Option<Decimal>> {
    Ok(meridian_oracle::state::AGGREGATED_PRICES
        .may_load(store, asset)
        .map_err(meridian_types::error::CoreError::from)?
        .map(|p| p.price))
}

pub fn twap(store: &dyn Storage, asset: &str, window: Height) -> AppResult<Option<Decimal>> {
    Ok(meridian_oracle::twap(store, asset, window)?)
}

pub fn validator_miss_count(store: &dyn Storage, validator: &Addr) -> AppResult<u64> {
    let miss: Option<ValidatorMissCounter> = meridian_oracle::state::MISS_COUNTERS
        .may_load(store, validator.as_str())
        .map_err(meridian_types::error::CoreError::from)?;
    Ok(miss.map(|m| m.miss_streak).unwrap_or_default())
}

pub fn provider(store: &dyn Storage, address: &str) -> AppResult<Provider> {
    Ok(meridian_compute::get_provider(store, address)?)
}

pub fn request(store: &dyn Storage, request_id: u64) -> AppResult<Request> {
    Ok(meridian_compute::get_request(store, request_id)?)
}

pub fn escrow(store: &dyn Storage, request_id: u64) -> AppResult<Escrow> {
    meridian_compute::state::ESCROWS
        .may_load(store, request_id)
        .map_err(meridian_types::error::CoreError::from)?
        .ok_or(meridian_compute::ComputeError::RequestNotFound(request_id))
        .map_err(AppError::from)
}

pub fn breaker_state(store: &dyn Storage, module: &str, sub_id: &str) -> AppResult<Option<BreakerState>> {
    Ok(meridian_breaker::get_state(store, module, sub_id)?)
}

pub fn all_breaker_states(store: &dyn Storage) -> AppResult<Vec<BreakerState>> {
    Ok(meridian_breaker::get_all_states(store)?)
}
