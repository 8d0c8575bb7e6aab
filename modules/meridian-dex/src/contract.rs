//! Public operations of the DEX engine (§4.3): `CreatePool`, `AddLiquidity`,
//! `RemoveLiquidity`, `Swap`, and the supplemented `SweepProtocolFees`.

use cosmwasm_std::{Addr, Decimal, Event, Storage, Uint128};

use meridian_math::{apply_bps, isqrt::isqrt_product, mul_div, BPS_DENOMINATOR};
use meridian_types::collaborators::BankKeeper;
use meridian_types::error::CoreError;
use meridian_types::event::module_event;
use meridian_types::Height;

use crate::error::{DexError, DexResult};
use crate::state::{
    normalize_pair, LiquidityPosition, Pool, NEXT_POOL_ID, PAIR_INDEX, POOLS, POSITIONS,
};

/// Default deviation threshold that opens a pool's breaker (§4.3): 20%.
pub const DEFAULT_DEVIATION_THRESHOLD_BPS: u64 = 2_000;
/// Default auto-resume window for a price-deviation breaker, in blocks.
pub const DEFAULT_AUTO_RESUME_BLOCKS: u64 = 60;

/// Breaker sub-id format for a pool, exposed so the assembling crate can
/// fan out hook notifications and query breaker state for a specific pool
/// using the same key the engine itself consults.
pub fn sub_id(pool_id: u64) -> String {
    format!("pool:{pool_id}")
}

/// Rejects the call if the DEX is halted module-wide or for this specific
/// pool (§4.3 "every swap first consults the coordinator").
fn ensure_not_broken(store: &dyn Storage, pool_id: Option<u64>) -> DexResult<()> {
    if meridian_breaker::is_open(store, "dex", "") {
        return Err(CoreError::BreakerOpen {
            module: "dex".into(),
            sub_id: "".into(),
        }
        .into());
    }
    if let Some(id) = pool_id {
        if meridian_breaker::is_open(store, "dex", &sub_id(id)) {
            return Err(CoreError::BreakerOpen {
                module: "dex".into(),
                sub_id: sub_id(id),
            }
            .into());
        }
    }
    Ok(())
}

fn load_pool(store: &dyn Storage, pool_id: u64) -> DexResult<Pool> {
    POOLS
        .may_load(store, pool_id)?
        .ok_or(DexError::PoolNotFound(pool_id))
}

fn load_position(store: &dyn Storage, pool_id: u64, owner: &Addr) -> DexResult<LiquidityPosition> {
    Ok(POSITIONS
        .may_load(store, (pool_id, owner.as_str()))?
        .unwrap_or(LiquidityPosition {
            pool_id,
            owner: owner.to_string(),
            shares: Uint128::zero(),
        }))
}

fn save_position(store: &mut dyn Storage, position: LiquidityPosition) -> DexResult<()> {
    if position.shares.is_zero() {
        POSITIONS.remove(store, (position.pool_id, position.owner.as_str()));
    } else {
        POSITIONS.save(store, (position.pool_id, position.owner.as_str()), &position)?;
    }
    Ok(())
}

pub fn create_pool(
    store: &mut dyn Storage,
    bank: &mut dyn BankKeeper,
    creator: &Addr,
    token_a: &str,
    token_b: &str,
    amount_a: Uint128,
    amount_b: Uint128,
    lp_fee_bps: u64,
    protocol_fee_bps: u64,
    height: Height,
) -> DexResult<(Pool, Event)> {
    if amount_a.is_zero() || amount_b.is_zero() {
        return Err(DexError::ZeroAmount {});
    }
    if lp_fee_bps + protocol_fee_bps >= BPS_DENOMINATOR as u64 {
        return Err(CoreError::InvalidArgument("combined fee bps must be below 10000".into()).into());
    }
    let (norm_a, norm_b) = normalize_pair(token_a, token_b);
    if PAIR_INDEX.has(store, (norm_a.as_str(), norm_b.as_str())) {
        return Err(DexError::PairAlreadyExists {});
    }

    let id = NEXT_POOL_ID.may_load(store)?.unwrap_or_default() + 1;
    NEXT_POOL_ID.save(store, &id)?;

    let shares = isqrt_product(amount_a, amount_b);

    bank.lock(creator, amount_a)?;
    bank.lock(creator, amount_b)?;

    let pool = Pool {
        id,
        token_a: token_a.to_string(),
        token_b: token_b.to_string(),
        reserve_a: amount_a,
        reserve_b: amount_b,
        total_shares: shares,
        lp_fee_bps,
        protocol_fee_bps,
        created_at: height,
        last_trade_height: height,
        protocol_fee_accrued_a: Uint128::zero(),
        protocol_fee_accrued_b: Uint128::zero(),
    };
    POOLS.save(store, id, &pool)?;
    PAIR_INDEX.save(store, (norm_a.as_str(), norm_b.as_str()), &id)?;
    save_position(
        store,
        LiquidityPosition {
            pool_id: id,
            owner: creator.to_string(),
            shares,
        },
    )?;

    let event = module_event(
        "dex",
        "pool_created",
        vec![
            ("pool_id", id.to_string()),
            ("token_a", token_a.to_string()),
            ("token_b", token_b.to_string()),
            ("shares", shares.to_string()),
        ],
    );
    Ok((pool, event))
}

pub fn add_liquidity(
    store: &mut dyn Storage,
    bank: &mut dyn BankKeeper,
    pool_id: u64,
    provider: &Addr,
    amount_a: Uint128,
    amount_b: Uint128,
    min_shares: Uint128,
) -> DexResult<(Pool, Event)> {
    ensure_not_broken(store, Some(pool_id))?;
    if amount_a.is_zero() || amount_b.is_zero() {
        return Err(DexError::ZeroAmount {});
    }
    let mut pool = load_pool(store, pool_id)?;

    let (shares, used_a, used_b) = if pool.is_empty() {
        (isqrt_product(amount_a, amount_b), amount_a, amount_b)
    } else {
        let shares_from_a = mul_div(amount_a, pool.total_shares, pool.reserve_a)?;
        let shares_from_b = mul_div(amount_b, pool.total_shares, pool.reserve_b)?;
        let shares = shares_from_a.min(shares_from_b);
        let used_a = mul_div(shares, pool.reserve_a, pool.total_shares)?;
        let used_b = mul_div(shares, pool.reserve_b, pool.total_shares)?;
        (shares, used_a, used_b)
    };

    if shares < min_shares {
        return Err(DexError::SlippageShares {
            got: shares,
            min: min_shares,
        });
    }

    bank.lock(provider, used_a)?;
    bank.lock(provider, used_b)?;
    if used_a < amount_a {
        bank.refund(provider, amount_a - used_a)?;
    }
    if used_b < amount_b {
        bank.refund(provider, amount_b - used_b)?;
    }

    pool.reserve_a += used_a;
    pool.reserve_b += used_b;
    pool.total_shares += shares;
    POOLS.save(store, pool_id, &pool)?;

    let mut position = load_position(store, pool_id, provider)?;
    position.shares += shares;
    save_position(store, position)?;

    let event = module_event(
        "dex",
        "liquidity_added",
        vec![
            ("pool_id", pool_id.to_string()),
            ("shares", shares.to_string()),
            ("used_a", used_a.to_string()),
            ("used_b", used_b.to_string()),
        ],
    );
    Ok((pool, event))
}

pub fn remove_liquidity(
    store: &mut dyn Storage,
    bank: &mut dyn BankKeeper,
    pool_id: u64,
    provider: &Addr,
    shares: Uint128,
    min_a: Uint128,
    min_b: Uint128,
) -> DexResult<(Pool, Event)> {
    ensure_not_broken(store, Some(pool_id))?;
    if shares.is_zero() {
        return Err(DexError::ZeroAmount {});
    }
    let mut pool = load_pool(store, pool_id)?;
    let mut position = load_position(store, pool_id, provider)?;

    if position.shares < shares {
        return Err(DexError::InsufficientShares {
            held: position.shares,
            requested: shares,
        });
    }

    let out_a = mul_div(shares, pool.reserve_a, pool.total_shares)?;
    let out_b = mul_div(shares, pool.reserve_b, pool.total_shares)?;
    if out_a < min_a {
        return Err(DexError::SlippageOutput { got: out_a, min: min_a });
    }
    if out_b < min_b {
        return Err(DexError::SlippageOutput { got: out_b, min: min_b });
    }

    pool.reserve_a -= out_a;
    pool.reserve_b -= out_b;
    pool.total_shares -= shares;
    POOLS.save(store, pool_id, &pool)?;

    position.shares -= shares;
    save_position(store, position)?;

    bank.release(provider, out_a)?;
    bank.release(provider, out_b)?;

    let event = module_event(
        "dex",
        "liquidity_removed",
        vec![
            ("pool_id", pool_id.to_string()),
            ("shares", shares.to_string()),
            ("out_a", out_a.to_string()),
            ("out_b", out_b.to_string()),
        ],
    );
    Ok((pool, event))
}

pub struct SwapOutcome {
    pub pool: Pool,
    pub amount_out: Uint128,
    pub protocol_fee_amount: Uint128,
    pub breaker_tripped: bool,
    pub events: Vec<Event>,
}

/// Constant-product swap quote for one side of the pool, grounded in the
/// teacher's `compute_swap` (§4.3). The protocol-fee slice is carved out
/// of the trader's input before it reaches the reserve; the LP-fee slice
/// stays in the reserve, which is how `k` strictly increases across a
/// fee-bearing swap.
fn compute_swap(
    reserve_in: Uint128,
    reserve_out: Uint128,
    amount_in: Uint128,
    lp_fee_bps: u64,
    protocol_fee_bps: u64,
) -> DexResult<(Uint128, Uint128)> {
    let total_fee_bps = lp_fee_bps + protocol_fee_bps;
    let amount_in_after_fee = mul_div(
        amount_in,
        Uint128::from(BPS_DENOMINATOR as u64 - total_fee_bps),
        Uint128::from(BPS_DENOMINATOR as u64),
    )?;
    let protocol_fee_amount = apply_bps(amount_in, protocol_fee_bps)?;
    let amount_out = mul_div(
        amount_in_after_fee,
        reserve_out,
        reserve_in + amount_in_after_fee,
    )?;
    Ok((amount_out, protocol_fee_amount))
}

#[allow(clippy::too_many_arguments)]
pub fn swap(
    store: &mut dyn Storage,
    bank: &mut dyn BankKeeper,
    pool_id: u64,
    trader: &Addr,
    token_in: &str,
    amount_in: Uint128,
    min_out: Uint128,
    height: Height,
    deviation_threshold_bps: Option<u64>,
    auto_resume_blocks: Option<u64>,
) -> DexResult<SwapOutcome> {
    ensure_not_broken(store, Some(pool_id))?;
    if amount_in.is_zero() {
        return Err(DexError::ZeroAmount {});
    }
    let mut pool = load_pool(store, pool_id)?;

    let a_in = token_in == pool.token_a;
    let b_in = token_in == pool.token_b;
    if !a_in && !b_in {
        return Err(DexError::UnknownToken(token_in.to_string()));
    }

    let (reserve_in, reserve_out) = if a_in {
        (pool.reserve_a, pool.reserve_b)
    } else {
        (pool.reserve_b, pool.reserve_a)
    };
    let price_before = Decimal::from_ratio(reserve_out, reserve_in);

    let (amount_out, protocol_fee_amount) = compute_swap(
        reserve_in,
        reserve_out,
        amount_in,
        pool.lp_fee_bps,
        pool.protocol_fee_bps,
    )?;
    if amount_out < min_out {
        return Err(DexError::SlippageOutput {
            got: amount_out,
            min: min_out,
        });
    }

    let invariant_before = reserve_in.full_mul(reserve_out);

    let new_reserve_in = reserve_in + amount_in - protocol_fee_amount;
    let new_reserve_out = reserve_out
        .checked_sub(amount_out)
        .map_err(|e| CoreError::InvariantViolation(e.to_string()))?;

    if new_reserve_in.full_mul(new_reserve_out) < invariant_before {
        return Err(DexError::InvariantDecreased {});
    }

    if a_in {
        pool.reserve_a = new_reserve_in;
        pool.reserve_b = new_reserve_out;
        pool.protocol_fee_accrued_a += protocol_fee_amount;
    } else {
        pool.reserve_b = new_reserve_in;
        pool.reserve_a = new_reserve_out;
        pool.protocol_fee_accrued_b += protocol_fee_amount;
    }
    pool.last_trade_height = height;

    let price_after = Decimal::from_ratio(new_reserve_out, new_reserve_in);

    bank.lock(trader, amount_in)?;
    bank.release(trader, amount_out)?;

    POOLS.save(store, pool_id, &pool)?;

    let mut events = vec![module_event(
        "dex",
        "swap",
        vec![
            ("pool_id", pool_id.to_string()),
            ("token_in", token_in.to_string()),
            ("amount_in", amount_in.to_string()),
            ("amount_out", amount_out.to_string()),
            ("protocol_fee", protocol_fee_amount.to_string()),
        ],
    )];

    let mut breaker_tripped = false;
    let deviation_bps = deviation_threshold_bps.unwrap_or(DEFAULT_DEVIATION_THRESHOLD_BPS);
    if price_moved_beyond(price_before, price_after, deviation_bps) {
        let state = meridian_breaker::open(
            store,
            "dex",
            &sub_id(pool_id),
            "system",
            "price_deviation",
            Some(auto_resume_blocks.unwrap_or(DEFAULT_AUTO_RESUME_BLOCKS)),
            height,
            Some(sub_id(pool_id)),
        );
        if state.is_ok() {
            breaker_tripped = true;
            events.push(module_event(
                "dex",
                "breaker_opened",
                vec![("pool_id", pool_id.to_string()), ("reason", "price_deviation".into())],
            ));
        }
    }

    Ok(SwapOutcome {
        pool,
        amount_out,
        protocol_fee_amount,
        breaker_tripped,
        events,
    })
}

/// `|after - before| / before > threshold_bps / 10_000` (§4.3).
fn price_moved_beyond(before: Decimal, after: Decimal, threshold_bps: u64) -> bool {
    if before.is_zero() {
        return false;
    }
    let diff = if after > before { after - before } else { before - after };
    let threshold = Decimal::from_ratio(threshold_bps, BPS_DENOMINATOR as u64);
    diff / before > threshold
}

/// Admin-gated payout of accrued protocol fees (SPEC_FULL.md §3.1). Not a
/// pricing or swap operation; it never touches LP shares or reserves.
pub fn sweep_protocol_fees(
    store: &mut dyn Storage,
    bank: &mut dyn BankKeeper,
    pool_id: u64,
    recipient: &Addr,
) -> DexResult<(Uint128, Uint128, Event)> {
    let mut pool = load_pool(store, pool_id)?;
    let (amount_a, amount_b) = (pool.protocol_fee_accrued_a, pool.protocol_fee_accrued_b);

    if amount_a.is_zero() && amount_b.is_zero() {
        return Err(DexError::ZeroAmount {});
    }

    pool.protocol_fee_accrued_a = Uint128::zero();
    pool.protocol_fee_accrued_b = Uint128::zero();
    POOLS.save(store, pool_id, &pool)?;

    if !amount_a.is_zero() {
        bank.release(recipient, amount_a)?;
    }
    if !amount_b.is_zero() {
        bank.release(recipient, amount_b)?;
    }

    let event = module_event(
        "dex",
        "protocol_fees_swept",
        vec![
            ("pool_id", pool_id.to_string()),
            ("amount_a", amount_a.to_string()),
            ("amount_b", amount_b.to_string()),
        ],
    );
    Ok((amount_a, amount_b, event))
}

pub fn get_pool(store: &dyn Storage, pool_id: u64) -> DexResult<Pool> {
    load_pool(store, pool_id)
}

pub fn get_position(store: &dyn Storage, pool_id: u64, owner: &Addr) -> DexResult<LiquidityPosition> {
    load_position(store, pool_id, owner)
}
