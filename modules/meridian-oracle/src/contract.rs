//! Public operations of the oracle engine (§4.4): `SubmitPrice`,
//! `DelegateFeeder`, `ClearFeeder`, the EndBlock aggregation pipeline, and
//! the `twap` query.

use cosmwasm_std::{Addr, Decimal, Event, Order, Storage};
use itertools::Itertools;

use meridian_breaker::HookTable;
use meridian_types::collaborators::StakingKeeper;
use meridian_types::error::CoreError;
use meridian_types::event::module_event;
use meridian_types::hooks::PriceAggregatedHook;
use meridian_types::Height;

use crate::error::{OracleError, OracleResult};
use crate::snapshot;
use crate::state::{
    AggregatedPrice, FeederDelegation, Params, PriceSnapshot, ValidatorMissCounter, ValidatorPrice,
    AGGREGATED_PRICES, DELEGATIONS, FEEDER_INDEX, MISS_COUNTERS, VALIDATOR_PRICES,
};

pub const DEFAULT_AUTO_RESUME_BLOCKS: u64 = 60;

fn ensure_not_broken(store: &dyn Storage, asset: &str) -> OracleResult<()> {
    if meridian_breaker::is_open(store, "oracle", "") {
        return Err(CoreError::BreakerOpen {
            module: "oracle".into(),
            sub_id: "".into(),
        }
        .into());
    }
    if meridian_breaker::is_open(store, "oracle", asset) {
        return Err(CoreError::BreakerOpen {
            module: "oracle".into(),
            sub_id: asset.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Resolves `signer` to the validator address it is allowed to submit on
/// behalf of: itself, if bonded, or the validator that delegated it as a
/// feeder (§4.4 "signer must be a bonded validator or its delegated
/// feeder").
fn resolve_validator(
    store: &dyn Storage,
    staking: &dyn StakingKeeper,
    signer: &Addr,
) -> OracleResult<Addr> {
    if !staking.bonded_stake(signer).is_zero() {
        return Ok(signer.clone());
    }
    if let Some(validator) = FEEDER_INDEX.may_load(store, signer.as_str())? {
        let validator = Addr::unchecked(validator);
        if !staking.bonded_stake(&validator).is_zero() {
            return Ok(validator);
        }
    }
    Err(OracleError::UnknownSigner {})
}

pub fn submit_price(
    store: &mut dyn Storage,
    staking: &dyn StakingKeeper,
    params: &Params,
    signer: &Addr,
    asset: &str,
    price: Decimal,
    height: Height,
) -> OracleResult<Event> {
    ensure_not_broken(store, asset)?;
    if price.is_zero() {
        return Err(OracleError::NonPositivePrice {});
    }

    let validator = resolve_validator(store, staking, signer)?;
    if staking.is_jailed(&validator) {
        return Err(OracleError::ValidatorJailed {});
    }

    if let Some(last) = AGGREGATED_PRICES.may_load(store, asset)? {
        let lower = last.price / params.extreme_ratio;
        let upper = last.price * params.extreme_ratio;
        if price < lower || price > upper {
            return Err(OracleError::PriceOutOfBand { price, lower, upper });
        }
    }

    VALIDATOR_PRICES.save(
        store,
        (asset, validator.as_str()),
        &ValidatorPrice {
            validator: validator.to_string(),
            asset: asset.to_string(),
            price,
            height,
        },
    )?;

    let mut miss = MISS_COUNTERS
        .may_load(store, validator.as_str())?
        .unwrap_or_else(|| ValidatorMissCounter::fresh(validator.as_str()));
    miss.last_active_height = height;
    MISS_COUNTERS.save(store, validator.as_str(), &miss)?;

    Ok(module_event(
        "oracle",
        "price_submitted",
        vec![
            ("validator", validator.to_string()),
            ("asset", asset.to_string()),
            ("price", price.to_string()),
        ],
    ))
}

pub fn delegate_feeder(store: &mut dyn Storage, validator: &Addr, feeder: &Addr) -> OracleResult<Event> {
    if let Some(prior) = DELEGATIONS.may_load(store, validator.as_str())? {
        FEEDER_INDEX.remove(store, prior.feeder.as_str());
    }
    DELEGATIONS.save(
        store,
        validator.as_str(),
        &FeederDelegation {
            validator: validator.to_string(),
            feeder: feeder.to_string(),
        },
    )?;
    FEEDER_INDEX.save(store, feeder.as_str(), &validator.to_string())?;

    Ok(module_event(
        "oracle",
        "feeder_delegated",
        vec![("validator", validator.to_string()), ("feeder", feeder.to_string())],
    ))
}

pub fn clear_feeder(store: &mut dyn Storage, validator: &Addr) -> OracleResult<Event> {
    if let Some(prior) = DELEGATIONS.may_load(store, validator.as_str())? {
        FEEDER_INDEX.remove(store, prior.feeder.as_str());
    }
    DELEGATIONS.remove(store, validator.as_str());

    Ok(module_event(
        "oracle",
        "feeder_cleared",
        vec![("validator", validator.to_string())],
    ))
}

struct Submission {
    validator: Addr,
    price: Decimal,
    weight: cosmwasm_std::Uint128,
}

/// First price whose cumulative weight strictly exceeds half the total
/// submitted weight, matching §8 scenario 3 exactly.
fn weighted_median(mut submissions: Vec<Submission>) -> Decimal {
    submissions.sort_by(|a, b| a.price.cmp(&b.price));
    let total: cosmwasm_std::Uint128 = submissions
        .iter()
        .fold(cosmwasm_std::Uint128::zero(), |acc, s| acc + s.weight);
    let half = total / cosmwasm_std::Uint128::from(2u128);
    let mut cumulative = cosmwasm_std::Uint128::zero();
    for submission in &submissions {
        cumulative += submission.weight;
        if cumulative > half {
            return submission.price;
        }
    }
    submissions.last().map(|s| s.price).unwrap_or_default()
}

/// `|a - b| / b`, using the larger-minus-smaller form since `Decimal` has
/// no signed representation.
fn relative_deviation(a: Decimal, b: Decimal) -> Decimal {
    if b.is_zero() {
        return Decimal::zero();
    }
    let diff = if a > b { a - b } else { b - a };
    diff / b
}

pub struct AggregationOutcome {
    pub events: Vec<Event>,
    pub aggregated: Vec<AggregatedPrice>,
}

/// EndBlock aggregation pipeline (§4.4 steps 1-7): quorum check, weighted
/// median, snapshot trim, classify & slash, deviation-triggered breaker.
///
/// Only runs on a window boundary (`height % vote_window_blocks == 0`);
/// every asset's submission set is cleared once its window has been
/// processed, win or miss, so a validator who submitted once is never
/// silently counted as still active in a later window (§3, §4.4).
#[allow(clippy::too_many_arguments)]
pub fn end_block(
    store: &mut dyn Storage,
    staking: &mut dyn StakingKeeper,
    params: &Params,
    height: Height,
    block_time: u64,
    price_hook: &mut dyn PriceAggregatedHook,
    breaker_hooks: &mut HookTable,
) -> OracleResult<AggregationOutcome> {
    let mut events = Vec::new();
    let mut aggregated = Vec::new();

    let window = params.vote_window_blocks.max(1);
    if height % window != 0 {
        return Ok(AggregationOutcome { events, aggregated });
    }

    let all_submissions: Vec<((String, String), ValidatorPrice)> = VALIDATOR_PRICES
        .range(store, None, None, Order::Ascending)
        .collect::<Result<_, _>>()?;

    let by_asset: std::collections::BTreeMap<String, Vec<ValidatorPrice>> = all_submissions
        .into_iter()
        .map(|((asset, _validator), price)| (asset, price))
        .into_group_map()
        .into_iter()
        .collect();

    let mut bonded_validators = staking.bonded_validators();
    bonded_validators.sort();

    for (asset, submissions) in by_asset {
        let qualifying: Vec<Submission> = submissions
            .iter()
            .filter(|s| !staking.is_jailed(&Addr::unchecked(&s.validator)))
            .filter(|s| !staking.bonded_stake(&Addr::unchecked(&s.validator)).is_zero())
            .map(|s| Submission {
                validator: Addr::unchecked(&s.validator),
                price: s.price,
                weight: staking.bonded_stake(&Addr::unchecked(&s.validator)),
            })
            .collect();

        let summed_weight: cosmwasm_std::Uint128 = qualifying
            .iter()
            .fold(cosmwasm_std::Uint128::zero(), |acc, s| acc + s.weight);
        let total_bonded = staking.total_bonded();
        let lhs = summed_weight
            .checked_mul(cosmwasm_std::Uint128::from(10_000u128))
            .map_err(|e| CoreError::InvariantViolation(e.to_string()))?;
        let rhs = total_bonded
            .checked_mul(cosmwasm_std::Uint128::from(params.vote_threshold_bps))
            .map_err(|e| CoreError::InvariantViolation(e.to_string()))?;
        let quorum_met = lhs >= rhs;

        let submitted: std::collections::BTreeSet<String> =
            qualifying.iter().map(|s| s.validator.to_string()).collect();

        if !quorum_met {
            let mut missed: Vec<&Addr> = bonded_validators
                .iter()
                .filter(|v| !submitted.contains(v.as_str()))
                .collect();
            missed.sort();
            for validator in missed {
                record_miss(store, validator, height, params, staking)?;
            }
            events.push(module_event(
                "oracle",
                "aggregation_skipped",
                vec![("asset", asset.clone()), ("reason", "quorum_not_met".into())],
            ));
            clear_window(store, &asset, &submissions);
            continue;
        }

        let price = weighted_median(qualifying);
        let previous = AGGREGATED_PRICES.may_load(store, asset.as_str())?;

        let new_price = AggregatedPrice {
            asset: asset.clone(),
            price,
            height,
            block_time,
        };
        AGGREGATED_PRICES.save(store, asset.as_str(), &new_price)?;
        snapshot::push(
            store,
            &asset,
            params.twap_window.max(1) as u32,
            PriceSnapshot {
                asset: asset.clone(),
                height,
                price,
            },
        )?;
        price_hook.after_price_aggregated(&asset, meridian_math::decimal::widen(price), height);

        events.push(module_event(
            "oracle",
            "price_aggregated",
            vec![("asset", asset.clone()), ("price", price.to_string())],
        ));
        aggregated.push(new_price);

        classify_and_slash(store, &asset, &submissions, price, params, staking, height, &bonded_validators)?;

        if let Some(prev) = previous {
            if relative_deviation(price, prev.price) > Decimal::percent(50) {
                let opened = meridian_breaker::open(
                    store,
                    "oracle",
                    &asset,
                    "system",
                    "deviation",
                    Some(DEFAULT_AUTO_RESUME_BLOCKS),
                    height,
                    Some(asset.clone()),
                );
                if opened.is_ok() {
                    breaker_hooks.fan_out("oracle", &asset, "deviation");
                    events.push(module_event(
                        "oracle",
                        "breaker_opened",
                        vec![("asset", asset.clone()), ("reason", "deviation".into())],
                    ));
                }
            }
        }

        clear_window(store, &asset, &submissions);
    }

    Ok(AggregationOutcome { events, aggregated })
}

/// Drops every submission recorded for `asset` this window so the next
/// window starts empty; a validator that stays silent afterward is then
/// correctly absent from `submitted` rather than re-counted from a stale
/// entry (§3: `ValidatorPrice` is one per `(validator, asset, window)`).
fn clear_window(store: &mut dyn Storage, asset: &str, submissions: &[ValidatorPrice]) {
    for submission in submissions {
        VALIDATOR_PRICES.remove(store, (asset, submission.validator.as_str()));
    }
}

#[allow(clippy::too_many_arguments)]
fn classify_and_slash(
    store: &mut dyn Storage,
    asset: &str,
    submissions: &[ValidatorPrice],
    aggregated_price: Decimal,
    params: &Params,
    staking: &mut dyn StakingKeeper,
    height: Height,
    bonded_validators: &[Addr],
) -> OracleResult<()> {
    let submitted: std::collections::BTreeMap<String, Decimal> = submissions
        .iter()
        .map(|s| (s.validator.clone(), s.price))
        .collect();

    let mut ordered_bonded: Vec<&Addr> = bonded_validators.iter().collect();
    ordered_bonded.sort();

    for validator in ordered_bonded {
        match submitted.get(validator.as_str()) {
            Some(&submitted_price) => {
                let deviation = relative_deviation(submitted_price, aggregated_price);
                let band = Decimal::from_ratio(params.reward_band_bps, 10_000u128);
                if deviation <= band {
                    reset_miss(store, validator)?;
                } else {
                    staking.slash(validator, params.slash_fraction_bad_data)?;
                    record_miss(store, validator, height, params, staking)?;
                }
            }
            None => {
                record_miss(store, validator, height, params, staking)?;
            }
        }
    }
    let _ = asset;
    Ok(())
}

fn reset_miss(store: &mut dyn Storage, validator: &Addr) -> OracleResult<()> {
    let mut miss = MISS_COUNTERS
        .may_load(store, validator.as_str())?
        .unwrap_or_else(|| ValidatorMissCounter::fresh(validator.as_str()));
    miss.miss_streak = 0;
    MISS_COUNTERS.save(store, validator.as_str(), &miss)?;
    Ok(())
}

fn record_miss(
    store: &mut dyn Storage,
    validator: &Addr,
    height: Height,
    params: &Params,
    staking: &mut dyn StakingKeeper,
) -> OracleResult<()> {
    let mut miss = MISS_COUNTERS
        .may_load(store, validator.as_str())?
        .unwrap_or_else(|| ValidatorMissCounter::fresh(validator.as_str()));
    miss.miss_streak += 1;
    miss.last_missed_height = height;
    if miss.miss_streak > params.max_misses {
        staking.slash(validator, params.slash_fraction_miss)?;
        staking.jail(validator)?;
    }
    MISS_COUNTERS.save(store, validator.as_str(), &miss)?;
    Ok(())
}

/// Time-weighted average price over the last `window` blocks (§4.4). Falls
/// back to the latest spot price when there are fewer than two snapshots.
pub fn twap(store: &dyn Storage, asset: &str, window: Height) -> OracleResult<Option<Decimal>> {
    let snapshots = snapshot::read_all(store, asset)?;
    let latest_height = match snapshots.last() {
        Some(latest) => latest.height,
        None => return Ok(None),
    };
    let in_window: Vec<&PriceSnapshot> = snapshots
        .iter()
        .rev()
        .filter(|s| latest_height.saturating_sub(s.height) <= window)
        .collect();

    if in_window.len() < 2 {
        return Ok(snapshots.last().map(|s| s.price));
    }

    let mut weighted_sum = Decimal::zero();
    let mut total_weight: u64 = 0;
    for pair in in_window.windows(2) {
        let (older, newer) = (pair[1], pair[0]);
        let duration = newer.height.saturating_sub(older.height).max(1);
        weighted_sum += older.price * Decimal::from_ratio(duration, 1u128);
        total_weight += duration;
    }
    if total_weight == 0 {
        return Ok(snapshots.last().map(|s| s.price));
    }
    Ok(Some(weighted_sum / Decimal::from_ratio(total_weight, 1u128)))
}
