//! Transaction messages routed by consensus to the engine that owns the
//! action (§6 "Transaction messages"). `deliver_tx` is the single entry
//! point `App::deliver_tx` calls into after resolving the sender.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Decimal, Event, Storage, Uint128};

use meridian_types::collaborators::{BankKeeper, SignatureVerifier, StakingKeeper};
use meridian_types::Height;

use crate::error::AppResult;
use crate::params::DexDefaults;

#[cw_serde]
pub enum DexMsg {
    CreatePool {
        token_a: String,
        token_b: String,
        amount_a: Uint128,
        amount_b: Uint128,
        lp_fee_bps: u64,
        protocol_fee_bps: u64,
    },
    AddLiquidity {
        pool_id: u64,
        amount_a: Uint128,
        amount_b: Uint128,
        min_shares: Uint128,
    },
    RemoveLiquidity {
        pool_id: u64,
        shares: Uint128,
        min_a: Uint128,
        min_b: Uint128,
    },
    Swap {
        pool_id: u64,
        token_in: String,
        amount_in: Uint128,
        min_out: Uint128,
    },
}

#[cw_serde]
pub enum OracleMsg {
    SubmitPrice { asset: String, price: Decimal },
    DelegateFeeder { feeder: String },
    ClearFeeder {},
}

#[cw_serde]
pub enum ComputeMsg {
    RegisterProvider {
        endpoint: String,
        price_per_unit: Uint128,
        stake: Uint128,
        public_key: Binary,
    },
    UpdateProvider {
        endpoint: Option<String>,
        price_per_unit: Option<Uint128>,
    },
    DeregisterProvider {},
    SubmitRequest {
        payload: Binary,
        max_price: Uint128,
        deadline_height: Height,
        nonce: u64,
    },
    AcceptRequest {
        request_id: u64,
    },
    SubmitResult {
        request_id: u64,
        result_hash: Binary,
        signature: Binary,
        proof_blob: Binary,
    },
    SubmitChallenge {
        request_id: u64,
        counter_proof: Binary,
    },
    CancelRequest {
        request_id: u64,
    },
}

#[cw_serde]
pub enum Message {
    Dex(DexMsg),
    Oracle(OracleMsg),
    Compute(ComputeMsg),
}

#[allow(clippy::too_many_arguments)]
pub fn deliver_dex(
    store: &mut dyn Storage,
    bank: &mut dyn BankKeeper,
    hooks: &mut meridian_breaker::HookTable,
    defaults: &DexDefaults,
    sender: &Addr,
    msg: DexMsg,
    height: Height,
) -> AppResult<Vec<Event>> {
    match msg {
        DexMsg::CreatePool {
            token_a,
            token_b,
            amount_a,
            amount_b,
            lp_fee_bps,
            protocol_fee_bps,
        } => {
            let (_, event) = meridian_dex::create_pool(
                store,
                bank,
                sender,
                &token_a,
                &token_b,
                amount_a,
                amount_b,
                lp_fee_bps,
                protocol_fee_bps,
                height,
            )?;
            Ok(vec![event])
        }
        DexMsg::AddLiquidity {
            pool_id,
            amount_a,
            amount_b,
            min_shares,
        } => {
            let (_, event) = meridian_dex::add_liquidity(store, bank, pool_id, sender, amount_a, amount_b, min_shares)?;
            Ok(vec![event])
        }
        DexMsg::RemoveLiquidity {
            pool_id,
            shares,
            min_a,
            min_b,
        } => {
            let (_, event) = meridian_dex::remove_liquidity(store, bank, pool_id, sender, shares, min_a, min_b)?;
            Ok(vec![event])
        }
        DexMsg::Swap {
            pool_id,
            token_in,
            amount_in,
            min_out,
        } => {
            let outcome = meridian_dex::swap(
                store,
                bank,
                pool_id,
                sender,
                &token_in,
                amount_in,
                min_out,
                height,
                Some(defaults.deviation_threshold_bps),
                Some(defaults.auto_resume_blocks),
            )?;
            if outcome.breaker_tripped {
                hooks.fan_out("dex", &meridian_dex::sub_id(pool_id), "price_deviation");
            }
            Ok(outcome.events)
        }
    }
}

pub fn deliver_oracle(
    store: &mut dyn Storage,
    staking: &dyn StakingKeeper,
    sender: &Addr,
    msg: OracleMsg,
    height: Height,
) -> AppResult<Vec<Event>> {
    match msg {
        OracleMsg::SubmitPrice { asset, price } => {
            let params = meridian_oracle::state::PARAMS.load(store).map_err(meridian_types::error::CoreError::from)?;
            let event = meridian_oracle::submit_price(store, staking, &params, sender, &asset, price, height)?;
            Ok(vec![event])
        }
        OracleMsg::DelegateFeeder { feeder } => {
            let event = meridian_oracle::delegate_feeder(store, sender, &Addr::unchecked(feeder))?;
            Ok(vec![event])
        }
        OracleMsg::ClearFeeder {} => {
            let event = meridian_oracle::clear_feeder(store, sender)?;
            Ok(vec![event])
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn deliver_compute(
    store: &mut dyn Storage,
    bank: &mut dyn BankKeeper,
    sigverifier: &dyn SignatureVerifier,
    sender: &Addr,
    msg: ComputeMsg,
    height: Height,
) -> AppResult<Vec<Event>> {
    let params = meridian_compute::state::PARAMS.load(store).map_err(meridian_types::error::CoreError::from)?;
    match msg {
        ComputeMsg::RegisterProvider {
            endpoint,
            price_per_unit,
            stake,
            public_key,
        } => {
            let event =
                meridian_compute::register_provider(store, bank, &params, sender, endpoint, price_per_unit, stake, public_key, height)?;
            Ok(vec![event])
        }
        ComputeMsg::UpdateProvider { endpoint, price_per_unit } => {
            let event = meridian_compute::update_provider(store, sender, endpoint, price_per_unit, height)?;
            Ok(vec![event])
        }
        ComputeMsg::DeregisterProvider {} => {
            let event = meridian_compute::deregister_provider(store, bank, sender)?;
            Ok(vec![event])
        }
        ComputeMsg::SubmitRequest {
            payload,
            max_price,
            deadline_height,
            nonce,
        } => {
            let (_, events) = meridian_compute::submit_request(store, bank, &params, sender, payload, max_price, deadline_height, nonce, height)?;
            Ok(events)
        }
        ComputeMsg::AcceptRequest { request_id } => {
            let event = meridian_compute::accept_request(store, sender, request_id, height)?;
            Ok(vec![event])
        }
        ComputeMsg::SubmitResult {
            request_id,
            result_hash,
            signature,
            proof_blob,
        } => {
            let event = meridian_compute::submit_result(store, &params, sender, request_id, result_hash, signature, proof_blob, height)?;
            Ok(vec![event])
        }
        ComputeMsg::SubmitChallenge { request_id, counter_proof } => {
            let events = meridian_compute::submit_challenge(store, bank, sigverifier, &params, sender, request_id, counter_proof, height)?;
            Ok(events)
        }
        ComputeMsg::CancelRequest { request_id } => {
            let event = meridian_compute::cancel_request(store, bank, sender, request_id, height)?;
            Ok(vec![event])
        }
    }
}
