//! Assembles the three business engines and the circuit-breaker
//! coordinator behind a single `BeginBlock -> DeliverTx* -> EndBlock`
//! state transition (§2, §5).

use cosmwasm_std::{Addr, Event, Storage};

use meridian_types::collaborators::{BankKeeper, MultiSigVerifier, SignatureVerifier, StakingKeeper};
use meridian_types::Height;

use crate::admin::{self, AdminMsg};
use crate::error::AppResult;
use crate::hooks::{build_hook_table, TracingPriceHook};
use crate::message::{self, Message};
use crate::params::DEX_DEFAULTS;

/// Everything a block needs that the core does not own itself: the bank
/// and staking ledgers, signature verification, and the hook fan-out
/// table assembled once at startup (§6.5, §9).
pub struct App<'a> {
    pub bank: &'a mut dyn BankKeeper,
    pub staking: &'a mut dyn StakingKeeper,
    pub sigverifier: &'a dyn SignatureVerifier,
    pub multisig: &'a dyn MultiSigVerifier,
}

impl<'a> App<'a> {
    pub fn new(
        bank: &'a mut dyn BankKeeper,
        staking: &'a mut dyn StakingKeeper,
        sigverifier: &'a dyn SignatureVerifier,
        multisig: &'a dyn MultiSigVerifier,
    ) -> Self {
        Self {
            bank,
            staking,
            sigverifier,
            multisig,
        }
    }

    /// Nothing in this core has BeginBlock-specific work of its own today
    /// (no module needs a pre-transaction hook); kept as an explicit,
    /// traced no-op so the fixed block lifecycle stays visible end to end
    /// and a future module has a defined place to hook into.
    #[tracing::instrument(skip_all, fields(height))]
    pub fn begin_block(&mut self, height: Height) -> AppResult<Vec<Event>> {
        tracing::debug!(height, "begin_block");
        Ok(Vec::new())
    }

    #[tracing::instrument(skip_all, fields(height, sender = %sender))]
    pub fn deliver_tx(&mut self, store: &mut dyn Storage, sender: &Addr, msg: Message, height: Height) -> AppResult<Vec<Event>> {
        let mut hooks = build_hook_table();
        let events = match msg {
            Message::Dex(dex_msg) => {
                let defaults = DEX_DEFAULTS.load(store).map_err(meridian_types::error::CoreError::from)?;
                message::deliver_dex(store, self.bank, &mut hooks, &defaults, sender, dex_msg, height)?
            }
            Message::Oracle(oracle_msg) => message::deliver_oracle(store, self.staking, sender, oracle_msg, height)?,
            Message::Compute(compute_msg) => message::deliver_compute(store, self.bank, self.sigverifier, sender, compute_msg, height)?,
        };
        tracing::debug!(event_count = events.len(), "deliver_tx complete");
        Ok(events)
    }

    /// Applies an admin message synthesized by the out-of-band operator
    /// surface (§9 "Admin surface vs state machine"). Routed through the
    /// same consensus path as any other transaction, never called
    /// directly from the HTTP layer.
    #[tracing::instrument(skip_all, fields(height, actor))]
    pub fn deliver_admin(&mut self, store: &mut dyn Storage, actor: &str, msg: AdminMsg, height: Height) -> AppResult<Event> {
        admin::apply_admin(store, self.multisig, actor, msg, height)
    }

    /// EndBlock engine order is fixed: oracle aggregate, then compute
    /// expiry/release, then DEX cleanup, then the breaker auto-resume
    /// timer (§2, §5).
    #[tracing::instrument(skip_all, fields(height))]
    pub fn end_block(&mut self, store: &mut dyn Storage, height: Height, block_time: u64) -> AppResult<Vec<Event>> {
        let mut events = Vec::new();
        let mut hooks = build_hook_table();

        let oracle_params = meridian_oracle::state::PARAMS.load(store).map_err(meridian_types::error::CoreError::from)?;
        let mut price_hook = TracingPriceHook;
        let outcome = meridian_oracle::end_block(store, self.staking, &oracle_params, height, block_time, &mut price_hook, &mut hooks)?;
        tracing::info!(count = outcome.aggregated.len(), "oracle aggregation complete");
        events.extend(outcome.events);

        let compute_params = meridian_compute::state::PARAMS.load(store).map_err(meridian_types::error::CoreError::from)?;
        let compute_events = meridian_compute::end_block_sweep(store, self.bank, &compute_params, height)?;
        tracing::info!(count = compute_events.len(), "compute sweep complete");
        events.extend(compute_events);

        events.extend(self.dex_cleanup(store, height)?);

        let resumed = meridian_breaker::auto_resume_sweep(store, height)?;
        tracing::info!(count = resumed.len(), "breaker auto-resume sweep complete");
        for state in resumed {
            events.push(meridian_types::event::module_event(
                "breaker",
                "auto_resumed",
                vec![("module", state.module.clone()), ("sub_id", state.sub_id.clone())],
            ));
        }

        Ok(events)
    }

    /// The DEX engine has no per-block bookkeeping of its own today (fee
    /// sweeps are admin-gated, not automatic — SPEC_FULL.md §9 leaves the
    /// payout cadence to governance). This keeps the fixed EndBlock slot
    /// reserved and traced rather than silently skipped, so the ordering
    /// guarantee in §5 holds even though there is nothing to do yet.
    fn dex_cleanup(&mut self, _store: &mut dyn Storage, height: Height) -> AppResult<Vec<Event>> {
        tracing::debug!(height, "dex cleanup: no automatic bookkeeping");
        Ok(Vec::new())
    }
}
