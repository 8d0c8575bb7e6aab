//! Concrete hook observers wired at app-assembly time (§9 "Cyclic module
//! references"). Every engine in this repository already consults the
//! breaker registry directly via `IsOpen` at the top of its own handlers,
//! so a sibling's observer has nothing stateful left to do when notified
//! — it only traces the event, which is what an operator dashboard would
//! subscribe to in production.

use meridian_types::hooks::CircuitBreakerHook;

/// Registered under `"dex"`; fires when the oracle opens a breaker.
pub struct DexBreakerObserver;

impl CircuitBreakerHook for DexBreakerObserver {
    fn on_circuit_breaker_triggered(&mut self, module: &str, sub_id: &str, reason: &str) {
        tracing::warn!(target: "meridian::dex", source_module = module, sub_id, reason, "sibling breaker opened");
    }
}

/// Registered under `"compute"`; fires when the DEX opens a breaker.
pub struct ComputeBreakerObserver;

impl CircuitBreakerHook for ComputeBreakerObserver {
    fn on_circuit_breaker_triggered(&mut self, module: &str, sub_id: &str, reason: &str) {
        tracing::warn!(target: "meridian::compute", source_module = module, sub_id, reason, "sibling breaker opened");
    }
}

/// Builds the `HookTable` wired the way §4.6 requires: oracle informs
/// DEX, DEX informs compute, compute has no siblings.
pub fn build_hook_table() -> meridian_breaker::HookTable {
    let mut table = meridian_breaker::HookTable::new();
    table.register("dex", Box::new(DexBreakerObserver));
    table.register("compute", Box::new(ComputeBreakerObserver));
    table
}

/// Fires `AfterPriceAggregated` (§4.4) by tracing it; the DEX engine
/// cross-checks pool prices against the oracle through its own query
/// path rather than a push subscription, so this observer's only job is
/// observability.
#[derive(Default)]
pub struct TracingPriceHook;

impl meridian_types::hooks::PriceAggregatedHook for TracingPriceHook {
    fn after_price_aggregated(&mut self, asset: &str, price: cosmwasm_std::Decimal256, height: u64) {
        tracing::info!(target: "meridian::oracle", asset, %price, height, "price aggregated");
    }
}
