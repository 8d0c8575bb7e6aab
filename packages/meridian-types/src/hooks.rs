//! Observer-table seam used to fan out cross-module events without the
//! coordinator owning engines or engines owning the coordinator (§9
//! "Cyclic module references"). Each engine exposes an observer object
//! implementing the hook trait(s) it fires; the assembling crate
//! (`meridian-app`) constructs every engine first, then binds the
//! observers into the coordinator.

use cosmwasm_std::Decimal256;

/// Fired by the breaker coordinator into every registered sibling when a
/// module opens its own breaker (§4.6 "Hooks ... fan out to sibling
/// modules"). The sibling never auto-opens in response; it only uses this
/// to short-circuit price-sensitive paths on its next handler call.
pub trait CircuitBreakerHook {
    fn on_circuit_breaker_triggered(&mut self, module: &str, sub_id: &str, reason: &str);
}

/// Fired by the oracle engine after EndBlock aggregation writes a new
/// `AggregatedPrice` (§4.4).
pub trait PriceAggregatedHook {
    fn after_price_aggregated(&mut self, asset: &str, price: Decimal256, height: u64);
}

/// A no-op hook sink, used where a module has no registered observers yet.
#[derive(Default)]
pub struct NullHooks;

impl CircuitBreakerHook for NullHooks {
    fn on_circuit_breaker_triggered(&mut self, _module: &str, _sub_id: &str, _reason: &str) {}
}

impl PriceAggregatedHook for NullHooks {
    fn after_price_aggregated(&mut self, _asset: &str, _price: Decimal256, _height: u64) {}
}
