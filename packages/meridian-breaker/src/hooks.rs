//! Hook-table fan-out (§4.6, §9 "Cyclic module references"). The
//! coordinator never holds an owning reference to an engine; instead each
//! engine publishes an observer object implementing
//! [`meridian_types::hooks::CircuitBreakerHook`] and the assembling crate
//! (`meridian-app`) registers it here after every engine is constructed.

use meridian_types::hooks::CircuitBreakerHook;

/// Static fan-out: which sibling modules get notified when `module`
/// opens a breaker. Oracle informs DEX (price-sensitive swaps should
/// short-circuit); DEX informs Compute (in case compute pricing ever
/// references pool prices); Compute has no siblings to inform.
fn siblings_of(module: &str) -> &'static [&'static str] {
    match module {
        "oracle" => &["dex"],
        "dex" => &["compute"],
        _ => &[],
    }
}

/// Holds the observer registered by each module, keyed by module name.
/// Engines register themselves once at app-assembly time; the registry
/// itself has no knowledge of engine internals.
#[derive(Default)]
pub struct HookTable {
    observers: Vec<(String, Box<dyn CircuitBreakerHook>)>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: &str, hook: Box<dyn CircuitBreakerHook>) {
        self.observers.push((module.to_string(), hook));
    }

    /// Called by the coordinator right after a successful `Open` (§4.6).
    /// The sibling is only informed; it never auto-opens its own
    /// breaker in response.
    pub fn fan_out(&mut self, opened_module: &str, sub_id: &str, reason: &str) {
        for sibling in siblings_of(opened_module) {
            for (module, hook) in self.observers.iter_mut() {
                if module == sibling {
                    hook.on_circuit_breaker_triggered(opened_module, sub_id, reason);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(std::rc::Rc<std::cell::RefCell<Vec<String>>>);
    impl CircuitBreakerHook for Recorder {
        fn on_circuit_breaker_triggered(&mut self, module: &str, sub_id: &str, reason: &str) {
            self.0.borrow_mut().push(format!("{module}/{sub_id}:{reason}"));
        }
    }

    #[test]
    fn oracle_open_informs_dex_not_compute() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut table = HookTable::new();
        table.register("dex", Box::new(Recorder(log.clone())));
        table.register("compute", Box::new(Recorder(log.clone())));

        table.fan_out("oracle", "ETH/USD", "deviation");

        assert_eq!(log.borrow().as_slice(), ["oracle/ETH/USD:deviation"]);
    }
}
