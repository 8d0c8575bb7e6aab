use cosmwasm_schema::cw_serde;
use cw_storage_plus::Map;
use meridian_types::Height;

/// `CLOSED → OPEN → HALF_OPEN → CLOSED` is the only legal transition
/// order (§3 "status transitions are a total order recorded in
/// history").
#[cw_serde]
#[derive(Copy, Eq)]
pub enum BreakerStatus {
    Closed,
    Open,
    HalfOpen,
}

/// One entry in a `BreakerState`'s append-only transition log.
#[cw_serde]
pub struct Transition {
    pub from: BreakerStatus,
    pub to: BreakerStatus,
    pub actor: String,
    pub reason: String,
    pub height: Height,
}

/// Per-`(module, subId)` breaker state (§3). `sub_id` is the empty string
/// for a module-wide breaker (e.g. `IsOpen("dex", "")`) and something
/// like `"pool:7"` for a scoped one.
#[cw_serde]
pub struct BreakerState {
    pub module: String,
    pub sub_id: String,
    pub status: BreakerStatus,
    pub opened_at: Option<Height>,
    pub opened_by: Option<String>,
    pub reason: Option<String>,
    pub auto_resume_at: Option<Height>,
    /// The asset/pool/request id that caused an automatic open, distinct
    /// from `opened_by` which is the acting principal (`"system"` for
    /// automatic opens). See SPEC_FULL.md §3.1.
    pub triggered_by: Option<String>,
    pub history: Vec<Transition>,
}

impl BreakerState {
    pub fn closed(module: &str, sub_id: &str) -> Self {
        Self {
            module: module.to_string(),
            sub_id: sub_id.to_string(),
            status: BreakerStatus::Closed,
            opened_at: None,
            opened_by: None,
            reason: None,
            auto_resume_at: None,
            triggered_by: None,
            history: vec![],
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, BreakerStatus::Open)
    }
}

/// Keyed by `(module, sub_id)`. Composite string keys keep iteration
/// byte-lexicographic the same way `cw_storage_plus::Map` keys every
/// other module's state (§5 "byte-lexicographic key order").
pub const BREAKERS: Map<(&str, &str), BreakerState> = Map::new("breaker__states");
