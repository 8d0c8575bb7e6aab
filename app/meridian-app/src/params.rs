//! Governance parameters the DEX engine itself does not persist (§4.3: fee
//! bps are supplied per-pool at `CreatePool`, but the deviation threshold
//! and auto-resume window are chain-wide defaults every `Swap` falls back
//! to unless a caller overrides them).

use cosmwasm_schema::cw_serde;
use meridian_dex::{DEFAULT_AUTO_RESUME_BLOCKS, DEFAULT_DEVIATION_THRESHOLD_BPS};
use meridian_kv::Item;

#[cw_serde]
pub struct DexDefaults {
    pub deviation_threshold_bps: u64,
    pub auto_resume_blocks: u64,
}

impl Default for DexDefaults {
    fn default() -> Self {
        Self {
            deviation_threshold_bps: DEFAULT_DEVIATION_THRESHOLD_BPS,
            auto_resume_blocks: DEFAULT_AUTO_RESUME_BLOCKS,
        }
    }
}

/// Stored under the app's own prefix, not the DEX engine's, since the DEX
/// engine's data model (§3) has no params entity of its own.
pub const DEX_DEFAULTS: Item<DexDefaults> = Item::new("app__dex_defaults");
