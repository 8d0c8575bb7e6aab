//! KV-Store Abstraction (§4.1): a per-block transactional overlay backed
//! by whatever commit tree the external consensus engine provides
//! (out of scope here, per §1). Each module holds a unique namespace
//! prefix (§6); iteration is always byte-lexicographic.

pub mod keys;
pub mod overlay;

pub use cosmwasm_std::{Order, Record, Storage};
pub use cw_storage_plus::{Bound, Item, Map};
pub use overlay::TxOverlay;
