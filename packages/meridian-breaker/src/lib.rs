pub mod contract;
pub mod error;
pub mod hooks;
pub mod state;

pub use contract::{auto_resume_sweep, close, get_all_states, get_state, is_open, open, set_half_open};
pub use error::{BreakerError, BreakerResult};
pub use hooks::HookTable;
pub use state::{BreakerState, BreakerStatus, Transition};
