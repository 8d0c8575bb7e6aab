pub mod collaborators;
pub mod error;
pub mod event;
pub mod hooks;
pub mod module;

/// Block height, as supplied by consensus. The only notion of "time"
/// available inside a handler (§5).
pub type Height = u64;
