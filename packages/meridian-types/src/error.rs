use cosmwasm_std::StdError;
use thiserror::Error;

/// Cross-cutting error taxonomy shared by every engine (§7 of the spec).
///
/// Each engine wraps this in its own `ContractError` via `#[from]` and adds
/// engine-local variants on top, mirroring the teacher's
/// `ContractError::Std(#[from] StdError)` pattern.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0}")]
    Std(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized {},

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("circuit breaker open for {module}/{sub_id}")]
    BreakerOpen { module: String, sub_id: String },

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("slashing condition met: {0}")]
    Slashing(String),

    #[error("replay detected: {0}")]
    Replay(String),

    #[error("deadline exceeded at height {height}")]
    DeadlineExceeded { height: u64 },
}

impl From<StdError> for CoreError {
    fn from(err: StdError) -> Self {
        CoreError::Std(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
