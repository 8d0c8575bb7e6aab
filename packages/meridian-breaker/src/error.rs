use cosmwasm_std::StdError;
use meridian_types::error::CoreError;
use thiserror::Error;

/// Breaker coordinator errors, mirroring the teacher's
/// `ContractError::Std(#[from] StdError)` wrapping pattern.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BreakerError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("breaker {module}/{sub_id} is already open")]
    AlreadyOpen { module: String, sub_id: String },

    #[error("breaker {module}/{sub_id} is already closed")]
    AlreadyClosed { module: String, sub_id: String },

    #[error("auto_resume_at must be greater than opened_at")]
    InvalidAutoResume {},

    #[error("multi-signature verification failed for emergency halt")]
    MultiSigFailed {},
}

impl From<StdError> for BreakerError {
    fn from(err: StdError) -> Self {
        BreakerError::Core(CoreError::from(err))
    }
}

pub type BreakerResult<T> = Result<T, BreakerError>;
