use cosmwasm_std::StdError;
use meridian_types::error::CoreError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ComputeError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("provider {0} is already registered")]
    ProviderAlreadyExists(String),

    #[error("provider {0} not found")]
    ProviderNotFound(String),

    #[error("provider stake {got} below minimum {min}")]
    InsufficientStake { got: cosmwasm_std::Uint128, min: cosmwasm_std::Uint128 },

    #[error("provider {0} has requests in flight, cannot deregister")]
    ProviderHasActiveRequests(String),

    #[error("request {0} not found")]
    RequestNotFound(u64),

    #[error("nonce {0} already used")]
    NonceReused(u64),

    #[error("no qualifying provider available for assignment")]
    NoProviderAvailable {},

    #[error("request {id} is in status {status}, expected {expected}")]
    UnexpectedStatus { id: u64, status: String, expected: String },

    #[error("provider {assigned} is assigned to request {request_id}, not {got}")]
    ProviderMismatch { request_id: u64, assigned: String, got: String },

    #[error("signature verification failed for request {0}")]
    InvalidSignature(u64),

    #[error("request {0} is not within its challenge window")]
    ChallengeWindowClosed(u64),
}

impl From<StdError> for ComputeError {
    fn from(err: StdError) -> Self {
        ComputeError::Core(CoreError::from(err))
    }
}

pub type ComputeResult<T> = Result<T, ComputeError>;
