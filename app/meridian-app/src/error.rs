use thiserror::Error;

use meridian_breaker::BreakerError;
use meridian_compute::ComputeError;
use meridian_dex::DexError;
use meridian_oracle::OracleError;
use meridian_types::error::CoreError;

/// Top-level error a delivered transaction or EndBlock step can fail with.
/// Each variant wraps one engine's own error type rather than flattening
/// them, so a caller can still match on e.g. `DexError::SlippageOutput`
/// after routing.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error(transparent)]
    Dex(#[from] DexError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Compute(#[from] ComputeError),

    #[error(transparent)]
    Breaker(#[from] BreakerError),

    #[error("genesis invalid: {0}")]
    InvalidGenesis(String),

    #[error("unauthorized admin action: {0}")]
    UnauthorizedAdmin(String),
}

pub type AppResult<T> = Result<T, AppError>;
