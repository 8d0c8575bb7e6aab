use cosmwasm_std::{StdError, Uint128};
use meridian_types::error::CoreError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DexError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("a pool for this pair already exists")]
    PairAlreadyExists {},

    #[error("pool {0} not found")]
    PoolNotFound(u64),

    #[error("deposit and withdrawal amounts must be nonzero")]
    ZeroAmount {},

    #[error("resulting shares {got} below minimum {min}")]
    SlippageShares { got: Uint128, min: Uint128 },

    #[error("swap output {got} below minimum {min}")]
    SlippageOutput { got: Uint128, min: Uint128 },

    #[error("token {0} is not one of this pool's assets")]
    UnknownToken(String),

    #[error("position holds {held} shares, cannot burn {requested}")]
    InsufficientShares { held: Uint128, requested: Uint128 },

    #[error("post-swap invariant decreased")]
    InvariantDecreased {},
}

impl From<StdError> for DexError {
    fn from(err: StdError) -> Self {
        DexError::Core(CoreError::from(err))
    }
}

pub type DexResult<T> = Result<T, DexError>;
