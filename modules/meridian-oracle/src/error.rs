use cosmwasm_std::{Decimal, StdError};
use meridian_types::error::CoreError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OracleError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("signer is neither a bonded validator nor a delegated feeder")]
    UnknownSigner {},

    #[error("validator is jailed")]
    ValidatorJailed {},

    #[error("price must be strictly positive")]
    NonPositivePrice {},

    #[error("price {price} outside sanity band [{lower}, {upper}]")]
    PriceOutOfBand {
        price: Decimal,
        lower: Decimal,
        upper: Decimal,
    },
}

impl From<StdError> for OracleError {
    fn from(err: StdError) -> Self {
        OracleError::Core(CoreError::from(err))
    }
}

impl From<meridian_circular_buffer::error::BufferError> for OracleError {
    fn from(err: meridian_circular_buffer::error::BufferError) -> Self {
        OracleError::Core(CoreError::Std(err.to_string()))
    }
}

pub type OracleResult<T> = Result<T, OracleError>;
