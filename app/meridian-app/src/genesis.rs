//! Chain-start genesis: one JSON blob per module, validated before any of
//! it is written to the store (§6 "Genesis state": "no initial pools, no
//! initial requests ... validated at chain start and rejected on
//! invariant violations").

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Storage;

use meridian_compute::Params as ComputeParams;
use meridian_oracle::Params as OracleParams;
use meridian_types::collaborators::GenesisValidate;
use meridian_types::error::CoreError;

use crate::error::{AppError, AppResult};
use crate::params::{DexDefaults, DEX_DEFAULTS};

#[cw_serde]
pub struct GenesisState {
    pub dex: DexDefaults,
    pub oracle: OracleParams,
    pub compute: ComputeParams,
}

impl GenesisValidate for GenesisState {
    fn validate_genesis(&self) -> Result<(), CoreError> {
        if self.dex.deviation_threshold_bps == 0 || self.dex.deviation_threshold_bps >= 10_000 {
            return Err(CoreError::InvalidArgument(
                "dex.deviation_threshold_bps must be in (0, 10000)".into(),
            ));
        }
        if self.dex.auto_resume_blocks == 0 {
            return Err(CoreError::InvalidArgument("dex.auto_resume_blocks must be positive".into()));
        }

        if self.oracle.vote_threshold_bps == 0 || self.oracle.vote_threshold_bps > 10_000 {
            return Err(CoreError::InvalidArgument(
                "oracle.vote_threshold_bps must be in (0, 10000]".into(),
            ));
        }
        if self.oracle.vote_window_blocks == 0 {
            return Err(CoreError::InvalidArgument("oracle.vote_window_blocks must be positive".into()));
        }
        if self.oracle.twap_window == 0 {
            return Err(CoreError::InvalidArgument("oracle.twap_window must be positive".into()));
        }

        if self.compute.challenge_window == 0 {
            return Err(CoreError::InvalidArgument("compute.challenge_window must be positive".into()));
        }
        if self.compute.verification_pass_threshold > 100 {
            return Err(CoreError::InvalidArgument(
                "compute.verification_pass_threshold must be at most 100".into(),
            ));
        }
        let weights = &self.compute.reputation_weights;
        let total = weights.reliability_bps + weights.accuracy_bps + weights.speed_bps + weights.availability_bps;
        if total != 10_000 {
            return Err(CoreError::InvalidArgument(format!(
                "compute.reputation_weights must sum to 10000 bps, got {total}"
            )));
        }

        Ok(())
    }
}

/// Validates `genesis`, then writes each module's params into its own
/// storage prefix. Rejects the whole genesis atomically: nothing is
/// written if validation fails.
pub fn init_genesis(store: &mut dyn Storage, genesis: &GenesisState) -> AppResult<()> {
    genesis
        .validate_genesis()
        .map_err(|e| AppError::InvalidGenesis(e.to_string()))?;

    DEX_DEFAULTS.save(store, &genesis.dex).map_err(CoreError::from)?;
    meridian_oracle::state::PARAMS.save(store, &genesis.oracle).map_err(CoreError::from)?;
    meridian_compute::state::PARAMS.save(store, &genesis.compute).map_err(CoreError::from)?;
    Ok(())
}
