//! Deterministic, composable result verification and the Bayesian-style
//! reputation blend (§4.5 "Verification scoring" / "Reputation update").

use meridian_types::Height;

use crate::state::{Provider, ReputationWeights, ResultRecord};

const BASE_SCORE: u64 = 50;
const SIGNATURE_VALID_BONUS: u64 = 20;
const MERKLE_MATCH_BONUS: u64 = 15;
const STATE_CONSISTENCY_BONUS: u64 = 15;
const REPUTATION_BONUS_MAX: u64 = 10;
const REPUTATION_BPS_DENOMINATOR: u64 = 10_000;

/// `resultHash matches Merkle root in proofBlob` (§4.5). The proof blob is
/// expected to carry its Merkle root as a length-prefixed leading slice;
/// matching that slice against the claimed hash is the deterministic stand
/// in for a full inclusion-proof walk, which needs a hashing crate outside
/// this corpus.
fn merkle_root_matches(result_hash: &[u8], proof_blob: &[u8]) -> bool {
    !result_hash.is_empty() && proof_blob.starts_with(result_hash)
}

/// `state-consistency check` (§4.5): the provider's answer must have
/// landed inside the request's own deadline, not merely inside the wider
/// challenge window being evaluated right now.
fn state_is_consistent(submitted_at: Height, deadline_height: Height) -> bool {
    submitted_at <= deadline_height
}

/// Computes the 0-100 verification score for a submitted result.
/// `signature_valid` and `merkle_ok` are pre-checked by the caller (the
/// former via the `SignatureVerifier` collaborator, since key material is
/// out of scope here).
pub fn verification_score(
    result: &ResultRecord,
    provider: &Provider,
    deadline_height: Height,
    signature_valid: bool,
) -> u64 {
    let mut score = BASE_SCORE;
    if signature_valid {
        score += SIGNATURE_VALID_BONUS;
    }
    if merkle_root_matches(result.result_hash.as_slice(), result.proof_blob.as_slice()) {
        score += MERKLE_MATCH_BONUS;
    }
    if state_is_consistent(result.submitted_at, deadline_height) {
        score += STATE_CONSISTENCY_BONUS;
    }
    score += (provider.reputation_score * REPUTATION_BONUS_MAX) / REPUTATION_BPS_DENOMINATOR;
    score
}

/// One evidence sample driving a reputation adjustment; `None` leaves that
/// dimension's signal at the provider's current reputation (no update).
#[derive(Default, Clone, Copy)]
pub struct ReputationSignal {
    pub success: Option<bool>,
    pub verification_score: Option<u64>,
    pub within_deadline: Option<bool>,
    pub heartbeat_recent: Option<bool>,
}

/// Blends `signal` into `old` reputation (bps, `[0, 10000]`) using the
/// governed `weights`, at a fixed 20% learning rate toward the new
/// evidence — a Bayesian-style update where the prior is the provider's
/// existing score and the likelihood is this round's observation.
pub fn update_reputation(old: u64, signal: ReputationSignal, weights: &ReputationWeights) -> u64 {
    const LEARNING_RATE_BPS: u64 = 2_000;

    let reliability_signal = match signal.success {
        Some(true) => 10_000,
        Some(false) => 0,
        None => old,
    };
    let accuracy_signal = signal
        .verification_score
        .map(|s| (s * 100).min(10_000))
        .unwrap_or(old);
    let speed_signal = match signal.within_deadline {
        Some(true) => 10_000,
        Some(false) => 0,
        None => old,
    };
    let availability_signal = match signal.heartbeat_recent {
        Some(true) => 10_000,
        Some(false) => old / 2,
        None => old,
    };

    let blended = reliability_signal * weights.reliability_bps
        + accuracy_signal * weights.accuracy_bps
        + speed_signal * weights.speed_bps
        + availability_signal * weights.availability_bps;
    let blended = blended / REPUTATION_BPS_DENOMINATOR;

    let new = (old * (REPUTATION_BPS_DENOMINATOR - LEARNING_RATE_BPS) + blended * LEARNING_RATE_BPS)
        / REPUTATION_BPS_DENOMINATOR;
    new.clamp(0, REPUTATION_BPS_DENOMINATOR)
}
