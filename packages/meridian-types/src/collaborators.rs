//! Seams to the external collaborators named out-of-scope in §1/§6.5:
//! consensus, account/balance bookkeeping, staking, governance, key
//! management. The core calls through these traits and never assumes an
//! implementation; production wiring lives outside this repository.

use cosmwasm_std::{Addr, Decimal, Uint128};

use crate::error::CoreResult;

/// Ledger the DEX reserve accounting and compute escrow debit/credit against.
/// The core never moves real tokens; it only instructs the bank module.
pub trait BankKeeper {
    fn lock(&mut self, owner: &Addr, amount: Uint128) -> CoreResult<()>;
    fn release(&mut self, owner: &Addr, amount: Uint128) -> CoreResult<()>;
    fn refund(&mut self, owner: &Addr, amount: Uint128) -> CoreResult<()>;
    /// Confiscates `amount` from a slashed party's locked balance. Unlike
    /// `refund`/`release`, the amount is never credited back to `offender`
    /// or anyone else named here — a slash must leave the system, not
    /// return to the account it was taken from (§4.5).
    fn penalize(&mut self, offender: &Addr, amount: Uint128) -> CoreResult<()>;
    fn balance_of(&self, owner: &Addr) -> Uint128;
}

/// Bonded-stake and slashing surface the oracle engine weights votes and
/// queues slashes against.
pub trait StakingKeeper {
    fn bonded_stake(&self, validator: &Addr) -> Uint128;
    fn total_bonded(&self) -> Uint128;
    fn is_jailed(&self, validator: &Addr) -> bool;
    /// The full bonded set, in a deterministic order. The oracle engine
    /// needs this to charge a miss against every validator that stayed
    /// silent in a window, not just the ones who submitted (§4.4).
    fn bonded_validators(&self) -> Vec<Addr>;
    /// Queues a slash of `fraction` of the validator's bonded stake. Must be
    /// idempotent within a single handler invocation.
    fn slash(&mut self, validator: &Addr, fraction: Decimal) -> CoreResult<()>;
    fn jail(&mut self, validator: &Addr) -> CoreResult<()>;
}

/// Threshold-signature verification backing `EmergencyHalt`.
pub trait MultiSigVerifier {
    fn verify(&self, payload: &[u8], signatures: &[Vec<u8>]) -> bool;
}

/// Single-key signature verification backing the compute engine's
/// `SubmitResult` (§4.5: "signature verified over `(requestId, resultHash,
/// nonce)` with provider's registered public key"). Kept distinct from
/// `MultiSigVerifier` since a provider signs alone, not as part of a
/// threshold set; key management itself stays out of scope (§6.5).
pub trait SignatureVerifier {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool;
}

/// Implemented per module; invoked once at chain start against that
/// module's genesis JSON blob (§6 "Genesis state").
pub trait GenesisValidate {
    fn validate_genesis(&self) -> CoreResult<()>;
}

#[cfg(feature = "testing")]
pub mod testing {
    use std::collections::BTreeMap;

    use cosmwasm_std::{Addr, Decimal, Uint128};

    use super::{BankKeeper, SignatureVerifier, StakingKeeper};
    use crate::error::CoreResult;

    #[derive(Default)]
    pub struct MockBank {
        pub balances: BTreeMap<Addr, Uint128>,
    }

    impl BankKeeper for MockBank {
        fn lock(&mut self, owner: &Addr, amount: Uint128) -> CoreResult<()> {
            *self.balances.entry(owner.clone()).or_default() += amount;
            Ok(())
        }

        fn release(&mut self, owner: &Addr, amount: Uint128) -> CoreResult<()> {
            self.refund(owner, amount)
        }

        fn refund(&mut self, owner: &Addr, amount: Uint128) -> CoreResult<()> {
            let bal = self.balances.entry(owner.clone()).or_default();
            *bal = bal.checked_sub(amount).unwrap_or_default();
            Ok(())
        }

        fn penalize(&mut self, offender: &Addr, amount: Uint128) -> CoreResult<()> {
            let bal = self.balances.entry(offender.clone()).or_default();
            *bal = bal.checked_sub(amount).unwrap_or_default();
            Ok(())
        }

        fn balance_of(&self, owner: &Addr) -> Uint128 {
            self.balances.get(owner).copied().unwrap_or_default()
        }
    }

    #[derive(Default)]
    pub struct MockStaking {
        pub bonded: BTreeMap<Addr, Uint128>,
        pub jailed: BTreeMap<Addr, bool>,
    }

    impl StakingKeeper for MockStaking {
        fn bonded_stake(&self, validator: &Addr) -> Uint128 {
            self.bonded.get(validator).copied().unwrap_or_default()
        }

        fn total_bonded(&self) -> Uint128 {
            self.bonded.values().fold(Uint128::zero(), |a, b| a + *b)
        }

        fn is_jailed(&self, validator: &Addr) -> bool {
            self.jailed.get(validator).copied().unwrap_or(false)
        }

        fn bonded_validators(&self) -> Vec<Addr> {
            self.bonded.keys().cloned().collect()
        }

        fn slash(&mut self, validator: &Addr, fraction: Decimal) -> CoreResult<()> {
            if let Some(stake) = self.bonded.get_mut(validator) {
                *stake -= *stake * fraction;
            }
            Ok(())
        }

        fn jail(&mut self, validator: &Addr) -> CoreResult<()> {
            self.jailed.insert(validator.clone(), true);
            Ok(())
        }
    }

    /// Fakes signature validity as byte equality between `signature` and
    /// `message`, so tests can construct a "valid" signature without a real
    /// keypair. Never wired into production; real verification happens
    /// outside this repository (§6.5).
    #[derive(Default)]
    pub struct MockSignatureVerifier;

    impl SignatureVerifier for MockSignatureVerifier {
        fn verify(&self, _public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
            message == signature
        }
    }
}
