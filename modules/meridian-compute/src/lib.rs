pub mod contract;
pub mod error;
pub mod scoring;
pub mod state;

pub use contract::{
    accept_request, cancel_request, deregister_provider, end_block_sweep, get_provider, get_request,
    register_provider, signing_message, sub_id_provider, submit_challenge, submit_request, submit_result,
    update_provider,
};
pub use error::{ComputeError, ComputeResult};
pub use state::{Escrow, EscrowState, Params, Provider, ProviderStatus, Request, RequestStatus, ReputationWeights};

#[cfg(test)]
mod tests {
    use cosmwasm_std::{testing::MockStorage, Addr, Binary, Decimal, Uint128};
    use meridian_types::collaborators::testing::{MockBank, MockSignatureVerifier};

    use super::*;

    fn params() -> Params {
        Params {
            min_stake: Uint128::from(100u128),
            min_reputation_floor: 0,
            challenge_window: 10,
            slash_fraction_result: Decimal::percent(50),
            failure_rate_threshold_bps: 5_000,
            verification_pass_threshold: 70,
            reputation_weights: ReputationWeights::defaults(),
        }
    }

    fn register(store: &mut MockStorage, bank: &mut MockBank, params: &Params, name: &str, stake: u128) {
        register_provider(
            store,
            bank,
            params,
            &Addr::unchecked(name),
            format!("https://{name}"),
            Uint128::from(1u128),
            Uint128::from(stake),
            Binary::from(format!("pk-{name}").into_bytes()),
            1,
        )
        .unwrap();
    }

    #[test]
    fn happy_path_completes_and_pays_provider() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let params = params();
        register(&mut store, &mut bank, &params, "provider-1", 1_000);

        let (request, _) = submit_request(
            &mut store,
            &mut bank,
            &params,
            &Addr::unchecked("alice"),
            Binary::from(b"job".as_slice()),
            Uint128::from(1_000u128),
            200,
            1,
            1,
        )
        .unwrap();
        assert_eq!(request.status, RequestStatus::Assigned);
        assert_eq!(request.provider, Some("provider-1".to_string()));

        accept_request(&mut store, &Addr::unchecked("provider-1"), request.id, 2).unwrap();

        let result_hash = b"hash".to_vec();
        let sig = signing_message(request.id, &result_hash, request.nonce);
        submit_result(
            &mut store,
            &params,
            &Addr::unchecked("provider-1"),
            request.id,
            Binary::from(result_hash.clone()),
            Binary::from(sig),
            Binary::from(b"hash-and-more".as_slice()),
            5,
        )
        .unwrap();

        let too_early = end_block_sweep(&mut store, &mut bank, &params, 14).unwrap();
        assert!(too_early.is_empty());
        assert_eq!(get_request(&store, request.id).unwrap().status, RequestStatus::Challenged);

        let events = end_block_sweep(&mut store, &mut bank, &params, 15).unwrap();
        assert!(!events.is_empty());
        assert_eq!(get_request(&store, request.id).unwrap().status, RequestStatus::Completed);

        let provider = get_provider(&store, "provider-1").unwrap();
        assert_eq!(provider.completed, 1);
        assert!(provider.reputation_score > 5_000);
    }

    #[test]
    fn deadline_miss_refunds_requester_and_slashes_on_first_failure() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let mut params = params();
        params.failure_rate_threshold_bps = 1;
        register(&mut store, &mut bank, &params, "provider-1", 1_000);

        let (request, _) = submit_request(
            &mut store,
            &mut bank,
            &params,
            &Addr::unchecked("alice"),
            Binary::from(b"job".as_slice()),
            Uint128::from(500u128),
            5,
            1,
            1,
        )
        .unwrap();
        assert_eq!(request.status, RequestStatus::Assigned);

        let events = end_block_sweep(&mut store, &mut bank, &params, 5).unwrap();
        assert!(!events.is_empty());

        assert_eq!(get_request(&store, request.id).unwrap().status, RequestStatus::Failed);
        assert_eq!(bank.balance_of(&Addr::unchecked("alice")), Uint128::zero());

        let provider = get_provider(&store, "provider-1").unwrap();
        assert_eq!(provider.failed, 1);
        assert_eq!(provider.status, ProviderStatus::Slashed);
        assert_eq!(provider.stake, Uint128::from(500u128));
    }

    #[test]
    fn assignment_prefers_higher_reputation_then_stake_then_address() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let params = params();
        register(&mut store, &mut bank, &params, "b-provider", 1_000);
        register(&mut store, &mut bank, &params, "a-provider", 1_000);

        let (request, _) = submit_request(
            &mut store,
            &mut bank,
            &params,
            &Addr::unchecked("alice"),
            Binary::from(b"job".as_slice()),
            Uint128::from(1u128),
            200,
            7,
            1,
        )
        .unwrap();

        // Equal reputation and stake, so the deterministic tiebreak is
        // lexicographic address order.
        assert_eq!(request.provider, Some("a-provider".to_string()));
    }

    #[test]
    fn nonce_reuse_is_rejected() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let params = params();
        register(&mut store, &mut bank, &params, "provider-1", 1_000);

        submit_request(
            &mut store,
            &mut bank,
            &params,
            &Addr::unchecked("alice"),
            Binary::from(b"job".as_slice()),
            Uint128::from(10u128),
            200,
            42,
            1,
        )
        .unwrap();

        let err = submit_request(
            &mut store,
            &mut bank,
            &params,
            &Addr::unchecked("bob"),
            Binary::from(b"job2".as_slice()),
            Uint128::from(10u128),
            200,
            42,
            2,
        )
        .unwrap_err();
        assert_eq!(err, ComputeError::NonceReused(42));
    }

    #[test]
    fn deregister_blocked_while_request_in_flight() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let params = params();
        register(&mut store, &mut bank, &params, "provider-1", 1_000);

        submit_request(
            &mut store,
            &mut bank,
            &params,
            &Addr::unchecked("alice"),
            Binary::from(b"job".as_slice()),
            Uint128::from(1u128),
            200,
            1,
            1,
        )
        .unwrap();

        let err = deregister_provider(&mut store, &mut bank, &Addr::unchecked("provider-1")).unwrap_err();
        assert_eq!(err, ComputeError::ProviderHasActiveRequests("provider-1".to_string()));
    }

    #[test]
    fn empty_signature_is_rejected_at_submission() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let params = params();
        register(&mut store, &mut bank, &params, "provider-1", 1_000);

        let (request, _) = submit_request(
            &mut store,
            &mut bank,
            &params,
            &Addr::unchecked("alice"),
            Binary::from(b"job".as_slice()),
            Uint128::from(1u128),
            200,
            1,
            1,
        )
        .unwrap();
        accept_request(&mut store, &Addr::unchecked("provider-1"), request.id, 2).unwrap();

        let err = submit_result(
            &mut store,
            &params,
            &Addr::unchecked("provider-1"),
            request.id,
            Binary::from(b"hash".as_slice()),
            Binary::from(Vec::new()),
            Binary::from(b"hash-and-more".as_slice()),
            5,
        )
        .unwrap_err();
        assert_eq!(err, ComputeError::InvalidSignature(request.id));
        assert_eq!(get_request(&store, request.id).unwrap().status, RequestStatus::Processing);
    }

    #[test]
    fn challenge_catches_a_forged_result() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let params = params();
        register(&mut store, &mut bank, &params, "provider-1", 1_000);

        let (request, _) = submit_request(
            &mut store,
            &mut bank,
            &params,
            &Addr::unchecked("alice"),
            Binary::from(b"job".as_slice()),
            Uint128::from(1_000u128),
            200,
            1,
            1,
        )
        .unwrap();
        accept_request(&mut store, &Addr::unchecked("provider-1"), request.id, 2).unwrap();

        // A provider that never actually did the work: the "signature" does
        // not match what it should have signed, the proof blob carries no
        // trace of the claimed hash, and the answer lands after the
        // request's own deadline.
        submit_result(
            &mut store,
            &params,
            &Addr::unchecked("provider-1"),
            request.id,
            Binary::from(b"hash".as_slice()),
            Binary::from(b"forged-signature".as_slice()),
            Binary::from(b"unrelated-proof".as_slice()),
            250,
        )
        .unwrap();

        let verifier = MockSignatureVerifier;
        let events = submit_challenge(
            &mut store,
            &mut bank,
            &verifier,
            &params,
            &Addr::unchecked("challenger"),
            request.id,
            Binary::from(b"counter".as_slice()),
            6,
        )
        .unwrap();
        assert!(!events.is_empty());

        assert_eq!(get_request(&store, request.id).unwrap().status, RequestStatus::Failed);
        assert_eq!(bank.balance_of(&Addr::unchecked("alice")), Uint128::zero());
    }

    #[test]
    fn challenge_upholds_an_honest_result() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let params = params();
        register(&mut store, &mut bank, &params, "provider-1", 1_000);

        let (request, _) = submit_request(
            &mut store,
            &mut bank,
            &params,
            &Addr::unchecked("alice"),
            Binary::from(b"job".as_slice()),
            Uint128::from(1_000u128),
            200,
            1,
            1,
        )
        .unwrap();
        accept_request(&mut store, &Addr::unchecked("provider-1"), request.id, 2).unwrap();

        let result_hash = b"hash".to_vec();
        let sig = signing_message(request.id, &result_hash, request.nonce);
        submit_result(
            &mut store,
            &params,
            &Addr::unchecked("provider-1"),
            request.id,
            Binary::from(result_hash.clone()),
            Binary::from(sig),
            Binary::from(b"hash-and-more".as_slice()),
            5,
        )
        .unwrap();

        let verifier = MockSignatureVerifier;
        submit_challenge(
            &mut store,
            &mut bank,
            &verifier,
            &params,
            &Addr::unchecked("challenger"),
            request.id,
            Binary::from(b"counter".as_slice()),
            6,
        )
        .unwrap();

        assert_eq!(get_request(&store, request.id).unwrap().status, RequestStatus::Completed);
        assert_eq!(get_provider(&store, "provider-1").unwrap().completed, 1);
    }
}
