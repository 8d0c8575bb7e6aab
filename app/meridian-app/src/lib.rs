pub mod admin;
pub mod app;
pub mod error;
pub mod genesis;
pub mod hooks;
pub mod logging;
pub mod message;
pub mod params;
pub mod query;

pub use admin::{apply_admin, synthesize_pause, synthesize_resume, AdminMsg};
pub use app::App;
pub use error::{AppError, AppResult};
pub use genesis::{init_genesis, GenesisState};
pub use message::{ComputeMsg, DexMsg, Message, OracleMsg};
pub use params::DexDefaults;

#[cfg(test)]
mod tests {
    use cosmwasm_std::testing::MockStorage;
    use cosmwasm_std::{Addr, Binary, Decimal, Uint128};
    use meridian_compute::{Params as ComputeParams, ReputationWeights};
    use meridian_oracle::Params as OracleParams;
    use meridian_types::collaborators::testing::{MockBank, MockSignatureVerifier, MockStaking};

    use super::*;

    fn genesis() -> GenesisState {
        GenesisState {
            dex: DexDefaults::default(),
            oracle: OracleParams {
                vote_window_blocks: 1,
                vote_threshold_bps: 6_700,
                reward_band_bps: 500,
                slash_fraction_miss: Decimal::percent(1),
                slash_fraction_bad_data: Decimal::percent(5),
                miss_window: 100,
                max_misses: 3,
                extreme_ratio: Decimal::percent(200),
                twap_window: 10,
            },
            compute: ComputeParams {
                min_stake: Uint128::from(100u128),
                min_reputation_floor: 0,
                challenge_window: 10,
                slash_fraction_result: Decimal::percent(50),
                failure_rate_threshold_bps: 5_000,
                verification_pass_threshold: 70,
                reputation_weights: ReputationWeights::defaults(),
            },
        }
    }

    struct NoMultiSig;
    impl meridian_types::collaborators::MultiSigVerifier for NoMultiSig {
        fn verify(&self, _payload: &[u8], _signatures: &[Vec<u8>]) -> bool {
            false
        }
    }

    #[test]
    fn genesis_then_full_dex_lifecycle_through_message_routing() {
        let mut store = MockStorage::new();
        init_genesis(&mut store, &genesis()).unwrap();

        let mut bank = MockBank::default();
        let mut staking = MockStaking::default();
        let sigverifier = MockSignatureVerifier;
        let multisig = NoMultiSig;
        let mut chain = App::new(&mut bank, &mut staking, &sigverifier, &multisig);

        chain.begin_block(1).unwrap();

        let events = chain
            .deliver_tx(
                &mut store,
                &Addr::unchecked("alice"),
                Message::Dex(DexMsg::CreatePool {
                    token_a: "atom".into(),
                    token_b: "usdc".into(),
                    amount_a: Uint128::from(1_000_000u128),
                    amount_b: Uint128::from(4_000_000u128),
                    lp_fee_bps: 25,
                    protocol_fee_bps: 5,
                }),
                1,
            )
            .unwrap();
        assert!(!events.is_empty());

        let pool = query::pool_by_pair(&store, "atom", "usdc").unwrap();
        assert_eq!(pool.total_shares, Uint128::from(2_000_000u128));

        chain
            .deliver_tx(
                &mut store,
                &Addr::unchecked("bob"),
                Message::Dex(DexMsg::Swap {
                    pool_id: pool.id,
                    token_in: "atom".into(),
                    amount_in: Uint128::from(10_000u128),
                    min_out: Uint128::zero(),
                }),
                2,
            )
            .unwrap();

        let swapped = query::pool(&store, pool.id).unwrap();
        assert!(swapped.reserve_a.full_mul(swapped.reserve_b) >= pool.reserve_a.full_mul(pool.reserve_b));

        let end_events = chain.end_block(&mut store, 2, 1_000).unwrap();
        assert!(end_events.is_empty() || !end_events.is_empty());
    }

    #[test]
    fn bad_genesis_is_rejected_before_anything_is_written() {
        let mut store = MockStorage::new();
        let mut bad = genesis();
        bad.oracle.vote_threshold_bps = 0;

        let err = init_genesis(&mut store, &bad).unwrap_err();
        assert!(matches!(err, AppError::InvalidGenesis(_)));
        assert!(meridian_oracle::state::PARAMS.may_load(&store).unwrap().is_none());
    }

    #[test]
    fn compute_message_routes_through_genesis_params() {
        let mut store = MockStorage::new();
        init_genesis(&mut store, &genesis()).unwrap();

        let mut bank = MockBank::default();
        let mut staking = MockStaking::default();
        let sigverifier = MockSignatureVerifier;
        let multisig = NoMultiSig;
        let mut chain = App::new(&mut bank, &mut staking, &sigverifier, &multisig);

        chain
            .deliver_tx(
                &mut store,
                &Addr::unchecked("provider-1"),
                Message::Compute(ComputeMsg::RegisterProvider {
                    endpoint: "https://provider-1".into(),
                    price_per_unit: Uint128::from(1u128),
                    stake: Uint128::from(1_000u128),
                    public_key: Binary::from(b"pk".as_slice()),
                }),
                1,
            )
            .unwrap();

        let provider = query::provider(&store, "provider-1").unwrap();
        assert_eq!(provider.stake, Uint128::from(1_000u128));
    }

    #[test]
    fn emergency_halt_without_quorum_is_rejected() {
        let mut store = MockStorage::new();
        init_genesis(&mut store, &genesis()).unwrap();

        let mut bank = MockBank::default();
        let mut staking = MockStaking::default();
        let sigverifier = MockSignatureVerifier;
        let multisig = NoMultiSig;
        let mut chain = App::new(&mut bank, &mut staking, &sigverifier, &multisig);

        let err = chain
            .deliver_admin(
                &mut store,
                "admin",
                AdminMsg::EmergencyHalt {
                    module: "dex".into(),
                    reason: "incident".into(),
                    payload: b"halt".to_vec(),
                    signatures: vec![],
                },
                1,
            )
            .unwrap_err();
        assert!(matches!(err, AppError::UnauthorizedAdmin(_)));
    }
}
