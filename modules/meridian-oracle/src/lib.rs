pub mod contract;
pub mod error;
pub mod snapshot;
pub mod state;

pub use contract::{clear_feeder, delegate_feeder, end_block, submit_price, twap, AggregationOutcome};
pub use error::{OracleError, OracleResult};
pub use state::{AggregatedPrice, Params, PriceSnapshot, ValidatorMissCounter, ValidatorPrice};

#[cfg(test)]
mod tests {
    use cosmwasm_std::{testing::MockStorage, Addr, Decimal, Uint128};
    use meridian_types::collaborators::testing::MockStaking;
    use meridian_types::hooks::NullHooks;

    use super::*;

    fn params() -> Params {
        Params {
            vote_window_blocks: 1,
            vote_threshold_bps: 6_700,
            reward_band_bps: 500,
            slash_fraction_miss: Decimal::percent(1),
            slash_fraction_bad_data: Decimal::percent(5),
            miss_window: 100,
            max_misses: 3,
            extreme_ratio: Decimal::percent(300),
            twap_window: 10,
        }
    }

    fn staking_with(stakes: &[(&str, u128)]) -> MockStaking {
        let mut staking = MockStaking::default();
        for (validator, stake) in stakes {
            staking.bonded.insert(Addr::unchecked(*validator), Uint128::from(*stake));
        }
        staking
    }

    #[test]
    fn weighted_median_matches_scenario_three() {
        let mut store = MockStorage::new();
        let params = params();
        let mut staking = staking_with(&[("v1", 10), ("v2", 30), ("v3", 10)]);

        submit_price(&mut store, &staking, &params, &Addr::unchecked("v1"), "eth", Decimal::percent(10_000), 1).unwrap();
        submit_price(&mut store, &staking, &params, &Addr::unchecked("v2"), "eth", Decimal::percent(11_000), 1).unwrap();
        submit_price(&mut store, &staking, &params, &Addr::unchecked("v3"), "eth", Decimal::percent(20_000), 1).unwrap();

        let outcome = end_block(&mut store, &mut staking, &params, 1, 1_000, &mut NullHooks, &mut meridian_breaker::HookTable::new()).unwrap();
        assert_eq!(outcome.aggregated.len(), 1);
        assert_eq!(outcome.aggregated[0].price, Decimal::percent(11_000));
    }

    #[test]
    fn quorum_miss_increments_non_submitters_only() {
        let mut store = MockStorage::new();
        let params = params();
        let stakes: Vec<(&str, u128)> = vec![
            ("v1", 100), ("v2", 100), ("v3", 100), ("v4", 100),
            ("v5", 100), ("v6", 100), ("v7", 100), ("v8", 100),
            ("v9", 100), ("v10", 100),
        ];
        let mut staking = staking_with(&stakes);

        for v in ["v1", "v2", "v3", "v4"] {
            submit_price(&mut store, &staking, &params, &Addr::unchecked(v), "btc", Decimal::percent(100), 1).unwrap();
        }

        let outcome = end_block(&mut store, &mut staking, &params, 1, 1_000, &mut NullHooks, &mut meridian_breaker::HookTable::new()).unwrap();
        assert!(outcome.aggregated.is_empty());

        for v in ["v5", "v6", "v7", "v8", "v9", "v10"] {
            let miss = state::MISS_COUNTERS.load(&store, v).unwrap();
            assert_eq!(miss.miss_streak, 1);
        }
        for v in ["v1", "v2", "v3", "v4"] {
            let miss = state::MISS_COUNTERS.may_load(&store, v).unwrap();
            assert_eq!(miss.map(|m| m.miss_streak).unwrap_or(0), 0);
        }
    }

    #[test]
    fn feeder_delegation_allows_submission_on_validators_behalf() {
        let mut store = MockStorage::new();
        let params = params();
        let staking = staking_with(&[("validator-1", 500)]);

        delegate_feeder(&mut store, &Addr::unchecked("validator-1"), &Addr::unchecked("feeder-1")).unwrap();

        let event = submit_price(
            &mut store,
            &staking,
            &params,
            &Addr::unchecked("feeder-1"),
            "atom",
            Decimal::percent(1_000),
            5,
        )
        .unwrap();
        assert!(event.attributes.iter().any(|a| a.value == "validator-1"));
    }

    #[test]
    fn clearing_feeder_revokes_its_submission_rights() {
        let mut store = MockStorage::new();
        let params = params();
        let staking = staking_with(&[("validator-1", 500)]);

        delegate_feeder(&mut store, &Addr::unchecked("validator-1"), &Addr::unchecked("feeder-1")).unwrap();
        clear_feeder(&mut store, &Addr::unchecked("validator-1")).unwrap();

        let err = submit_price(
            &mut store,
            &staking,
            &params,
            &Addr::unchecked("feeder-1"),
            "atom",
            Decimal::percent(1_000),
            5,
        )
        .unwrap_err();
        assert_eq!(err, OracleError::UnknownSigner {});
    }

    #[test]
    fn price_outside_sanity_band_is_rejected() {
        let mut store = MockStorage::new();
        let params = params();
        let mut staking = staking_with(&[("v1", 100)]);

        submit_price(&mut store, &staking, &params, &Addr::unchecked("v1"), "eth", Decimal::percent(10_000), 1).unwrap();
        end_block(&mut store, &mut staking, &params, 1, 1, &mut NullHooks, &mut meridian_breaker::HookTable::new()).unwrap();

        let err = submit_price(
            &mut store,
            &staking,
            &params,
            &Addr::unchecked("v1"),
            "eth",
            Decimal::percent(10_000_000),
            2,
        )
        .unwrap_err();
        assert!(matches!(err, OracleError::PriceOutOfBand { .. }));
    }

    #[test]
    fn large_deviation_opens_oracle_breaker_for_asset() {
        let mut store = MockStorage::new();
        let mut params = params();
        params.extreme_ratio = Decimal::percent(100_000);
        let mut staking = staking_with(&[("v1", 100)]);

        submit_price(&mut store, &staking, &params, &Addr::unchecked("v1"), "eth", Decimal::percent(10_000), 1).unwrap();
        end_block(&mut store, &mut staking, &params, 1, 1, &mut NullHooks, &mut meridian_breaker::HookTable::new()).unwrap();

        submit_price(&mut store, &staking, &params, &Addr::unchecked("v1"), "eth", Decimal::percent(40_000), 2).unwrap();
        end_block(&mut store, &mut staking, &params, 2, 2, &mut NullHooks, &mut meridian_breaker::HookTable::new()).unwrap();

        assert!(meridian_breaker::is_open(&store, "oracle", "eth"));
    }
}
