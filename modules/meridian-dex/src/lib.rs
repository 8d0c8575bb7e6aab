pub mod contract;
pub mod error;
pub mod state;

pub use contract::{
    add_liquidity, create_pool, get_pool, get_position, remove_liquidity, sub_id, sweep_protocol_fees, swap,
    SwapOutcome, DEFAULT_AUTO_RESUME_BLOCKS, DEFAULT_DEVIATION_THRESHOLD_BPS,
};
pub use error::{DexError, DexResult};
pub use state::{LiquidityPosition, Pool};

#[cfg(test)]
mod tests {
    use cosmwasm_std::testing::MockStorage;
    use cosmwasm_std::Addr;
    use meridian_types::collaborators::testing::MockBank;
    use test_case::test_case;

    use super::*;

    fn addr(s: &str) -> Addr {
        Addr::unchecked(s)
    }

    #[test]
    fn bootstrap_liquidity_mints_geometric_mean_shares() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();

        let (pool, _) = create_pool(
            &mut store,
            &mut bank,
            &addr("alice"),
            "atom",
            "usdc",
            1_000_000u128.into(),
            4_000_000u128.into(),
            30,
            5,
            100,
        )
        .unwrap();

        assert_eq!(pool.total_shares, 2_000_000u128.into());
        let position = get_position(&store, pool.id, &addr("alice")).unwrap();
        assert_eq!(position.shares, pool.total_shares);
    }

    #[test]
    fn duplicate_pair_is_rejected() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        create_pool(
            &mut store,
            &mut bank,
            &addr("alice"),
            "atom",
            "usdc",
            1_000u128.into(),
            1_000u128.into(),
            30,
            5,
            1,
        )
        .unwrap();

        let err = create_pool(
            &mut store,
            &mut bank,
            &addr("bob"),
            "usdc",
            "atom",
            500u128.into(),
            500u128.into(),
            30,
            5,
            2,
        )
        .unwrap_err();
        assert_eq!(err, DexError::PairAlreadyExists {});
    }

    #[test]
    fn swap_preserves_or_grows_invariant_and_charges_protocol_fee() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let (pool, _) = create_pool(
            &mut store,
            &mut bank,
            &addr("alice"),
            "atom",
            "usdc",
            1_000_000u128.into(),
            1_000_000u128.into(),
            30,
            5,
            1,
        )
        .unwrap();
        let k_before = pool.reserve_a.full_mul(pool.reserve_b);

        let outcome = swap(
            &mut store,
            &mut bank,
            pool.id,
            &addr("trader"),
            "atom",
            10_000u128.into(),
            0u128.into(),
            2,
            None,
            None,
        )
        .unwrap();

        let k_after = outcome.pool.reserve_a.full_mul(outcome.pool.reserve_b);
        assert!(k_after >= k_before);
        assert!(!outcome.protocol_fee_amount.is_zero());
        assert!(!outcome.breaker_tripped);
    }

    #[test]
    fn large_swap_trips_price_deviation_breaker() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let (pool, _) = create_pool(
            &mut store,
            &mut bank,
            &addr("alice"),
            "atom",
            "usdc",
            1_000_000u128.into(),
            1_000_000u128.into(),
            30,
            5,
            1,
        )
        .unwrap();

        let outcome = swap(
            &mut store,
            &mut bank,
            pool.id,
            &addr("trader"),
            "atom",
            900_000u128.into(),
            0u128.into(),
            2,
            None,
            None,
        )
        .unwrap();

        assert!(outcome.breaker_tripped);
        assert!(meridian_breaker::is_open(&store, "dex", "pool:1"));
    }

    #[test]
    fn swap_rejected_while_pool_breaker_open() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let (pool, _) = create_pool(
            &mut store,
            &mut bank,
            &addr("alice"),
            "atom",
            "usdc",
            1_000_000u128.into(),
            1_000_000u128.into(),
            30,
            5,
            1,
        )
        .unwrap();

        meridian_breaker::open(&mut store, "dex", "pool:1", "admin", "manual", None, 2, None).unwrap();

        let err = swap(
            &mut store,
            &mut bank,
            pool.id,
            &addr("trader"),
            "atom",
            10_000u128.into(),
            0u128.into(),
            3,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DexError::Core(meridian_types::error::CoreError::BreakerOpen {
                module: "dex".into(),
                sub_id: "pool:1".into(),
            })
        );
    }

    #[test_case(100_000, 100_000, 1_000, 30, 5; "small swap")]
    #[test_case(1_000_000_000, 500_000_000, 1_000_000, 30, 5; "imbalanced pool")]
    fn compute_swap_never_exceeds_reserve(
        reserve_a: u128,
        reserve_b: u128,
        amount_in: u128,
        lp_fee_bps: u64,
        protocol_fee_bps: u64,
    ) {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let (pool, _) = create_pool(
            &mut store,
            &mut bank,
            &addr("alice"),
            "atom",
            "usdc",
            reserve_a.into(),
            reserve_b.into(),
            lp_fee_bps,
            protocol_fee_bps,
            1,
        )
        .unwrap();

        let outcome = swap(
            &mut store,
            &mut bank,
            pool.id,
            &addr("trader"),
            "atom",
            amount_in.into(),
            0u128.into(),
            2,
            None,
            None,
        )
        .unwrap();

        assert!(outcome.amount_out < cosmwasm_std::Uint128::from(reserve_b));
    }

    #[test]
    fn remove_liquidity_returns_pro_rata_share() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let (pool, _) = create_pool(
            &mut store,
            &mut bank,
            &addr("alice"),
            "atom",
            "usdc",
            1_000_000u128.into(),
            1_000_000u128.into(),
            30,
            5,
            1,
        )
        .unwrap();

        let (updated, _) = remove_liquidity(
            &mut store,
            &mut bank,
            pool.id,
            &addr("alice"),
            pool.total_shares,
            0u128.into(),
            0u128.into(),
        )
        .unwrap();

        assert!(updated.reserve_a.is_zero());
        assert!(updated.reserve_b.is_zero());
        assert!(updated.total_shares.is_zero());
    }

    #[test]
    fn sweep_protocol_fees_resets_accumulator() {
        let mut store = MockStorage::new();
        let mut bank = MockBank::default();
        let (pool, _) = create_pool(
            &mut store,
            &mut bank,
            &addr("alice"),
            "atom",
            "usdc",
            1_000_000u128.into(),
            1_000_000u128.into(),
            30,
            5,
            1,
        )
        .unwrap();
        swap(
            &mut store,
            &mut bank,
            pool.id,
            &addr("trader"),
            "atom",
            10_000u128.into(),
            0u128.into(),
            2,
            None,
            None,
        )
        .unwrap();

        let (amount_a, _amount_b, _event) =
            sweep_protocol_fees(&mut store, &mut bank, pool.id, &addr("treasury")).unwrap();
        assert!(!amount_a.is_zero());

        let swept_again = sweep_protocol_fees(&mut store, &mut bank, pool.id, &addr("treasury"));
        assert!(swept_again.is_err());
    }
}
