//! Integer square root via Newton's method (§4.2, §9 "Integer math &
//! overflow"). Used to mint bootstrap LP shares as the geometric mean of
//! the two deposited reserves.

use cosmwasm_std::{Uint128, Uint256};

/// Largest integer `r` such that `r * r <= n`. Deterministic: the Newton
/// iteration is monotonically decreasing once past the first step, so it
/// always terminates, and for the same `n` it always performs the same
/// number of steps on every node.
pub fn isqrt(n: Uint256) -> Uint128 {
    if n.is_zero() {
        return Uint128::zero();
    }

    let two = Uint256::from(2u8);
    let mut x = n;
    let mut y = (x + Uint256::one()) / two;
    while y < x {
        x = y;
        y = (x + n / x) / two;
    }

    x.try_into().unwrap_or(Uint128::MAX)
}

/// Convenience for the common case of two `Uint128` reserve amounts.
pub fn isqrt_product(a: Uint128, b: Uint128) -> Uint128 {
    isqrt(Uint256::from(a) * Uint256::from(b))
}
