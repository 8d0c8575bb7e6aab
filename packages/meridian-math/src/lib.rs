//! Pricing & math kernel (§4.2). All fee and share math is integer
//! arithmetic in basis points; every multiplication is overflow-checked;
//! division truncates toward zero. A dedicated [`mul_div`] avoids
//! intermediate overflow the way the teacher's `compute_swap` routes
//! through `Uint256` before narrowing back to `Uint128`.

pub mod decimal;
pub mod isqrt;

use cosmwasm_std::Uint128;
use meridian_types::error::{CoreError, CoreResult};

/// 100% in basis points.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// `a * b / c`, computed in `Uint256` so the intermediate product can
/// never overflow `Uint128`, then narrowed back down. Division truncates
/// toward zero. Fails the transaction (returns an error, does not panic)
/// if the final result does not fit in `Uint128` or `c` is zero.
pub fn mul_div(a: Uint128, b: Uint128, c: Uint128) -> CoreResult<Uint128> {
    if c.is_zero() {
        return Err(CoreError::InvalidArgument("mul_div by zero".into()));
    }
    let product = a.full_mul(b);
    let quotient = product
        .checked_div(c.into())
        .map_err(|e| CoreError::InvariantViolation(e.to_string()))?;
    quotient
        .try_into()
        .map_err(|_| CoreError::InvariantViolation("mul_div result overflowed Uint128".into()))
}

/// Checked addition; fails the transaction on overflow rather than wrap.
pub fn checked_add(a: Uint128, b: Uint128) -> CoreResult<Uint128> {
    a.checked_add(b)
        .map_err(|e| CoreError::InvariantViolation(e.to_string()))
}

/// Checked subtraction; fails the transaction on underflow rather than wrap.
pub fn checked_sub(a: Uint128, b: Uint128) -> CoreResult<Uint128> {
    a.checked_sub(b)
        .map_err(|e| CoreError::InvariantViolation(e.to_string()))
}

/// Checked multiplication; fails the transaction on overflow rather than wrap.
pub fn checked_mul(a: Uint128, b: Uint128) -> CoreResult<Uint128> {
    a.checked_mul(b)
        .map_err(|e| CoreError::InvariantViolation(e.to_string()))
}

/// Basis-point scaling: `amount * bps / 10_000`, truncating.
pub fn apply_bps(amount: Uint128, bps: u64) -> CoreResult<Uint128> {
    mul_div(amount, Uint128::from(bps), Uint128::from(BPS_DENOMINATOR))
}
