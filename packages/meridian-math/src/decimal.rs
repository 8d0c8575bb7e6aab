//! Fixed-point price type (§4.2): `Decimal256`, scale 10^18, used only for
//! oracle prices and TWAP. Share and reserve math stays on integers.

use cosmwasm_std::{Decimal, Decimal256, Fraction, Uint128};

/// Narrows a `Decimal256` down to a `Decimal`, saturating at `Decimal::MAX`
/// instead of erroring, per §4.2 ("saturating on conversion"). Grounded on
/// the teacher's `observation::try_dec256_into_dec`, which instead returns
/// an error on overflow; oracle query responses cannot fail a read this
/// way, so we saturate.
pub fn saturating_dec256_to_dec(value: Decimal256) -> Decimal {
    let numerator: Uint128 = value.numerator().try_into().unwrap_or(Uint128::MAX);
    Decimal::from_ratio(numerator, Decimal::one().denominator())
}

/// Widens a `Decimal` into a `Decimal256` for overflow-safe intermediate
/// computation (weighted median, TWAP accumulation).
pub fn widen(value: Decimal) -> Decimal256 {
    Decimal256::from(value)
}
