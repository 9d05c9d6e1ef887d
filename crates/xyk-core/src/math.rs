// SPDX-License-Identifier: AGPL-3.0-only
//! Integer-only constant-product math (no f32/f64).
//!
//! Amounts and reserves are `u128`. Intermediate products are taken in
//! 256 bits, so `u128 * u128` can never overflow. A three-factor product can,
//! and is computed with `checked_mul`; that overflow and the narrowing of a
//! final result back to `u128` both surface as `PoolError::Overflow`.

use crate::error::PoolError;
use crate::{FEE_DENOMINATOR, FEE_NUMERATOR, PRICE_SCALE};
use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer for overflow-free intermediates.
    pub struct U256(4);
}

/// Widen a `u128` into 256 bits.
#[inline]
pub fn wide(v: u128) -> U256 {
    U256::from(v)
}

/// Narrow a 256-bit result back into `u128`.
pub fn narrow(v: U256) -> Result<u128, PoolError> {
    if v > U256::from(u128::MAX) {
        return Err(PoolError::Overflow);
    }
    Ok(v.low_u128())
}

/// `floor(a * b / d)` with a 256-bit intermediate. `None` when `d == 0` or the
/// quotient does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    let q = wide(a) * wide(b) / wide(d);
    if q > U256::from(u128::MAX) {
        None
    } else {
        Some(q.low_u128())
    }
}

/// `reserve_low * reserve_high`, the constant-product invariant.
pub fn product(x: u128, y: u128) -> U256 {
    wide(x) * wide(y)
}

/// Integer square root by Newton's method. Returns floor(√y).
///
/// Starts from `y/2 + 1` and iterates `x ← (x + y/x) / 2` while the estimate
/// keeps decreasing. `isqrt(0) = 0`, `isqrt(1..=3) = 1`.
pub fn isqrt(y: U256) -> U256 {
    if y > U256::from(3u8) {
        let mut z = y;
        let mut x = y / U256::from(2u8) + U256::one();
        while x < z {
            z = x;
            x = (y / x + x) / U256::from(2u8);
        }
        z
    } else if !y.is_zero() {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Output of a swap of `amount_in` against `(reserve_in, reserve_out)` with the
/// 0.3% input fee:
///
/// `amount_out = amount_in·997·reserve_out / (reserve_in·1000 + amount_in·997)`
///
/// Floor division keeps the rounding remainder in the pool.
pub fn get_amount_out(
    amount_in: u128,
    reserve_in: u128,
    reserve_out: u128,
) -> Result<u128, PoolError> {
    if amount_in == 0 {
        return Err(PoolError::InsufficientInputAmount);
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(PoolError::InsufficientLiquidity);
    }
    let amount_in_with_fee = wide(amount_in) * wide(FEE_NUMERATOR);
    let numerator = amount_in_with_fee
        .checked_mul(wide(reserve_out))
        .ok_or(PoolError::Overflow)?;
    let denominator = wide(reserve_in) * wide(FEE_DENOMINATOR) + amount_in_with_fee;
    narrow(numerator / denominator)
}

/// Smallest input that makes [`get_amount_out`] return at least `amount_out`.
pub fn get_amount_in(
    amount_out: u128,
    reserve_in: u128,
    reserve_out: u128,
) -> Result<u128, PoolError> {
    if amount_out == 0 {
        return Err(PoolError::InsufficientOutputAmount);
    }
    if reserve_in == 0 || reserve_out == 0 || amount_out >= reserve_out {
        return Err(PoolError::InsufficientLiquidity);
    }
    let numerator = (wide(reserve_in) * wide(amount_out))
        .checked_mul(wide(FEE_DENOMINATOR))
        .ok_or(PoolError::Overflow)?;
    let denominator = wide(reserve_out - amount_out) * wide(FEE_NUMERATOR);
    narrow(numerator / denominator + U256::one())
}

/// Amount of B that keeps a deposit of `amount_a` at the current reserve ratio.
pub fn quote(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Result<u128, PoolError> {
    if amount_a == 0 {
        return Err(PoolError::InsufficientAmount);
    }
    if reserve_a == 0 || reserve_b == 0 {
        return Err(PoolError::InsufficientLiquidity);
    }
    mul_div(amount_a, reserve_b, reserve_a).ok_or(PoolError::Overflow)
}

/// `reserve_other · 1e18 / reserve_base`: 18-decimal fixed-point spot price of
/// the base token denominated in the other token.
pub fn spot_price(reserve_base: u128, reserve_other: u128) -> Result<u128, PoolError> {
    if reserve_base == 0 || reserve_other == 0 {
        return Err(PoolError::NoLiquidity);
    }
    mul_div(reserve_other, PRICE_SCALE, reserve_base).ok_or(PoolError::Overflow)
}

// ─────────────────────────────────────────────────────────────
// TESTS
// ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isqrt_small_values() {
        let cases: [(u64, u64); 10] = [
            (0, 0),
            (1, 1),
            (2, 1),
            (3, 1),
            (4, 2),
            (8, 2),
            (9, 3),
            (15, 3),
            (16, 4),
            (2_000_000, 1414),
        ];
        for (input, expected) in cases {
            assert_eq!(isqrt(U256::from(input)), U256::from(expected), "isqrt({input})");
        }
    }

    #[test]
    fn test_isqrt_is_floor_for_large_values() {
        let y = product(u128::MAX, u128::MAX);
        let r = isqrt(y);
        assert_eq!(r, U256::from(u128::MAX));

        let n = U256::from(10u64).pow(U256::from(30u8)) + U256::from(12_345u64);
        let r = isqrt(n);
        assert!(r * r <= n);
        assert!((r + U256::one()) * (r + U256::one()) > n);
    }

    #[test]
    fn test_get_amount_out_reference_swap() {
        // 10 in against (1000, 2000): 9970·2000 / (1_000_000 + 9970) = 19
        assert_eq!(get_amount_out(10, 1000, 2000).unwrap(), 19);
    }

    #[test]
    fn test_get_amount_out_errors() {
        assert_eq!(get_amount_out(0, 1, 1), Err(PoolError::InsufficientInputAmount));
        assert_eq!(get_amount_out(1, 0, 1), Err(PoolError::InsufficientLiquidity));
        assert_eq!(get_amount_out(1, 1, 0), Err(PoolError::InsufficientLiquidity));
    }

    #[test]
    fn test_get_amount_out_never_drains_reserve() {
        let out = get_amount_out(u128::MAX, 1, 1_000_000).unwrap();
        assert!(out < 1_000_000);
    }

    #[test]
    fn test_get_amount_in_inverts_get_amount_out() {
        let (r_in, r_out) = (5_000_000u128, 9_000_000u128);
        for want in [1u128, 10, 1_000, 123_456, 4_000_000] {
            let need = get_amount_in(want, r_in, r_out).unwrap();
            assert!(get_amount_out(need, r_in, r_out).unwrap() >= want);
            if need > 1 {
                assert!(get_amount_out(need - 1, r_in, r_out).unwrap() < want + 1);
            }
        }
    }

    #[test]
    fn test_get_amount_in_errors() {
        assert_eq!(get_amount_in(0, 10, 10), Err(PoolError::InsufficientOutputAmount));
        assert_eq!(get_amount_in(10, 10, 10), Err(PoolError::InsufficientLiquidity));
        assert_eq!(get_amount_in(1, 0, 10), Err(PoolError::InsufficientLiquidity));
    }

    #[test]
    fn test_quote_is_proportional() {
        assert_eq!(quote(100, 1000, 2000).unwrap(), 200);
        assert_eq!(quote(3, 1000, 2000).unwrap(), 6);
        assert_eq!(quote(1, 3, 2).unwrap(), 0);
        assert_eq!(quote(0, 1, 1), Err(PoolError::InsufficientAmount));
        assert_eq!(quote(1, 0, 1), Err(PoolError::InsufficientLiquidity));
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // u128::MAX * 2 / 4 would overflow a u128 intermediate
        assert_eq!(mul_div(u128::MAX, 2, 4), Some(u128::MAX / 2));
        assert_eq!(mul_div(u128::MAX, 2, 1), None);
        assert_eq!(mul_div(1, 1, 0), None);
    }

    #[test]
    fn test_spot_price() {
        assert_eq!(spot_price(1000, 2000).unwrap(), 2 * PRICE_SCALE);
        assert_eq!(spot_price(2000, 1000).unwrap(), PRICE_SCALE / 2);
        assert_eq!(spot_price(0, 1000), Err(PoolError::NoLiquidity));
        assert_eq!(spot_price(1, u128::MAX), Err(PoolError::Overflow));
    }

    #[test]
    fn test_amounts_at_u128_extremes_do_not_panic() {
        let max = u128::MAX;
        assert_eq!(get_amount_out(max, max, max), Err(PoolError::Overflow));
        assert_eq!(get_amount_in(max / 2, max, max), Err(PoolError::Overflow));
        assert_eq!(get_amount_in(max - 1, max, max), Err(PoolError::Overflow));

        // Largest reserves that still fit: 997·2^64 · 2^64 < 2^256
        let r = 1u128 << 64;
        let out = get_amount_out(r, r, r).unwrap();
        assert!(out < r);
        let need = get_amount_in(out, r, r).unwrap();
        assert!(get_amount_out(need, r, r).unwrap() >= out);
    }

    #[test]
    fn test_edge_corners_return_ok_or_err() {
        let corners = [0u128, 1, 2, 997, 1_000, u64::MAX as u128, u128::MAX / 1_000, u128::MAX - 1, u128::MAX];
        for &amount in &corners {
            for &reserve_in in &corners {
                for &reserve_out in &corners {
                    if let Ok(out) = get_amount_out(amount, reserve_in, reserve_out) {
                        assert!(out < reserve_out);
                    }
                    if let Ok(needed) = get_amount_in(amount, reserve_in, reserve_out) {
                        if let Ok(bought) = get_amount_out(needed, reserve_in, reserve_out) {
                            assert!(bought >= amount);
                        }
                    }
                    let _ = quote(amount, reserve_in, reserve_out);
                    let _ = spot_price(reserve_in, reserve_out);
                    let p = product(reserve_in, reserve_out);
                    let root = isqrt(p);
                    assert!(root * root <= p);
                }
            }
        }
    }

    #[test]
    fn test_narrow() {
        assert_eq!(narrow(U256::from(7u8)).unwrap(), 7);
        assert_eq!(narrow(U256::from(u128::MAX) + U256::one()), Err(PoolError::Overflow));
    }
}
