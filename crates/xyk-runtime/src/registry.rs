// SPDX-License-Identifier: AGPL-3.0-only
//! # Pool Registry: read-only pool summaries, quotes and LP positions
//!
//! Pure views over a [`Pool`]. Nothing here mutates state or calls the
//! transfer collaborator, so these are safe to serve from snapshots.

use crate::bank::TokenBank;
use serde::{Deserialize, Serialize};
use xyk_core::math::{self, wide};
use xyk_core::types::u128_str;
use xyk_core::{Address, Pool, PoolError, TokenId, FEE_BPS, FEE_DENOMINATOR, FEE_NUMERATOR};

/// Basis point denominator
const BPS: u128 = 10_000;

/// Pool summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    pub token_low: TokenId,
    pub token_high: TokenId,
    /// Bank symbol of `token_low` (empty if unregistered)
    pub symbol_low: String,
    pub symbol_high: String,
    #[serde(with = "u128_str")]
    pub reserve_low: u128,
    #[serde(with = "u128_str")]
    pub reserve_high: u128,
    #[serde(with = "u128_str")]
    pub total_shares: u128,
    /// Fee in basis points (30 = 0.3%)
    pub fee_bps: u64,
    pub custody: Address,
    /// Number of share holders, the null holder included
    pub holders: usize,
    /// Price of `token_low` in `token_high`, 1e18-scaled; 0 while empty
    #[serde(with = "u128_str")]
    pub price_low_in_high: u128,
}

/// Summarize `pool`, resolving symbols through `bank`.
pub fn pool_info(pool: &Pool, bank: &TokenBank) -> PoolInfo {
    let (low, high) = (pool.token_low(), pool.token_high());
    PoolInfo {
        token_low: low,
        token_high: high,
        symbol_low: bank.symbol(&low).unwrap_or_default().to_string(),
        symbol_high: bank.symbol(&high).unwrap_or_default().to_string(),
        reserve_low: pool.reserve_low(),
        reserve_high: pool.reserve_high(),
        total_shares: pool.total_shares(),
        fee_bps: FEE_BPS as u64,
        custody: pool.custody(),
        holders: pool.holders().count(),
        price_low_in_high: pool.get_price(&low, &high).unwrap_or(0),
    }
}

/// Result of a quote: what a swap would pay out right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    #[serde(with = "u128_str")]
    pub amount_out: u128,
    /// Part of the input kept by the pool as fee
    #[serde(with = "u128_str")]
    pub fee: u128,
    /// Shortfall of the execution price against the spot price, fee included
    pub price_impact_bps: u64,
}

/// Quote a swap of `amount_in` against raw reserves.
pub fn quote_amounts(amount_in: u128, reserve_in: u128, reserve_out: u128) -> Result<SwapQuote, PoolError> {
    let amount_out = math::get_amount_out(amount_in, reserve_in, reserve_out)?;
    let after_fee = math::mul_div(amount_in, FEE_NUMERATOR, FEE_DENOMINATOR).ok_or(PoolError::Overflow)?;
    let fee = amount_in - after_fee;

    // exec / spot = (amount_out / amount_in) / (reserve_out / reserve_in)
    let numerator = (wide(amount_out) * wide(reserve_in))
        .checked_mul(wide(BPS))
        .ok_or(PoolError::Overflow)?;
    let ratio_bps = math::narrow(numerator / (wide(amount_in) * wide(reserve_out)))?.min(BPS);
    Ok(SwapQuote {
        amount_out,
        fee,
        price_impact_bps: (BPS - ratio_bps) as u64,
    })
}

/// Quote selling `amount_in` of `token_in` into `pool`.
pub fn compute_quote(pool: &Pool, token_in: &TokenId, amount_in: u128) -> Result<SwapQuote, PoolError> {
    let token_out = pool.counterpart(token_in).ok_or(PoolError::InvalidPair)?;
    let (reserve_in, reserve_out) = pool.get_reserves(token_in, &token_out)?;
    quote_amounts(amount_in, reserve_in, reserve_out)
}

/// A holder's shares and what they would redeem for right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpPosition {
    pub holder: Address,
    #[serde(with = "u128_str")]
    pub shares: u128,
    #[serde(with = "u128_str")]
    pub amount_low: u128,
    #[serde(with = "u128_str")]
    pub amount_high: u128,
    /// Share of the pool in basis points
    pub share_bps: u64,
}

pub fn lp_position(pool: &Pool, holder: &Address) -> LpPosition {
    let shares = pool.share_balance(holder);
    let total = pool.total_shares();
    let part = |reserve: u128| math::mul_div(shares, reserve, total).unwrap_or(0);
    LpPosition {
        holder: *holder,
        shares,
        amount_low: part(pool.reserve_low()),
        amount_high: part(pool.reserve_high()),
        share_bps: part(BPS) as u64,
    }
}

// ─────────────────────────────────────────────────────────────
// TESTS
// ─────────────────────────────────────────────────────────────
