// SPDX-License-Identifier: AGPL-3.0-only
//! Arguments and results of the mutating pool operations.
//!
//! Tokens and amounts are given in the caller's A/B order; the pool maps
//! them onto its canonical low/high order and maps results back.

use crate::types::{u128_str, Address, TokenId};
use serde::{Deserialize, Serialize};

/// Arguments of [`crate::Pool::add_liquidity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidityParams {
    pub token_a: TokenId,
    pub token_b: TokenId,
    #[serde(with = "u128_str")]
    pub amount_a_desired: u128,
    #[serde(with = "u128_str")]
    pub amount_b_desired: u128,
    #[serde(with = "u128_str")]
    pub amount_a_min: u128,
    #[serde(with = "u128_str")]
    pub amount_b_min: u128,
    /// Receives the minted shares
    pub recipient: Address,
    /// Last second (inclusive) at which the call may execute
    pub deadline: u64,
}

/// Arguments of [`crate::Pool::remove_liquidity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLiquidityParams {
    pub token_a: TokenId,
    pub token_b: TokenId,
    #[serde(with = "u128_str")]
    pub shares: u128,
    #[serde(with = "u128_str")]
    pub amount_a_min: u128,
    #[serde(with = "u128_str")]
    pub amount_b_min: u128,
    /// Receives the withdrawn tokens
    pub recipient: Address,
    pub deadline: u64,
}

/// Arguments of [`crate::Pool::swap_exact_tokens_for_tokens`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    #[serde(with = "u128_str")]
    pub amount_in: u128,
    #[serde(with = "u128_str")]
    pub amount_out_min: u128,
    /// `[token_in, token_out]`
    pub path: Vec<TokenId>,
    pub recipient: Address,
    pub deadline: u64,
}

impl SwapParams {
    /// Single-hop swap of exactly `amount_in` of `token_in` for `token_out`.
    pub fn exact_in(
        token_in: TokenId,
        token_out: TokenId,
        amount_in: u128,
        amount_out_min: u128,
        recipient: Address,
        deadline: u64,
    ) -> Self {
        Self {
            amount_in,
            amount_out_min,
            path: vec![token_in, token_out],
            recipient,
            deadline,
        }
    }
}

/// Deposited amounts in caller order and the shares minted for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidityOutcome {
    #[serde(with = "u128_str")]
    pub amount_a: u128,
    #[serde(with = "u128_str")]
    pub amount_b: u128,
    #[serde(with = "u128_str")]
    pub shares: u128,
}

/// Withdrawn amounts in caller order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLiquidityOutcome {
    #[serde(with = "u128_str")]
    pub amount_a: u128,
    #[serde(with = "u128_str")]
    pub amount_b: u128,
}
