// SPDX-License-Identifier: AGPL-3.0-only
//! Pool events. Indexers consume these as JSON; amounts are decimal strings.

use crate::types::{u128_str, Address, TokenId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PoolEvent {
    /// Emitted on a successful deposit
    LiquidityAdded {
        provider: Address,
        recipient: Address,
        #[serde(with = "u128_str")]
        amount_low: u128,
        #[serde(with = "u128_str")]
        amount_high: u128,
        #[serde(with = "u128_str")]
        shares: u128,
    },
    /// Emitted on a successful withdrawal
    LiquidityRemoved {
        provider: Address,
        recipient: Address,
        #[serde(with = "u128_str")]
        amount_low: u128,
        #[serde(with = "u128_str")]
        amount_high: u128,
        #[serde(with = "u128_str")]
        shares: u128,
    },
    /// Emitted on a successful swap
    Swap {
        sender: Address,
        recipient: Address,
        token_in: TokenId,
        token_out: TokenId,
        #[serde(with = "u128_str")]
        amount_in: u128,
        #[serde(with = "u128_str")]
        amount_out: u128,
    },
    /// Reserve snapshot after every reserve write
    Sync {
        #[serde(with = "u128_str")]
        reserve_low: u128,
        #[serde(with = "u128_str")]
        reserve_high: u128,
    },
}

impl PoolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::LiquidityAdded { .. } => "LiquidityAdded",
            PoolEvent::LiquidityRemoved { .. } => "LiquidityRemoved",
            PoolEvent::Swap { .. } => "Swap",
            PoolEvent::Sync { .. } => "Sync",
        }
    }
}
