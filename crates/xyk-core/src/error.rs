// SPDX-License-Identifier: AGPL-3.0-only
//! Failure kinds of the pool ledger and its transfer collaborator.
//!
//! Every failure is deterministic for a given input and pool state; there is
//! no retryable class. A failed operation leaves no observable state change.

use crate::types::{Address, Side, TokenId};
use serde::{Deserialize, Serialize};

/// Errors returned by [`crate::Pool`] operations and the pure math helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind")]
pub enum PoolError {
    /// The caller's deadline is earlier than the current time
    #[error("deadline expired")]
    Expired,
    /// Tokens do not match the pool's pair
    #[error("token pair does not match this pool")]
    InvalidPair,
    /// Recipient is the null address
    #[error("recipient must not be the null address")]
    InvalidRecipient,
    /// Optimal deposit fell below the caller's minimum for one side
    #[error("deposit amount for {side} below minimum")]
    AmountTooLow { side: Side },
    /// `isqrt(low * high)` of the first deposit does not exceed the locked minimum
    #[error("initial liquidity must exceed the locked minimum")]
    InsufficientInitialLiquidity,
    /// A deposit would mint zero shares
    #[error("deposit would mint zero shares")]
    ZeroLiquidityMinted,
    /// Zero shares requested for withdrawal
    #[error("share amount must be greater than zero")]
    InvalidShareAmount,
    /// Caller holds fewer shares than requested
    #[error("insufficient share balance")]
    InsufficientBalance,
    /// Only the locked minimum remains
    #[error("pool holds only the locked minimum liquidity")]
    PoolDepleted,
    /// Withdrawal amount for one side fell below the caller's minimum
    #[error("withdrawal amount for {side} below minimum")]
    InsufficientAmountWithdrawn { side: Side },
    /// Swap path is not exactly `[token_in, token_out]`
    #[error("swap path must contain exactly two tokens")]
    InvalidPath,
    /// Identical tokens supplied where two distinct ones are required
    #[error("tokens must be distinct")]
    IdenticalTokens,
    /// Null token id supplied at pool construction
    #[error("token id must not be null")]
    InvalidToken,
    /// Zero input amount for a swap or output computation
    #[error("input amount must be greater than zero")]
    InsufficientInputAmount,
    /// Zero amount passed to `quote`
    #[error("amount must be greater than zero")]
    InsufficientAmount,
    /// A reserve is zero, or the requested output would drain it
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    /// Swap output below the caller's minimum (or zero)
    #[error("output amount below minimum")]
    InsufficientOutputAmount,
    /// A reserve update would leave an initialized pool with an empty side
    #[error("reserve update would zero one side of an initialized pool")]
    ZeroReservesAfterUpdate,
    /// Price requested while a reserve is zero
    #[error("pool has no liquidity")]
    NoLiquidity,
    /// A result does not fit into 128 bits
    #[error("arithmetic overflow")]
    Overflow,
    /// The transfer collaborator rejected a transfer
    #[error("token transfer failed: {0}")]
    TransferFailed(#[from] TransferError),
}

/// Errors reported by a [`crate::TokenTransfer`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "error")]
pub enum TransferError {
    #[error("token {token:?} is not known to the bank")]
    UnknownToken { token: TokenId },
    #[error("{account:?} has {have}, needs {need}")]
    InsufficientBalance {
        account: Address,
        #[serde(with = "crate::types::u128_str")]
        have: u128,
        #[serde(with = "crate::types::u128_str")]
        need: u128,
    },
    #[error("allowance of {owner:?} for {spender:?} is {have}, needs {need}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        #[serde(with = "crate::types::u128_str")]
        have: u128,
        #[serde(with = "crate::types::u128_str")]
        need: u128,
    },
    #[error("balance of {account:?} would overflow")]
    Overflow { account: Address },
    #[error("transfer rejected: {message}")]
    Rejected { message: String },
}

impl PoolError {
    /// Stable kind name, e.g. `"InsufficientBalance"`. Used in receipts and
    /// CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            PoolError::Expired => "Expired",
            PoolError::InvalidPair => "InvalidPair",
            PoolError::InvalidRecipient => "InvalidRecipient",
            PoolError::AmountTooLow { .. } => "AmountTooLow",
            PoolError::InsufficientInitialLiquidity => "InsufficientInitialLiquidity",
            PoolError::ZeroLiquidityMinted => "ZeroLiquidityMinted",
            PoolError::InvalidShareAmount => "InvalidShareAmount",
            PoolError::InsufficientBalance => "InsufficientBalance",
            PoolError::PoolDepleted => "PoolDepleted",
            PoolError::InsufficientAmountWithdrawn { .. } => "InsufficientAmountWithdrawn",
            PoolError::InvalidPath => "InvalidPath",
            PoolError::IdenticalTokens => "IdenticalTokens",
            PoolError::InvalidToken => "InvalidToken",
            PoolError::InsufficientInputAmount => "InsufficientInputAmount",
            PoolError::InsufficientAmount => "InsufficientAmount",
            PoolError::InsufficientLiquidity => "InsufficientLiquidity",
            PoolError::InsufficientOutputAmount => "InsufficientOutputAmount",
            PoolError::ZeroReservesAfterUpdate => "ZeroReservesAfterUpdate",
            PoolError::NoLiquidity => "NoLiquidity",
            PoolError::Overflow => "Overflow",
            PoolError::TransferFailed(_) => "TransferFailed",
        }
    }
}
