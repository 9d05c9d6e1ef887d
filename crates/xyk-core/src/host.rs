// SPDX-License-Identifier: AGPL-3.0-only
//! Collaborators the pool ledger consumes but does not implement.
//!
//! The ledger never moves tokens, reads a clock or publishes events itself.
//! It asks the host through these traits, at fixed points of each operation:
//! deposits pull tokens in *before* touching internal state, withdrawals and
//! swap payouts push tokens out *after* internal state is committed.
//!
//! On failure the pool restores its own state. Transfers that already
//! succeeded within the failed operation belong to the host, which must
//! discard them as part of the same unit (see `xyk-runtime`).

use crate::error::TransferError;
use crate::events::PoolEvent;
use crate::types::{Address, TokenId};

/// Exact, all-or-nothing token movement.
///
/// An `Err` means nothing moved. A partial transfer is never reported as
/// success.
pub trait TokenTransfer {
    /// Move `amount` of `token` from `from` into the pool custody account `to`.
    fn transfer_in(
        &mut self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TransferError>;

    /// Move `amount` of `token` out of pool custody `from` to `to`.
    fn transfer_out(
        &mut self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TransferError>;
}

/// Identity of the current caller and the current time (seconds).
pub trait ExecutionContext {
    fn now(&self) -> u64;
    fn caller(&self) -> Address;
}

/// Receiver of advisory notifications. Delivery is best-effort and never
/// affects pool state.
pub trait EventSink {
    fn emit(&mut self, event: PoolEvent);
}

/// Everything a mutating pool operation needs from its environment.
pub trait PoolHost: TokenTransfer + ExecutionContext + EventSink {}

impl<T: TokenTransfer + ExecutionContext + EventSink> PoolHost for T {}
