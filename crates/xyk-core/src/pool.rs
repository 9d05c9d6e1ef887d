// SPDX-License-Identifier: AGPL-3.0-only
//! # Pool Ledger
//!
//! State and operations of one constant-product pool.
//!
//! ## State
//! | Field            | Meaning                                              |
//! |------------------|------------------------------------------------------|
//! | `token_low`      | lower of the two token ids (byte order), immutable   |
//! | `token_high`     | higher of the two token ids, immutable               |
//! | `custody`        | account that holds the pool's tokens                 |
//! | `reserve_low`    | pool balance of `token_low`                          |
//! | `reserve_high`   | pool balance of `token_high`                         |
//! | `total_shares`   | all minted LP shares, locked minimum included        |
//! | `share_balances` | holder → shares, sums to `total_shares`              |
//!
//! Reserves are either both zero (uninitialized) or both positive.
//!
//! ## Operations
//! Each mutating operation validates its preconditions, computes the new
//! state, and calls the [`TokenTransfer`](crate::TokenTransfer) collaborator
//! at a fixed point: deposits pull tokens in before any internal mutation,
//! withdrawals and swap payouts push tokens out after internal state is
//! committed. A failing operation restores the ledger to its state before the
//! call, and its events are never emitted.

use crate::error::PoolError;
use crate::events::PoolEvent;
use crate::host::PoolHost;
use crate::math;
use crate::params::{
    AddLiquidityOutcome, AddLiquidityParams, RemoveLiquidityOutcome, RemoveLiquidityParams,
    SwapParams,
};
use crate::types::{u128_map_str, u128_str, Address, Side, TokenId};
use crate::{MINIMUM_LIQUIDITY, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    token_low: TokenId,
    token_high: TokenId,
    custody: Address,
    #[serde(with = "u128_str")]
    reserve_low: u128,
    #[serde(with = "u128_str")]
    reserve_high: u128,
    #[serde(with = "u128_str")]
    total_shares: u128,
    /// BTreeMap for deterministic snapshots
    #[serde(with = "u128_map_str")]
    share_balances: BTreeMap<Address, u128>,
}

/// Map an (a, b) pair onto (low, high), or back. The mapping is its own inverse.
fn reorder(a_is_low: bool, a: u128, b: u128) -> (u128, u128) {
    if a_is_low {
        (a, b)
    } else {
        (b, a)
    }
}

impl Pool {
    /// Create an empty pool for two distinct, non-null tokens.
    pub fn new(token_a: TokenId, token_b: TokenId) -> Result<Self, PoolError> {
        if token_a == token_b {
            return Err(PoolError::IdenticalTokens);
        }
        if token_a.is_zero() || token_b.is_zero() {
            return Err(PoolError::InvalidToken);
        }
        let (token_low, token_high) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Ok(Self {
            token_low,
            token_high,
            custody: Address::pool_custody(&token_low, &token_high),
            reserve_low: 0,
            reserve_high: 0,
            total_shares: 0,
            share_balances: BTreeMap::new(),
        })
    }

    // ─────────────────────────────────────────────────────────
    // READ SURFACE
    // ─────────────────────────────────────────────────────────

    pub fn token_low(&self) -> TokenId {
        self.token_low
    }

    pub fn token_high(&self) -> TokenId {
        self.token_high
    }

    pub fn reserve_low(&self) -> u128 {
        self.reserve_low
    }

    pub fn reserve_high(&self) -> u128 {
        self.reserve_high
    }

    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    /// Account holding the pool's tokens; the target of every transfer-in.
    pub fn custody(&self) -> Address {
        self.custody
    }

    pub fn share_balance(&self, holder: &Address) -> u128 {
        self.share_balances.get(holder).copied().unwrap_or(0)
    }

    /// `(reserve_low, reserve_high)`
    pub fn reserves(&self) -> (u128, u128) {
        (self.reserve_low, self.reserve_high)
    }

    /// Reserves in the caller's token order.
    pub fn get_reserves(&self, token_a: &TokenId, token_b: &TokenId) -> Result<(u128, u128), PoolError> {
        let a_is_low = self.orient(token_a, token_b)?;
        Ok(reorder(a_is_low, self.reserve_low, self.reserve_high))
    }

    /// Share holders in address order, the null holder included once the
    /// pool is initialized.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, u128)> + '_ {
        self.share_balances.iter().map(|(k, v)| (k, *v))
    }

    pub fn is_initialized(&self) -> bool {
        self.reserve_low > 0 && self.reserve_high > 0
    }

    /// `reserve_low * reserve_high` in 256 bits.
    pub fn product(&self) -> U256 {
        math::product(self.reserve_low, self.reserve_high)
    }

    /// True if `token` is one of the pool's two tokens.
    pub fn contains(&self, token: &TokenId) -> bool {
        *token == self.token_low || *token == self.token_high
    }

    /// The pool's other token, if `token` belongs to the pair.
    pub fn counterpart(&self, token: &TokenId) -> Option<TokenId> {
        if *token == self.token_low {
            Some(self.token_high)
        } else if *token == self.token_high {
            Some(self.token_low)
        } else {
            None
        }
    }

    /// Canonical side of `token`, if it belongs to the pair.
    pub fn side_of(&self, token: &TokenId) -> Option<Side> {
        if *token == self.token_low {
            Some(Side::Low)
        } else if *token == self.token_high {
            Some(Side::High)
        } else {
            None
        }
    }

    /// Whether `(token_a, token_b)` is `(low, high)` (`true`) or
    /// `(high, low)` (`false`). Anything else is `InvalidPair`.
    fn orient(&self, token_a: &TokenId, token_b: &TokenId) -> Result<bool, PoolError> {
        if *token_a == self.token_low && *token_b == self.token_high {
            Ok(true)
        } else if *token_a == self.token_high && *token_b == self.token_low {
            Ok(false)
        } else {
            Err(PoolError::InvalidPair)
        }
    }

    // ─────────────────────────────────────────────────────────
    // QUERIES
    // ─────────────────────────────────────────────────────────

    /// Price of `token_a` in units of `token_b`, scaled by 1e18.
    pub fn get_price(&self, token_a: &TokenId, token_b: &TokenId) -> Result<u128, PoolError> {
        let (reserve_a, reserve_b) = self.get_reserves(token_a, token_b)?;
        math::spot_price(reserve_a, reserve_b)
    }

    /// See [`math::get_amount_out`].
    pub fn get_amount_out(
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
    ) -> Result<u128, PoolError> {
        math::get_amount_out(amount_in, reserve_in, reserve_out)
    }

    /// See [`math::get_amount_in`].
    pub fn get_amount_in(
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
    ) -> Result<u128, PoolError> {
        math::get_amount_in(amount_out, reserve_in, reserve_out)
    }

    /// See [`math::quote`].
    pub fn quote(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Result<u128, PoolError> {
        math::quote(amount_a, reserve_a, reserve_b)
    }

    // ─────────────────────────────────────────────────────────
    // MUTATING OPERATIONS
    // ─────────────────────────────────────────────────────────

    /// Deposit both tokens at the current ratio and mint shares to
    /// `params.recipient`. The first deposit sets the ratio and locks
    /// `MINIMUM_LIQUIDITY` shares with the null holder.
    pub fn add_liquidity<H: PoolHost>(
        &mut self,
        host: &mut H,
        params: &AddLiquidityParams,
    ) -> Result<AddLiquidityOutcome, PoolError> {
        let out = self.transact(host, "add_liquidity", |pool, host, events| {
            pool.apply_add_liquidity(host, params, events)
        })?;
        log::info!(
            "add_liquidity: {} shares to {:?}, reserves {} / {}",
            out.shares,
            params.recipient,
            self.reserve_low,
            self.reserve_high
        );
        Ok(out)
    }

    /// Burn the caller's shares and pay out the proportional part of both
    /// reserves to `params.recipient`.
    pub fn remove_liquidity<H: PoolHost>(
        &mut self,
        host: &mut H,
        params: &RemoveLiquidityParams,
    ) -> Result<RemoveLiquidityOutcome, PoolError> {
        let out = self.transact(host, "remove_liquidity", |pool, host, events| {
            pool.apply_remove_liquidity(host, params, events)
        })?;
        log::info!(
            "remove_liquidity: burned {} shares, paid {} / {} to {:?}",
            params.shares,
            out.amount_a,
            out.amount_b,
            params.recipient
        );
        Ok(out)
    }

    /// Sell exactly `params.amount_in` of `path[0]` for `path[1]`.
    pub fn swap_exact_tokens_for_tokens<H: PoolHost>(
        &mut self,
        host: &mut H,
        params: &SwapParams,
    ) -> Result<u128, PoolError> {
        let amount_out = self.transact(host, "swap", |pool, host, events| {
            pool.apply_swap(host, params, events)
        })?;
        log::info!(
            "swap: {} in, {} out to {:?}, reserves {} / {}",
            params.amount_in,
            amount_out,
            params.recipient,
            self.reserve_low,
            self.reserve_high
        );
        Ok(amount_out)
    }

    /// Run `op` against a checkpoint of the ledger. On error the checkpoint
    /// is restored and buffered events are dropped; on success the events are
    /// handed to the host in order.
    fn transact<H, T, F>(&mut self, host: &mut H, name: &str, op: F) -> Result<T, PoolError>
    where
        H: PoolHost,
        F: FnOnce(&mut Self, &mut H, &mut Vec<PoolEvent>) -> Result<T, PoolError>,
    {
        let checkpoint = self.clone();
        let mut pending = Vec::new();
        match op(self, host, &mut pending) {
            Ok(out) => {
                for event in pending {
                    host.emit(event);
                }
                Ok(out)
            }
            Err(err) => {
                *self = checkpoint;
                log::debug!("{} rejected: {}", name, err);
                Err(err)
            }
        }
    }

    fn apply_add_liquidity<H: PoolHost>(
        &mut self,
        host: &mut H,
        p: &AddLiquidityParams,
        events: &mut Vec<PoolEvent>,
    ) -> Result<AddLiquidityOutcome, PoolError> {
        if host.now() > p.deadline {
            return Err(PoolError::Expired);
        }
        let a_is_low = self.orient(&p.token_a, &p.token_b)?;
        if p.recipient.is_zero() {
            return Err(PoolError::InvalidRecipient);
        }

        let (low_desired, high_desired) = reorder(a_is_low, p.amount_a_desired, p.amount_b_desired);
        let (low_min, high_min) = reorder(a_is_low, p.amount_a_min, p.amount_b_min);
        let (amount_low, amount_high) = self.optimal_deposit(low_desired, high_desired)?;
        if amount_low < low_min {
            return Err(PoolError::AmountTooLow { side: Side::Low });
        }
        if amount_high < high_min {
            return Err(PoolError::AmountTooLow { side: Side::High });
        }
        log::debug!(
            "add_liquidity: optimal deposit {} / {} (desired {} / {})",
            amount_low,
            amount_high,
            low_desired,
            high_desired
        );

        let provider = host.caller();
        host.transfer_in(&self.token_low, &provider, &self.custody, amount_low)?;
        host.transfer_in(&self.token_high, &provider, &self.custody, amount_high)?;

        let shares = self.mint_shares(&p.recipient, amount_low, amount_high)?;
        let new_low = self.reserve_low.checked_add(amount_low).ok_or(PoolError::Overflow)?;
        let new_high = self.reserve_high.checked_add(amount_high).ok_or(PoolError::Overflow)?;
        self.update_reserves(new_low, new_high, events)?;

        events.push(PoolEvent::LiquidityAdded {
            provider,
            recipient: p.recipient,
            amount_low,
            amount_high,
            shares,
        });
        let (amount_a, amount_b) = reorder(a_is_low, amount_low, amount_high);
        Ok(AddLiquidityOutcome {
            amount_a,
            amount_b,
            shares,
        })
    }

    /// Largest deposit not exceeding the desired amounts that keeps the
    /// current reserve ratio. An empty pool takes the desired amounts as-is.
    fn optimal_deposit(&self, low_desired: u128, high_desired: u128) -> Result<(u128, u128), PoolError> {
        if self.reserve_low == 0 && self.reserve_high == 0 {
            return Ok((low_desired, high_desired));
        }
        // A quotient beyond u128 is larger than any desired amount.
        match math::mul_div(low_desired, self.reserve_high, self.reserve_low) {
            Some(high_needed) if high_needed <= high_desired => Ok((low_desired, high_needed)),
            _ => {
                let low_needed = math::mul_div(high_desired, self.reserve_low, self.reserve_high)
                    .ok_or(PoolError::Overflow)?;
                Ok((low_needed, high_desired))
            }
        }
    }

    fn mint_shares(&mut self, recipient: &Address, amount_low: u128, amount_high: u128) -> Result<u128, PoolError> {
        let shares = if self.total_shares == 0 {
            let root = math::narrow(math::isqrt(math::product(amount_low, amount_high)))?;
            if root <= MINIMUM_LIQUIDITY {
                return Err(PoolError::InsufficientInitialLiquidity);
            }
            self.credit(&Address::ZERO, MINIMUM_LIQUIDITY)?;
            self.total_shares = MINIMUM_LIQUIDITY;
            root - MINIMUM_LIQUIDITY
        } else {
            let by_low = math::mul_div(amount_low, self.total_shares, self.reserve_low)
                .ok_or(PoolError::Overflow)?;
            let by_high = math::mul_div(amount_high, self.total_shares, self.reserve_high)
                .ok_or(PoolError::Overflow)?;
            by_low.min(by_high)
        };
        if shares == 0 {
            return Err(PoolError::ZeroLiquidityMinted);
        }
        self.total_shares = self.total_shares.checked_add(shares).ok_or(PoolError::Overflow)?;
        self.credit(recipient, shares)?;
        Ok(shares)
    }

    fn apply_remove_liquidity<H: PoolHost>(
        &mut self,
        host: &mut H,
        p: &RemoveLiquidityParams,
        events: &mut Vec<PoolEvent>,
    ) -> Result<RemoveLiquidityOutcome, PoolError> {
        if host.now() > p.deadline {
            return Err(PoolError::Expired);
        }
        let a_is_low = self.orient(&p.token_a, &p.token_b)?;
        if p.recipient.is_zero() {
            return Err(PoolError::InvalidRecipient);
        }
        if p.shares == 0 {
            return Err(PoolError::InvalidShareAmount);
        }
        let provider = host.caller();
        // The locked minimum is never withdrawable.
        let balance = if provider.is_zero() { 0 } else { self.share_balance(&provider) };
        if balance < p.shares {
            return Err(PoolError::InsufficientBalance);
        }
        if self.total_shares <= MINIMUM_LIQUIDITY {
            return Err(PoolError::PoolDepleted);
        }

        let amount_low = math::mul_div(p.shares, self.reserve_low, self.total_shares)
            .ok_or(PoolError::Overflow)?;
        let amount_high = math::mul_div(p.shares, self.reserve_high, self.total_shares)
            .ok_or(PoolError::Overflow)?;
        let (low_min, high_min) = reorder(a_is_low, p.amount_a_min, p.amount_b_min);
        if amount_low < low_min {
            return Err(PoolError::InsufficientAmountWithdrawn { side: Side::Low });
        }
        if amount_high < high_min {
            return Err(PoolError::InsufficientAmountWithdrawn { side: Side::High });
        }
        log::debug!(
            "remove_liquidity: {} of {} shares redeem {} / {}",
            p.shares,
            self.total_shares,
            amount_low,
            amount_high
        );

        self.debit(&provider, p.shares)?;
        self.total_shares = self.total_shares.checked_sub(p.shares).ok_or(PoolError::Overflow)?;
        let new_low = self.reserve_low.checked_sub(amount_low).ok_or(PoolError::Overflow)?;
        let new_high = self.reserve_high.checked_sub(amount_high).ok_or(PoolError::Overflow)?;
        self.update_reserves(new_low, new_high, events)?;

        host.transfer_out(&self.token_low, &self.custody, &p.recipient, amount_low)?;
        host.transfer_out(&self.token_high, &self.custody, &p.recipient, amount_high)?;

        events.push(PoolEvent::LiquidityRemoved {
            provider,
            recipient: p.recipient,
            amount_low,
            amount_high,
            shares: p.shares,
        });
        let (amount_a, amount_b) = reorder(a_is_low, amount_low, amount_high);
        Ok(RemoveLiquidityOutcome { amount_a, amount_b })
    }

    fn apply_swap<H: PoolHost>(
        &mut self,
        host: &mut H,
        p: &SwapParams,
        events: &mut Vec<PoolEvent>,
    ) -> Result<u128, PoolError> {
        if host.now() > p.deadline {
            return Err(PoolError::Expired);
        }
        let (token_in, token_out) = match p.path.as_slice() {
            [token_in, token_out] => (*token_in, *token_out),
            _ => return Err(PoolError::InvalidPath),
        };
        if token_in == token_out {
            return Err(PoolError::IdenticalTokens);
        }
        let in_is_low = self.orient(&token_in, &token_out)?;
        if p.amount_in == 0 {
            return Err(PoolError::InsufficientInputAmount);
        }
        if p.recipient.is_zero() {
            return Err(PoolError::InvalidRecipient);
        }
        if self.reserve_low == 0 || self.reserve_high == 0 {
            return Err(PoolError::InsufficientLiquidity);
        }

        let sender = host.caller();
        host.transfer_in(&token_in, &sender, &self.custody, p.amount_in)?;

        let (reserve_in, reserve_out) = reorder(in_is_low, self.reserve_low, self.reserve_high);
        let amount_out = math::get_amount_out(p.amount_in, reserve_in, reserve_out)?;
        if amount_out < p.amount_out_min {
            return Err(PoolError::InsufficientOutputAmount);
        }
        log::debug!(
            "swap: {} in against {} / {} yields {}",
            p.amount_in,
            reserve_in,
            reserve_out,
            amount_out
        );

        let new_in = reserve_in.checked_add(p.amount_in).ok_or(PoolError::Overflow)?;
        let new_out = reserve_out.checked_sub(amount_out).ok_or(PoolError::Overflow)?;
        let (new_low, new_high) = reorder(in_is_low, new_in, new_out);
        self.update_reserves(new_low, new_high, events)?;

        host.transfer_out(&token_out, &self.custody, &p.recipient, amount_out)?;

        events.push(PoolEvent::Swap {
            sender,
            recipient: p.recipient,
            token_in,
            token_out,
            amount_in: p.amount_in,
            amount_out,
        });
        Ok(amount_out)
    }

    // ─────────────────────────────────────────────────────────
    // INTERNAL BOOKKEEPING
    // ─────────────────────────────────────────────────────────

    /// The single gate for reserve writes. An initialized pool must stay
    /// initialized, and the two reserves are never mixed zero/non-zero.
    fn update_reserves(
        &mut self,
        new_low: u128,
        new_high: u128,
        events: &mut Vec<PoolEvent>,
    ) -> Result<(), PoolError> {
        let was_initialized = self.reserve_low != 0 || self.reserve_high != 0;
        let mixed = (new_low == 0) != (new_high == 0);
        if mixed || (was_initialized && new_low == 0) {
            return Err(PoolError::ZeroReservesAfterUpdate);
        }
        self.reserve_low = new_low;
        self.reserve_high = new_high;
        events.push(PoolEvent::Sync {
            reserve_low: new_low,
            reserve_high: new_high,
        });
        Ok(())
    }

    fn credit(&mut self, holder: &Address, shares: u128) -> Result<(), PoolError> {
        let bal = self.share_balances.entry(*holder).or_insert(0);
        *bal = bal.checked_add(shares).ok_or(PoolError::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, holder: &Address, shares: u128) -> Result<(), PoolError> {
        let bal = self.share_balance(holder);
        let remaining = bal.checked_sub(shares).ok_or(PoolError::InsufficientBalance)?;
        if remaining == 0 {
            self.share_balances.remove(holder);
        } else {
            self.share_balances.insert(*holder, remaining);
        }
        Ok(())
    }

    /// Check the ledger's structural invariants. Used after loading a
    /// snapshot, where the state did not come from the operations above.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.token_low >= self.token_high {
            return Err("token_low must sort strictly before token_high".to_string());
        }
        if self.token_low.is_zero() {
            return Err("pool token must not be the null id".to_string());
        }
        if self.custody != Address::pool_custody(&self.token_low, &self.token_high) {
            return Err("custody address does not match the token pair".to_string());
        }
        if (self.reserve_low == 0) != (self.reserve_high == 0) {
            return Err(format!(
                "reserves must be both zero or both positive, got {} / {}",
                self.reserve_low, self.reserve_high
            ));
        }
        let sum = self
            .share_balances
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
            .ok_or("share balances overflow")?;
        if sum != self.total_shares {
            return Err(format!(
                "share balances sum to {}, total_shares is {}",
                sum, self.total_shares
            ));
        }
        if self.total_shares == 0 {
            if self.reserve_low != 0 {
                return Err("reserves without shares".to_string());
            }
        } else {
            if self.reserve_low == 0 {
                return Err("shares without reserves".to_string());
            }
            if self.share_balance(&Address::ZERO) != MINIMUM_LIQUIDITY {
                return Err("null holder must own exactly the locked minimum".to_string());
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// TESTS
// ─────────────────────────────────────────────────────────────
