// SPDX-License-Identifier: AGPL-3.0-only
//! # Token Bank
//!
//! In-memory multi-token ledger backing the pool's transfer collaborator.
//!
//! ## Layout
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  TokenBank                                           │
//! │  token id → ┌──────────┐  ┌───────────────────────┐  │
//! │             │ symbol   │  │ balances  addr → u128 │  │
//! │             │ supply   │  │ allowances            │  │
//! │             └──────────┘  │  (owner, spender)→u128│  │
//! │                           └───────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation is all-or-nothing: a failed call leaves the bank untouched.
//! An allowance of `u128::MAX` is unlimited and never decremented.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xyk_core::types::{u128_map_str, u128_str};
use xyk_core::{Address, TokenId, TransferError};

/// Allowance value that is never decremented by `transfer_from`.
pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;

/// Balances and allowances of one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Ticker symbol (e.g. "USDC"), 1-8 characters
    pub symbol: String,
    #[serde(with = "u128_str")]
    pub total_supply: u128,
    #[serde(with = "u128_map_str")]
    pub balances: BTreeMap<Address, u128>,
    /// owner → spender → allowance
    #[serde(with = "allowance_map")]
    pub allowances: BTreeMap<Address, BTreeMap<Address, u128>>,
}

impl TokenLedger {
    fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    fn balance(&self, who: &Address) -> u128 {
        self.balances.get(who).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Debit `from` and credit `to` after checking both sides.
    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), TransferError> {
        let have = self.balance(from);
        if have < amount {
            return Err(TransferError::InsufficientBalance {
                account: *from,
                have,
                need: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow { account: *to })?;
        self.balances.insert(*from, have - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

/// All tokens known to the runtime. BTreeMap for deterministic snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBank {
    tokens: BTreeMap<TokenId, TokenLedger>,
}

impl TokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token. Returns `false` if the id is already known.
    pub fn register_token(&mut self, token: TokenId, symbol: &str) -> bool {
        if self.tokens.contains_key(&token) {
            return false;
        }
        self.tokens.insert(token, TokenLedger::new(symbol));
        true
    }

    pub fn is_registered(&self, token: &TokenId) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn symbol(&self, token: &TokenId) -> Option<&str> {
        self.tokens.get(token).map(|t| t.symbol.as_str())
    }

    pub fn tokens(&self) -> impl Iterator<Item = (&TokenId, &TokenLedger)> {
        self.tokens.iter()
    }

    pub fn total_supply(&self, token: &TokenId) -> u128 {
        self.tokens.get(token).map(|t| t.total_supply).unwrap_or(0)
    }

    pub fn balance_of(&self, token: &TokenId, who: &Address) -> u128 {
        self.tokens.get(token).map(|t| t.balance(who)).unwrap_or(0)
    }

    pub fn allowance(&self, token: &TokenId, owner: &Address, spender: &Address) -> u128 {
        self.tokens
            .get(token)
            .map(|t| t.allowance(owner, spender))
            .unwrap_or(0)
    }

    fn ledger_mut(&mut self, token: &TokenId) -> Result<&mut TokenLedger, TransferError> {
        self.tokens
            .get_mut(token)
            .ok_or(TransferError::UnknownToken { token: *token })
    }

    /// Create `amount` new units for `to`.
    pub fn mint(&mut self, token: &TokenId, to: &Address, amount: u128) -> Result<(), TransferError> {
        let ledger = self.ledger_mut(token)?;
        let supply = ledger
            .total_supply
            .checked_add(amount)
            .ok_or(TransferError::Overflow { account: *to })?;
        let balance = ledger
            .balance(to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow { account: *to })?;
        ledger.total_supply = supply;
        ledger.balances.insert(*to, balance);
        log::debug!("mint {} {} to {:?}", amount, ledger.symbol, to);
        Ok(())
    }

    /// Set the allowance of `spender` over `owner`'s balance. Zero removes it.
    pub fn approve(
        &mut self,
        token: &TokenId,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), TransferError> {
        let ledger = self.ledger_mut(token)?;
        if amount == 0 {
            if let Some(m) = ledger.allowances.get_mut(owner) {
                m.remove(spender);
                if m.is_empty() {
                    ledger.allowances.remove(owner);
                }
            }
        } else {
            ledger
                .allowances
                .entry(*owner)
                .or_default()
                .insert(*spender, amount);
        }
        Ok(())
    }

    /// Move `amount` from `from` to `to` on `from`'s own authority.
    pub fn transfer(
        &mut self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.ledger_mut(token)?.move_balance(from, to, amount)
    }

    /// Move `amount` from `from` to `to` on `spender`'s allowance.
    pub fn transfer_from(
        &mut self,
        token: &TokenId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TransferError> {
        let ledger = self.ledger_mut(token)?;
        let allowed = ledger.allowance(from, spender);
        if allowed < amount {
            return Err(TransferError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                have: allowed,
                need: amount,
            });
        }
        ledger.move_balance(from, to, amount)?;
        if allowed != UNLIMITED_ALLOWANCE && amount > 0 {
            let remaining = allowed - amount;
            let spenders = ledger.allowances.entry(*from).or_default();
            if remaining == 0 {
                spenders.remove(spender);
            } else {
                spenders.insert(*spender, remaining);
            }
            if spenders.is_empty() {
                ledger.allowances.remove(from);
            }
        }
        Ok(())
    }

    /// Sum of balances equals total supply for every token.
    pub fn check_supply(&self) -> Result<(), String> {
        for (id, ledger) in &self.tokens {
            let sum = ledger
                .balances
                .values()
                .try_fold(0u128, |acc, v| acc.checked_add(*v))
                .ok_or_else(|| format!("{}: balances overflow", ledger.symbol))?;
            if sum != ledger.total_supply {
                return Err(format!(
                    "{} ({}): balances sum to {}, supply is {}",
                    ledger.symbol,
                    id.short(),
                    sum,
                    ledger.total_supply
                ));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// owner → spender → u128 as nested string maps
// ─────────────────────────────────────────────────────────────

mod allowance_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;
    use xyk_core::Address;

    type Allowances = BTreeMap<Address, BTreeMap<Address, u128>>;

    pub fn serialize<S: Serializer>(map: &Allowances, serializer: S) -> Result<S::Ok, S::Error> {
        let as_str: BTreeMap<&Address, BTreeMap<&Address, String>> = map
            .iter()
            .map(|(owner, spenders)| {
                (
                    owner,
                    spenders.iter().map(|(s, v)| (s, v.to_string())).collect(),
                )
            })
            .collect();
        as_str.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Allowances, D::Error> {
        let raw = BTreeMap::<Address, BTreeMap<Address, String>>::deserialize(deserializer)?;
        let mut out = Allowances::new();
        for (owner, spenders) in raw {
            let mut parsed = BTreeMap::new();
            for (spender, v) in spenders {
                let n = v.parse::<u128>().map_err(serde::de::Error::custom)?;
                parsed.insert(spender, n);
            }
            out.insert(owner, parsed);
        }
        Ok(out)
    }
}

// ─────────────────────────────────────────────────────────────
// TESTS
// ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> TokenId {
        TokenId::derive("USD")
    }

    fn alice() -> Address {
        Address::derive("alice")
    }

    fn bob() -> Address {
        Address::derive("bob")
    }

    fn bank() -> TokenBank {
        let mut b = TokenBank::new();
        assert!(b.register_token(usd(), "USD"));
        b.mint(&usd(), &alice(), 1_000).unwrap();
        b
    }

    #[test]
    fn test_register_is_idempotent_guarded() {
        let mut b = bank();
        assert!(!b.register_token(usd(), "OTHER"));
        assert_eq!(b.symbol(&usd()), Some("USD"));
    }

    #[test]
    fn test_mint_and_supply() {
        let b = bank();
        assert_eq!(b.balance_of(&usd(), &alice()), 1_000);
        assert_eq!(b.total_supply(&usd()), 1_000);
        b.check_supply().unwrap();
    }

    #[test]
    fn test_mint_overflow() {
        let mut b = bank();
        let err = b.mint(&usd(), &bob(), u128::MAX).unwrap_err();
        assert_eq!(err, TransferError::Overflow { account: bob() });
        assert_eq!(b.total_supply(&usd()), 1_000);
    }

    #[test]
    fn test_transfer() {
        let mut b = bank();
        b.transfer(&usd(), &alice(), &bob(), 400).unwrap();
        assert_eq!(b.balance_of(&usd(), &alice()), 600);
        assert_eq!(b.balance_of(&usd(), &bob()), 400);
        b.check_supply().unwrap();
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut b = bank();
        let before = b.clone();
        let err = b.transfer(&usd(), &alice(), &bob(), 1_001).unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientBalance {
                account: alice(),
                have: 1_000,
                need: 1_001
            }
        );
        assert_eq!(b, before);
    }

    #[test]
    fn test_transfer_to_self_is_noop() {
        let mut b = bank();
        b.transfer(&usd(), &alice(), &alice(), 1_000).unwrap();
        assert_eq!(b.balance_of(&usd(), &alice()), 1_000);
    }

    #[test]
    fn test_unknown_token() {
        let mut b = bank();
        let eur = TokenId::derive("EUR");
        assert_eq!(
            b.transfer(&eur, &alice(), &bob(), 1),
            Err(TransferError::UnknownToken { token: eur })
        );
        assert_eq!(b.balance_of(&eur, &alice()), 0);
    }

    #[test]
    fn test_transfer_from_decrements_allowance() {
        let mut b = bank();
        b.approve(&usd(), &alice(), &bob(), 300).unwrap();
        b.transfer_from(&usd(), &bob(), &alice(), &bob(), 200).unwrap();
        assert_eq!(b.allowance(&usd(), &alice(), &bob()), 100);
        assert_eq!(b.balance_of(&usd(), &bob()), 200);

        let err = b.transfer_from(&usd(), &bob(), &alice(), &bob(), 101).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientAllowance { have: 100, need: 101, .. }));

        b.transfer_from(&usd(), &bob(), &alice(), &bob(), 100).unwrap();
        assert_eq!(b.allowance(&usd(), &alice(), &bob()), 0);
    }

    #[test]
    fn test_unlimited_allowance_is_not_decremented() {
        let mut b = bank();
        b.approve(&usd(), &alice(), &bob(), UNLIMITED_ALLOWANCE).unwrap();
        b.transfer_from(&usd(), &bob(), &alice(), &bob(), 500).unwrap();
        assert_eq!(b.allowance(&usd(), &alice(), &bob()), UNLIMITED_ALLOWANCE);
    }

    #[test]
    fn test_transfer_from_keeps_allowance_on_balance_failure() {
        let mut b = bank();
        b.approve(&usd(), &alice(), &bob(), 5_000).unwrap();
        let before = b.clone();
        assert!(b.transfer_from(&usd(), &bob(), &alice(), &bob(), 2_000).is_err());
        assert_eq!(b, before);
    }

    #[test]
    fn test_approve_zero_clears() {
        let mut b = bank();
        b.approve(&usd(), &alice(), &bob(), 10).unwrap();
        b.approve(&usd(), &alice(), &bob(), 0).unwrap();
        assert_eq!(b, bank());
    }

    #[test]
    fn test_json_snapshot() {
        let mut b = bank();
        b.approve(&usd(), &alice(), &bob(), u128::MAX).unwrap();
        let json = serde_json::to_string(&b).unwrap();
        assert!(json.contains(&u128::MAX.to_string()));
        let back: TokenBank = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }
}
