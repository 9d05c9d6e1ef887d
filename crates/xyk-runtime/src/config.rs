// SPDX-License-Identifier: AGPL-3.0-only
//! Genesis configuration: the tokens, the pool pair and the funded accounts
//! a [`Runtime`](crate::Runtime) starts from.
//!
//! ```toml
//! start_time = 1700000000
//!
//! [pool]
//! token_a = "XYK"
//! token_b = "USD"
//!
//! [[tokens]]
//! symbol = "XYK"
//!
//! [[tokens]]
//! symbol = "USD"
//!
//! [[accounts]]
//! name = "alice"
//! approve_pool = true
//!
//! [accounts.balances]
//! XYK = "1000000000"
//! USD = 2000000000
//! ```
//!
//! Token ids and addresses are derived from symbols and names with
//! `TokenId::derive` / `Address::derive`.

use crate::bank::{TokenBank, UNLIMITED_ALLOWANCE};
use crate::{Runtime, RuntimeError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use xyk_core::{Address, Pool, TokenId};

/// Serde adapter for u128 map values ↔ TOML: serialize as strings,
/// deserialize from strings or integers. TOML has no 128-bit integers.
mod u128_toml_map {
    use super::*;
    use serde::de::{self, Visitor};

    struct Amount(u128);

    impl<'de> Deserialize<'de> for Amount {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            struct U128Visitor;

            impl<'de> Visitor<'de> for U128Visitor {
                type Value = u128;

                fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    f.write_str("a u128 as a string or integer")
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                    v.parse().map_err(E::custom)
                }

                fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                    Ok(v as u128)
                }

                fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                    if v >= 0 {
                        Ok(v as u128)
                    } else {
                        Err(E::custom("negative value for u128"))
                    }
                }
            }

            d.deserialize_any(U128Visitor).map(Amount)
        }
    }

    pub fn serialize<S: Serializer>(map: &BTreeMap<String, u128>, s: S) -> Result<S::Ok, S::Error> {
        let as_str: BTreeMap<&String, String> = map.iter().map(|(k, v)| (k, v.to_string())).collect();
        as_str.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, u128>, D::Error> {
        let raw = BTreeMap::<String, Amount>::deserialize(d)?;
        Ok(raw.into_iter().map(|(k, v)| (k, v.0)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Clock value (seconds) before the first call
    pub start_time: u64,
    pub pool: PoolConfig,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Symbol of one pool token
    pub token_a: String,
    /// Symbol of the other pool token
    pub token_b: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    /// Grant the pool custody an unlimited allowance on both pool tokens
    #[serde(default)]
    pub approve_pool: bool,
    /// symbol → initial balance
    #[serde(default, with = "u128_toml_map")]
    pub balances: BTreeMap<String, u128>,
}

impl GenesisConfig {
    /// Load genesis config from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: GenesisConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Save genesis config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Two tokens, two funded and approved accounts.
    pub fn sample() -> Self {
        let account = |name: &str, xyk: u128, usd: u128| AccountConfig {
            name: name.to_string(),
            approve_pool: true,
            balances: BTreeMap::from([("XYK".to_string(), xyk), ("USD".to_string(), usd)]),
        };
        Self {
            start_time: 1_700_000_000,
            pool: PoolConfig {
                token_a: "XYK".to_string(),
                token_b: "USD".to_string(),
            },
            tokens: vec![
                TokenConfig {
                    symbol: "XYK".to_string(),
                },
                TokenConfig {
                    symbol: "USD".to_string(),
                },
            ],
            accounts: vec![
                account("alice", 1_000_000_000, 2_000_000_000),
                account("bob", 50_000_000, 50_000_000),
            ],
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let mut symbols = BTreeSet::new();
        for token in &self.tokens {
            if token.symbol.is_empty() || token.symbol.len() > 8 {
                return Err(format!("Symbol '{}' must be 1-8 characters", token.symbol));
            }
            if !symbols.insert(token.symbol.as_str()) {
                return Err(format!("Duplicate token symbol '{}'", token.symbol));
            }
        }

        for symbol in [&self.pool.token_a, &self.pool.token_b] {
            if !symbols.contains(symbol.as_str()) {
                return Err(format!("Pool token '{}' is not listed in [[tokens]]", symbol));
            }
        }
        if self.pool.token_a == self.pool.token_b {
            return Err("Pool tokens must be distinct".to_string());
        }

        let mut names = BTreeSet::new();
        for account in &self.accounts {
            if account.name.is_empty() {
                return Err("Account name cannot be empty".to_string());
            }
            if !names.insert(account.name.as_str()) {
                return Err(format!("Duplicate account '{}'", account.name));
            }
            for symbol in account.balances.keys() {
                if !symbols.contains(symbol.as_str()) {
                    return Err(format!(
                        "Account '{}' holds unknown token '{}'",
                        account.name, symbol
                    ));
                }
            }
        }

        Ok(())
    }

    /// Id of the token with this symbol.
    pub fn token_id(symbol: &str) -> TokenId {
        TokenId::derive(symbol)
    }

    /// Address of the account with this name.
    pub fn address(name: &str) -> Address {
        Address::derive(name)
    }

    /// Validate and build a runtime at `start_time`.
    pub fn build_runtime(&self) -> Result<Runtime, RuntimeError> {
        self.validate().map_err(RuntimeError::Config)?;

        let token_a = Self::token_id(&self.pool.token_a);
        let token_b = Self::token_id(&self.pool.token_b);
        let pool = Pool::new(token_a, token_b)?;

        let mut bank = TokenBank::new();
        for token in &self.tokens {
            bank.register_token(Self::token_id(&token.symbol), &token.symbol);
        }
        for account in &self.accounts {
            let who = Self::address(&account.name);
            for (symbol, amount) in &account.balances {
                bank.mint(&Self::token_id(symbol), &who, *amount)?;
            }
            if account.approve_pool {
                for token in [token_a, token_b] {
                    bank.approve(&token, &who, &pool.custody(), UNLIMITED_ALLOWANCE)?;
                }
            }
        }

        log::info!(
            "genesis: {} tokens, {} accounts, pool {}/{}",
            self.tokens.len(),
            self.accounts.len(),
            self.pool.token_a,
            self.pool.token_b
        );
        Ok(Runtime::new(pool, bank, self.start_time))
    }
}
