// SPDX-License-Identifier: AGPL-3.0-only
pub mod genesis;
pub mod inspect;
pub mod quote;
pub mod simulate;

use colored::*;
use serde_json::Value;
use std::collections::BTreeMap;
use xyk_core::{Address, TokenId, PRICE_SCALE};
use xyk_runtime::{GenesisConfig, LpPosition, PoolInfo};

/// Human names for the addresses and tokens a genesis config defines.
#[derive(Debug, Default)]
pub struct Labels {
    accounts: BTreeMap<Address, String>,
    tokens: BTreeMap<TokenId, String>,
}

impl Labels {
    pub fn from_genesis(config: &GenesisConfig) -> Self {
        let mut labels = Self::default();
        for account in &config.accounts {
            labels
                .accounts
                .insert(GenesisConfig::address(&account.name), account.name.clone());
        }
        for token in &config.tokens {
            labels
                .tokens
                .insert(GenesisConfig::token_id(&token.symbol), token.symbol.clone());
        }
        labels
    }

    pub fn account(&self, address: &Address) -> String {
        match self.accounts.get(address) {
            Some(name) => name.clone(),
            None if address.is_zero() => "<null>".to_string(),
            None => format!("0x{}…", address.short()),
        }
    }

    pub fn token(&self, token: &TokenId) -> String {
        self.tokens
            .get(token)
            .cloned()
            .unwrap_or_else(|| format!("0x{}…", token.short()))
    }

    /// Resolve an account name or a hex address.
    pub fn parse_account(&self, text: &str) -> Address {
        if let Some((address, _)) = self.accounts.iter().find(|(_, name)| name.as_str() == text) {
            return *address;
        }
        text.parse().unwrap_or_else(|_| GenesisConfig::address(text))
    }
}

/// Replace `"@name"` strings with the derived address and `"$SYMBOL"`
/// strings with the derived token id, anywhere in `value`.
pub fn resolve_labels(value: &mut Value) {
    match value {
        Value::String(s) => {
            if let Some(name) = s.strip_prefix('@') {
                *s = GenesisConfig::address(name).to_hex();
            } else if let Some(symbol) = s.strip_prefix('$') {
                *s = GenesisConfig::token_id(symbol).to_hex();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(resolve_labels),
        Value::Object(map) => map.values_mut().for_each(resolve_labels),
        _ => {}
    }
}

/// Render a 1e18-scaled value with six decimals.
pub fn format_scaled(value: u128) -> String {
    let whole = value / PRICE_SCALE;
    let frac = (value % PRICE_SCALE) / (PRICE_SCALE / 1_000_000);
    format!("{}.{:06}", whole, frac)
}

pub fn print_pool_info(info: &PoolInfo) {
    println!("{}", "Pool".cyan().bold());
    println!("{}", "─".repeat(70));
    println!("  Pair:            {}/{}", info.symbol_low, info.symbol_high);
    println!("  Token (low):     {}", info.token_low);
    println!("  Token (high):    {}", info.token_high);
    println!("  Custody:         {}", info.custody);
    println!(
        "  Reserves:        {} {} / {} {}",
        info.reserve_low.to_string().green(),
        info.symbol_low,
        info.reserve_high.to_string().green(),
        info.symbol_high
    );
    println!("  Total Shares:    {}", info.total_shares);
    println!("  Holders:         {}", info.holders);
    println!("  Fee:             {} bps", info.fee_bps);
    if info.price_low_in_high == 0 {
        println!("  Price:           {}", "empty pool".yellow());
    } else {
        println!(
            "  Price:           1 {} = {} {}",
            info.symbol_low,
            format_scaled(info.price_low_in_high),
            info.symbol_high
        );
    }
    println!("{}", "─".repeat(70));
}

pub fn print_position(label: &str, info: &PoolInfo, position: &LpPosition) {
    println!(
        "  {:<12} {:>24} shares  ({:>3}.{:02}%)  ≈ {} {} + {} {}",
        label.bold(),
        position.shares,
        position.share_bps / 100,
        position.share_bps % 100,
        position.amount_low,
        info.symbol_low,
        position.amount_high,
        info.symbol_high
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_labels_nested() {
        let mut v = json!({
            "caller": "@alice",
            "action": { "path": ["$XYK", "$USD"], "amount_in": "100", "note": "plain" }
        });
        resolve_labels(&mut v);
        assert_eq!(v["caller"], Value::String(Address::derive("alice").to_hex()));
        assert_eq!(v["action"]["path"][0], Value::String(TokenId::derive("XYK").to_hex()));
        assert_eq!(v["action"]["path"][1], Value::String(TokenId::derive("USD").to_hex()));
        assert_eq!(v["action"]["amount_in"], "100");
        assert_eq!(v["action"]["note"], "plain");
    }

    #[test]
    fn test_format_scaled() {
        assert_eq!(format_scaled(0), "0.000000");
        assert_eq!(format_scaled(PRICE_SCALE), "1.000000");
        assert_eq!(format_scaled(PRICE_SCALE / 2 + 4 * PRICE_SCALE), "4.500000");
        assert_eq!(format_scaled(1), "0.000000");
    }

    #[test]
    fn test_labels() {
        let labels = Labels::from_genesis(&GenesisConfig::sample());
        let alice = GenesisConfig::address("alice");
        assert_eq!(labels.account(&alice), "alice");
        assert_eq!(labels.account(&Address::ZERO), "<null>");
        assert_eq!(labels.token(&GenesisConfig::token_id("USD")), "USD");
        assert_eq!(labels.parse_account("alice"), alice);
        assert_eq!(labels.parse_account(&alice.to_hex()), alice);
        assert_eq!(labels.parse_account("zed"), GenesisConfig::address("zed"));

        let unknown = Address::derive("mallory");
        assert_eq!(labels.account(&unknown), format!("0x{}…", unknown.short()));
    }
}
