// SPDX-License-Identifier: AGPL-3.0-only
use serde_json::{json, Value};
use std::path::Path;
use xyk_runtime::GenesisConfig;

pub fn handle(output: &Path, script: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    for path in std::iter::once(output).chain(script) {
        if path.exists() && !force {
            return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
        }
    }

    let config = GenesisConfig::sample();
    config.save_to_file(output)?;
    crate::print_success(&format!("Genesis config written to {}", output.display()));

    if let Some(path) = script {
        let calls = sample_script(config.start_time);
        std::fs::write(path, serde_json::to_string_pretty(&calls)?)?;
        crate::print_success(&format!("Call script written to {}", path.display()));
        crate::print_info(&format!(
            "Run: xyk simulate --genesis {} --script {}",
            output.display(),
            path.display()
        ));
    }
    Ok(())
}

/// A short session against [`GenesisConfig::sample`]: seed, two swaps (the
/// second with an unreachable minimum), queries and a partial withdrawal.
pub fn sample_script(start: u64) -> Value {
    let deadline = start + 3_600;
    json!([
        {
            "caller": "@alice",
            "timestamp": start + 10,
            "action": {
                "action": "AddLiquidity",
                "token_a": "$XYK",
                "token_b": "$USD",
                "amount_a_desired": "1000000",
                "amount_b_desired": "4000000",
                "amount_a_min": "0",
                "amount_b_min": "0",
                "recipient": "@alice",
                "deadline": deadline
            }
        },
        {
            "caller": "@bob",
            "timestamp": start + 20,
            "action": {
                "action": "SwapExactTokensForTokens",
                "amount_in": "10000",
                "amount_out_min": "1",
                "path": ["$XYK", "$USD"],
                "recipient": "@bob",
                "deadline": deadline
            }
        },
        {
            "caller": "@bob",
            "timestamp": start + 30,
            "action": {
                "action": "SwapExactTokensForTokens",
                "amount_in": "50000",
                "amount_out_min": "999999999",
                "path": ["$USD", "$XYK"],
                "recipient": "@bob",
                "deadline": deadline
            }
        },
        {
            "caller": "@alice",
            "timestamp": start + 40,
            "action": { "action": "GetPrice", "token_a": "$XYK", "token_b": "$USD" }
        },
        {
            "caller": "@alice",
            "timestamp": start + 40,
            "action": { "action": "ShareBalance", "holder": "@alice" }
        },
        {
            "caller": "@alice",
            "timestamp": start + 50,
            "action": {
                "action": "RemoveLiquidity",
                "token_a": "$USD",
                "token_b": "$XYK",
                "shares": "500000",
                "amount_a_min": "0",
                "amount_b_min": "0",
                "recipient": "@alice",
                "deadline": deadline
            }
        },
        {
            "caller": "@bob",
            "timestamp": start + 60,
            "action": { "action": "PoolInfo" }
        }
    ])
}
