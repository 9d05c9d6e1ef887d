// SPDX-License-Identifier: AGPL-3.0-only
use super::{format_scaled, print_pool_info, print_position, resolve_labels, Labels};
use colored::*;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::path::Path;
use xyk_core::Address;
use xyk_runtime::{CallOutput, CallReceipt, GenesisConfig, PoolCall, Runtime};

/// Outcome of one scripted call.
#[derive(Debug, Serialize)]
pub struct CallRecord {
    pub index: usize,
    pub action: &'static str,
    pub caller: Address,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<CallReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

pub fn handle(
    genesis: &Path,
    script: &Path,
    json: bool,
    stop_on_error: bool,
    state_out: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let config = GenesisConfig::load_from_file(genesis)?;
    let mut rt = config.build_runtime()?;
    let calls = parse_script(&std::fs::read_to_string(script)?)?;
    let labels = Labels::from_genesis(&config);

    log::info!("simulating {} calls from {}", calls.len(), script.display());
    let records = execute(&mut rt, calls, stop_on_error);
    let rejected: Vec<usize> = records.iter().filter(|r| !r.ok).map(|r| r.index).collect();

    if json {
        for record in &records {
            println!("{}", serde_json::to_string(record)?);
        }
        println!("{}", serde_json::to_string(&rt.pool_info())?);
    } else {
        println!("{}", "Simulation".cyan().bold());
        println!("{}", "─".repeat(70));
        for record in &records {
            print_record(record, &labels);
        }
        println!();

        let info = rt.pool_info();
        print_pool_info(&info);
        for (holder, _) in rt.pool().holders() {
            print_position(&labels.account(holder), &info, &rt.lp_position(holder));
        }
        println!();
        crate::print_info(&format!(
            "{} calls executed, {} rejected, clock at {}",
            records.len(),
            rejected.len(),
            rt.now()
        ));
    }

    if let Some(path) = state_out {
        std::fs::write(path, rt.serialize_state()?)?;
        if !json {
            crate::print_success(&format!("State written to {}", path.display()));
        }
    }

    match rejected.first() {
        Some(index) if stop_on_error => Err(format!("call #{} rejected, script aborted", index).into()),
        _ => Ok(()),
    }
}

/// Decode a call script: a JSON array of calls, with `@name` / `$SYMBOL`
/// labels resolved first.
pub fn parse_script(text: &str) -> Result<Vec<PoolCall>, Box<dyn Error>> {
    let mut value: Value = serde_json::from_str(text)?;
    resolve_labels(&mut value);
    let Value::Array(items) = value else {
        return Err("call script must be a JSON array".into());
    };

    let mut calls = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let call: PoolCall =
            serde_json::from_value(item).map_err(|e| format!("call #{}: {}", index, e))?;
        calls.push(call);
    }
    Ok(calls)
}

/// Run `calls` in order. Rejected calls leave the runtime untouched and the
/// run continues unless `stop_on_error` is set.
pub fn execute(rt: &mut Runtime, calls: Vec<PoolCall>, stop_on_error: bool) -> Vec<CallRecord> {
    let mut records = Vec::with_capacity(calls.len());
    for (index, call) in calls.into_iter().enumerate() {
        let action = call.action.name();
        let caller = call.caller;
        let record = match rt.call(call) {
            Ok(receipt) => CallRecord {
                index,
                action,
                caller,
                ok: true,
                receipt: Some(receipt),
                error: None,
                kind: None,
            },
            Err(e) => CallRecord {
                index,
                action,
                caller,
                ok: false,
                receipt: None,
                error: Some(e.to_string()),
                kind: Some(e.kind()),
            },
        };
        let failed = !record.ok;
        records.push(record);
        if failed && stop_on_error {
            break;
        }
    }
    records
}

fn print_record(record: &CallRecord, labels: &Labels) {
    let head = format!("#{:<3} {:<26} {}", record.index, record.action, labels.account(&record.caller));
    match (&record.receipt, &record.error) {
        (Some(receipt), _) => {
            println!("{} {}  {}", "✓".green().bold(), head, describe(&receipt.output, labels));
            for event in &receipt.events {
                println!("       {} {}", "↳".dimmed(), event.name().dimmed());
            }
        }
        (None, Some(error)) => {
            println!(
                "{} {}  {} ({})",
                "✗".red().bold(),
                head,
                error.red(),
                record.kind.unwrap_or_default()
            );
        }
        (None, None) => {}
    }
}

fn describe(output: &CallOutput, labels: &Labels) -> String {
    match output {
        CallOutput::Approved { token, amount } => {
            format!("allowance {} {}", amount, labels.token(token))
        }
        CallOutput::LiquidityAdded(o) => format!(
            "deposited {} + {}, minted {} shares",
            o.amount_a, o.amount_b, o.shares
        ),
        CallOutput::LiquidityRemoved(o) => format!("withdrew {} + {}", o.amount_a, o.amount_b),
        CallOutput::Swapped { amount_out } => format!("received {}", amount_out),
        CallOutput::Price { price } => format!("price {}", format_scaled(*price)),
        CallOutput::AmountOut { amount_out } => format!("amount out {}", amount_out),
        CallOutput::Shares { holder, shares } => {
            format!("{} holds {} shares", labels.account(holder), shares)
        }
        CallOutput::Info(info) => format!(
            "reserves {} {} / {} {}",
            info.reserve_low, info.symbol_low, info.reserve_high, info.symbol_high
        ),
    }
}
