// ========================================
// INTEGRATION TESTS FOR THE XYK POOL LEDGER
// ========================================
//
// Test Scenarios:
// 1. JSON Call ABI (hex ids, string amounts, tagged actions)
// 2. Atomic Rejection (bank, pool and event log untouched)
// 3. Concurrent Callers on a SharedRuntime
// 4. Snapshot Persistence & Recovery
// 5. Tampered Snapshot Rejection
// 6. Token Conservation across a Session
//
// Usage:
//   cargo test --test integration_test -- --nocapture
//
// ========================================

use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;
use xyk_core::{Address, PoolEvent, SwapParams, TokenId, MINIMUM_LIQUIDITY};
use xyk_runtime::{CallOutput, GenesisConfig, PoolAction, PoolCall, Runtime, RuntimeError};

const START: u64 = 1_700_000_000;

fn xyk() -> TokenId {
    GenesisConfig::token_id("XYK")
}

fn usd() -> TokenId {
    GenesisConfig::token_id("USD")
}

fn addr(name: &str) -> Address {
    GenesisConfig::address(name)
}

fn add_liquidity_json(caller: &str, ts: u64, xyk_amount: u128, usd_amount: u128) -> String {
    json!({
        "caller": addr(caller).to_hex(),
        "timestamp": ts,
        "action": {
            "action": "AddLiquidity",
            "token_a": xyk().to_hex(),
            "token_b": usd().to_hex(),
            "amount_a_desired": xyk_amount.to_string(),
            "amount_b_desired": usd_amount.to_string(),
            "amount_a_min": "0",
            "amount_b_min": "0",
            "recipient": addr(caller).to_hex(),
            "deadline": ts + 60
        }
    })
    .to_string()
}

fn swap_call(caller: &str, ts: u64, token_in: TokenId, token_out: TokenId, amount_in: u128, min_out: u128) -> PoolCall {
    PoolCall {
        caller: addr(caller),
        timestamp: ts,
        action: PoolAction::SwapExactTokensForTokens(SwapParams::exact_in(
            token_in,
            token_out,
            amount_in,
            min_out,
            addr(caller),
            ts + 60,
        )),
    }
}

/// Sample genesis, seeded by alice with 1,000,000 XYK / 4,000,000 USD.
fn seeded_runtime() -> Runtime {
    let mut rt = GenesisConfig::sample().build_runtime().unwrap();
    rt.call_json(&add_liquidity_json("alice", START + 1, 1_000_000, 4_000_000))
        .unwrap();
    rt
}

// ========================================
// TEST 1: JSON CALL ABI
// ========================================
#[test]
fn test_json_call_abi() {
    println!("\n🧪 TEST 1: JSON Call ABI");

    let mut rt = GenesisConfig::sample().build_runtime().unwrap();
    let receipt = rt
        .call_json(&add_liquidity_json("alice", START + 1, 1_000_000, 4_000_000))
        .unwrap();

    // sqrt(1e6 · 4e6) - MINIMUM_LIQUIDITY
    match &receipt.output {
        CallOutput::LiquidityAdded(o) => {
            assert_eq!(o.amount_a, 1_000_000);
            assert_eq!(o.amount_b, 4_000_000);
            assert_eq!(o.shares, 2_000_000 - MINIMUM_LIQUIDITY);
        }
        other => panic!("Expected LiquidityAdded, got {:?}", other),
    }
    let names: Vec<_> = receipt.events.iter().map(PoolEvent::name).collect();
    assert_eq!(names, vec!["Sync", "LiquidityAdded"]);

    let swap = json!({
        "caller": addr("bob").to_hex(),
        "timestamp": START + 2,
        "action": {
            "action": "SwapExactTokensForTokens",
            "amount_in": "1000",
            "amount_out_min": "1",
            "path": [xyk().to_hex(), usd().to_hex()],
            "recipient": addr("bob").to_hex(),
            "deadline": START + 60
        }
    });
    let receipt = rt.call_json(&swap.to_string()).unwrap();
    // 1000·997·4e6 / (1e6·1000 + 1000·997) = 3984.03…
    assert_eq!(receipt.output, CallOutput::Swapped { amount_out: 3_984 });

    // Receipts serialize amounts as strings and tag outputs and events
    let encoded: Value = serde_json::to_value(&receipt).unwrap();
    assert_eq!(encoded["output"]["output"], "Swapped");
    assert_eq!(encoded["output"]["amount_out"], "3984");
    assert_eq!(encoded["events"][0]["event"], "Sync");
    assert_eq!(encoded["events"][1]["event"], "Swap");
    assert_eq!(encoded["events"][1]["amount_in"], "1000");

    // Plain integers are not accepted for amounts
    let bad = swap.to_string().replace("\"1000\"", "1000");
    assert!(rt.call_json(&bad).is_err());

    println!("✅ JSON ABI round-trip OK");
}

// ========================================
// TEST 2: ATOMIC REJECTION
// ========================================
#[test]
fn test_rejected_calls_change_nothing() {
    println!("\n🧪 TEST 2: Atomic Rejection");

    let mut rt = seeded_runtime();
    let before_pool = rt.pool().clone();
    let before_bank = rt.bank().clone();
    let before_events = rt.events().len();

    let rejected = [
        // Slippage
        swap_call("bob", START + 2, xyk(), usd(), 1_000, 1_000_000),
        // Expired
        PoolCall {
            timestamp: START + 100,
            ..swap_call("bob", START + 2, xyk(), usd(), 1_000, 0)
        },
        // Unfunded caller
        swap_call("mallory", START + 100, xyk(), usd(), 1_000, 0),
        // More shares than held
        PoolCall {
            caller: addr("bob"),
            timestamp: START + 100,
            action: PoolAction::RemoveLiquidity(xyk_core::RemoveLiquidityParams {
                token_a: xyk(),
                token_b: usd(),
                shares: 1,
                amount_a_min: 0,
                amount_b_min: 0,
                recipient: addr("bob"),
                deadline: START + 100,
            }),
        },
    ];

    let kinds: Vec<_> = rejected
        .into_iter()
        .map(|call| rt.call(call).unwrap_err().kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "InsufficientOutputAmount",
            "Expired",
            "TransferFailed",
            "InsufficientBalance"
        ]
    );

    assert_eq!(rt.pool(), &before_pool);
    assert_eq!(rt.bank(), &before_bank);
    assert_eq!(rt.events().len(), before_events);

    // Going back in time is refused before anything runs
    let err = rt.call(swap_call("bob", START, xyk(), usd(), 1_000, 0)).unwrap_err();
    assert!(matches!(err, RuntimeError::ClockSkew { got: START, .. }));

    println!("✅ Rejected calls left state untouched");
}

// ========================================
// TEST 3: CONCURRENT CALLERS
// ========================================
#[test]
fn test_shared_runtime_concurrent_swaps() {
    println!("\n🧪 TEST 3: Concurrent Callers");

    const THREADS: usize = 8;
    const SWAPS_PER_THREAD: usize = 25;

    let shared = seeded_runtime().into_shared();
    let k_before = shared.lock().unwrap().pool().product();

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for n in 0..SWAPS_PER_THREAD {
                    let mut rt = shared.lock().unwrap();
                    let ts = rt.now() + 1;
                    let (token_in, token_out, amount) = if (i + n) % 2 == 0 {
                        (xyk(), usd(), 500)
                    } else {
                        (usd(), xyk(), 2_000)
                    };
                    rt.call(swap_call("bob", ts, token_in, token_out, amount, 1)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let rt = shared.lock().unwrap();
    let swaps = rt.events().iter().filter(|e| e.name() == "Swap").count();
    assert_eq!(swaps, THREADS * SWAPS_PER_THREAD);
    assert!(rt.pool().product() >= k_before);
    rt.pool().check_invariants().unwrap();
    rt.bank().check_supply().unwrap();

    println!("✅ {} swaps serialized through the mutex", swaps);
}

// ========================================
// TEST 4: SNAPSHOT PERSISTENCE
// ========================================
#[test]
fn test_snapshot_persistence_and_recovery() {
    println!("\n🧪 TEST 4: Snapshot Persistence & Recovery");

    let mut live = seeded_runtime();
    live.call(swap_call("bob", START + 5, usd(), xyk(), 40_000, 1)).unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, live.serialize_state().unwrap()).unwrap();

    let mut restored = Runtime::deserialize_state(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(restored, live);

    // Both copies continue identically
    let next = swap_call("alice", START + 9, xyk(), usd(), 12_345, 1);
    let a = live.call(next.clone()).unwrap();
    let b = restored.call(next).unwrap();
    assert_eq!(a, b);
    assert_eq!(restored, live);

    println!("✅ Snapshot restored and replayed identically");
}

// ========================================
// TEST 5: TAMPERED SNAPSHOT
// ========================================
#[test]
fn test_tampered_snapshot_rejected() {
    println!("\n🧪 TEST 5: Tampered Snapshot Rejection");

    let rt = seeded_runtime();
    let clean: Value = serde_json::from_str(&rt.serialize_state().unwrap()).unwrap();

    // Reserves larger than what the custody holds
    let mut inflated = clean.clone();
    inflated["pool"]["reserve_low"] = json!("999999999999999");
    let err = Runtime::deserialize_state(&inflated.to_string()).unwrap_err();
    assert!(matches!(err, RuntimeError::Snapshot(_)));

    // Shares that no holder accounts for
    let mut minted = clean.clone();
    minted["pool"]["total_shares"] = json!("1");
    assert!(Runtime::deserialize_state(&minted.to_string()).is_err());

    assert!(Runtime::deserialize_state("{}").is_err());
    assert!(Runtime::deserialize_state(&clean.to_string()).is_ok());

    println!("✅ Inconsistent snapshots refused");
}

// ========================================
// TEST 6: TOKEN CONSERVATION
// ========================================
#[test]
fn test_session_conserves_tokens() {
    println!("\n🧪 TEST 6: Token Conservation");

    let mut rt = seeded_runtime();
    let supply = (rt.bank().total_supply(&xyk()), rt.bank().total_supply(&usd()));
    let custody = rt.pool().custody();

    let mut ts = START + 10;
    for i in 0..20u128 {
        ts += 1;
        let _ = rt.call(swap_call("bob", ts, xyk(), usd(), 1_000 + i * 37, 1));
        ts += 1;
        let _ = rt.call(swap_call("alice", ts, usd(), xyk(), 5_000 + i * 11, 1));
    }

    assert_eq!(
        (rt.bank().total_supply(&xyk()), rt.bank().total_supply(&usd())),
        supply
    );
    rt.bank().check_supply().unwrap();

    let (low, high) = (rt.pool().token_low(), rt.pool().token_high());
    assert_eq!(rt.bank().balance_of(&low, &custody), rt.pool().reserve_low());
    assert_eq!(rt.bank().balance_of(&high, &custody), rt.pool().reserve_high());

    println!("✅ Supply constant, custody matches reserves");
}
