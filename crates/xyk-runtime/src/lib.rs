// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// XYK - RUNTIME
//
// Host side of the pool ledger.
// - TokenBank: in-memory multi-token balances and allowances
// - Runtime: executes JSON-encoded pool calls one at a time, transactionally
// - Registry: pool summaries, quotes and LP positions
// - GenesisConfig: TOML description of the starting state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use xyk_core::types::u128_str;
use xyk_core::{
    AddLiquidityOutcome, AddLiquidityParams, Address, EventSink, ExecutionContext, Pool, PoolError,
    PoolEvent, RemoveLiquidityOutcome, RemoveLiquidityParams, SwapParams, TokenId, TokenTransfer,
    TransferError,
};

pub mod bank;
pub mod config;
pub mod registry;

pub use bank::TokenBank;
pub use config::GenesisConfig;
pub use registry::{LpPosition, PoolInfo, SwapQuote};

/// A runtime shared between threads. The mutex serializes calls, which is
/// the only ordering the pool ledger needs.
pub type SharedRuntime = Arc<Mutex<Runtime>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("token transfer failed: {0}")]
    Transfer(#[from] TransferError),
    #[error("timestamp {got} is earlier than the runtime clock {last}")]
    ClockSkew { last: u64, got: u64 },
    #[error("invalid genesis config: {0}")]
    Config(String),
    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}

impl RuntimeError {
    /// Stable kind name for receipts and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::Pool(e) => e.kind(),
            RuntimeError::Transfer(_) => "TransferFailed",
            RuntimeError::ClockSkew { .. } => "ClockSkew",
            RuntimeError::Config(_) => "Config",
            RuntimeError::Snapshot(_) => "Snapshot",
        }
    }
}

// ─────────────────────────────────────────────────────────────
// CALL ABI
// ─────────────────────────────────────────────────────────────

/// One call against the runtime. Encoded as JSON, e.g.
/// `{"caller":"<hex>","timestamp":100,"action":{"action":"PoolInfo"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCall {
    pub caller: Address,
    /// Seconds; must not be earlier than the previous call's timestamp
    pub timestamp: u64,
    pub action: PoolAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum PoolAction {
    /// Set the pool custody's allowance over the caller's `token`.
    Approve {
        token: TokenId,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    AddLiquidity(AddLiquidityParams),
    RemoveLiquidity(RemoveLiquidityParams),
    SwapExactTokensForTokens(SwapParams),

    // ── Read-only queries ──
    GetPrice {
        token_a: TokenId,
        token_b: TokenId,
    },
    GetAmountOut {
        #[serde(with = "u128_str")]
        amount_in: u128,
        #[serde(with = "u128_str")]
        reserve_in: u128,
        #[serde(with = "u128_str")]
        reserve_out: u128,
    },
    ShareBalance {
        holder: Address,
    },
    PoolInfo,
}

impl PoolAction {
    pub fn name(&self) -> &'static str {
        match self {
            PoolAction::Approve { .. } => "Approve",
            PoolAction::AddLiquidity(_) => "AddLiquidity",
            PoolAction::RemoveLiquidity(_) => "RemoveLiquidity",
            PoolAction::SwapExactTokensForTokens(_) => "SwapExactTokensForTokens",
            PoolAction::GetPrice { .. } => "GetPrice",
            PoolAction::GetAmountOut { .. } => "GetAmountOut",
            PoolAction::ShareBalance { .. } => "ShareBalance",
            PoolAction::PoolInfo => "PoolInfo",
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(
            self,
            PoolAction::GetPrice { .. }
                | PoolAction::GetAmountOut { .. }
                | PoolAction::ShareBalance { .. }
                | PoolAction::PoolInfo
        )
    }
}

/// Result value of a successful call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "output")]
pub enum CallOutput {
    Approved {
        token: TokenId,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    LiquidityAdded(AddLiquidityOutcome),
    LiquidityRemoved(RemoveLiquidityOutcome),
    Swapped {
        #[serde(with = "u128_str")]
        amount_out: u128,
    },
    Price {
        #[serde(with = "u128_str")]
        price: u128,
    },
    AmountOut {
        #[serde(with = "u128_str")]
        amount_out: u128,
    },
    Shares {
        holder: Address,
        #[serde(with = "u128_str")]
        shares: u128,
    },
    Info(PoolInfo),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReceipt {
    pub caller: Address,
    pub timestamp: u64,
    pub output: CallOutput,
    /// Events emitted by this call, in order
    #[serde(default)]
    pub events: Vec<PoolEvent>,
}

// ─────────────────────────────────────────────────────────────
// HOST
// ─────────────────────────────────────────────────────────────

/// Per-call host handed to the pool: the bank, the call's caller and time,
/// and the events emitted so far.
struct CallHost<'a> {
    bank: &'a mut TokenBank,
    caller: Address,
    now: u64,
    events: Vec<PoolEvent>,
}

impl TokenTransfer for CallHost<'_> {
    /// Pull against the allowance `from` granted to the pool custody `to`.
    fn transfer_in(&mut self, token: &TokenId, from: &Address, to: &Address, amount: u128) -> Result<(), TransferError> {
        self.bank.transfer_from(token, to, from, to, amount)
    }

    fn transfer_out(&mut self, token: &TokenId, from: &Address, to: &Address, amount: u128) -> Result<(), TransferError> {
        self.bank.transfer(token, from, to, amount)
    }
}

impl ExecutionContext for CallHost<'_> {
    fn now(&self) -> u64 {
        self.now
    }

    fn caller(&self) -> Address {
        self.caller
    }
}

impl EventSink for CallHost<'_> {
    fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }
}

// ─────────────────────────────────────────────────────────────
// RUNTIME
// ─────────────────────────────────────────────────────────────

/// One pool, the bank backing it, a monotonic clock and the event log.
///
/// Every call is one unit: if it fails, the bank and the pool are exactly as
/// they were before the call and no events are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    pool: Pool,
    bank: TokenBank,
    clock: u64,
    #[serde(default)]
    events: Vec<PoolEvent>,
}

impl Runtime {
    pub fn new(pool: Pool, bank: TokenBank, start_time: u64) -> Self {
        Self {
            pool,
            bank,
            clock: start_time,
            events: Vec::new(),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn bank(&self) -> &TokenBank {
        &self.bank
    }

    /// Timestamp of the latest call (or the start time).
    pub fn now(&self) -> u64 {
        self.clock
    }

    /// Every event of every successful call, in order.
    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    pub fn into_shared(self) -> SharedRuntime {
        Arc::new(Mutex::new(self))
    }

    /// Credit new tokens outside of any call (faucet / test setup).
    pub fn mint(&mut self, token: &TokenId, to: &Address, amount: u128) -> Result<(), RuntimeError> {
        self.bank.mint(token, to, amount)?;
        Ok(())
    }

    /// Execute one call.
    pub fn call(&mut self, call: PoolCall) -> Result<CallReceipt, RuntimeError> {
        if call.timestamp < self.clock {
            return Err(RuntimeError::ClockSkew {
                last: self.clock,
                got: call.timestamp,
            });
        }
        let last_clock = self.clock;
        self.clock = call.timestamp;

        let action = call.action.name();
        let bank_snapshot = self.bank.clone();
        let pool_snapshot = self.pool.clone();
        let mut host = CallHost {
            bank: &mut self.bank,
            caller: call.caller,
            now: call.timestamp,
            events: Vec::new(),
        };

        match dispatch(&mut self.pool, &mut host, call.action) {
            Ok(output) => {
                let events = host.events;
                self.events.extend(events.iter().cloned());
                log::debug!("{} by {:?}: {} events", action, call.caller, events.len());
                Ok(CallReceipt {
                    caller: call.caller,
                    timestamp: call.timestamp,
                    output,
                    events,
                })
            }
            Err(err) => {
                self.clock = last_clock;
                self.bank = bank_snapshot;
                self.pool = pool_snapshot;
                log::warn!("{} by {:?} rejected: {}", action, call.caller, err);
                Err(err)
            }
        }
    }

    /// Decode a JSON [`PoolCall`] and execute it.
    pub fn call_json(&mut self, json: &str) -> Result<CallReceipt, Box<dyn std::error::Error>> {
        let call: PoolCall = serde_json::from_str(json)?;
        Ok(self.call(call)?)
    }

    pub fn pool_info(&self) -> PoolInfo {
        registry::pool_info(&self.pool, &self.bank)
    }

    pub fn lp_position(&self, holder: &Address) -> LpPosition {
        registry::lp_position(&self.pool, holder)
    }

    pub fn quote(&self, token_in: &TokenId, amount_in: u128) -> Result<SwapQuote, RuntimeError> {
        Ok(registry::compute_quote(&self.pool, token_in, amount_in)?)
    }

    // ─────────────────────────────────────────────────────────
    // SNAPSHOTS
    // ─────────────────────────────────────────────────────────

    pub fn serialize_state(&self) -> Result<String, RuntimeError> {
        serde_json::to_string_pretty(self).map_err(|e| RuntimeError::Snapshot(e.to_string()))
    }

    /// Restore a runtime from [`Runtime::serialize_state`] output, rejecting
    /// snapshots whose pool or bank is internally inconsistent.
    pub fn deserialize_state(json: &str) -> Result<Self, RuntimeError> {
        let rt: Runtime = serde_json::from_str(json).map_err(|e| RuntimeError::Snapshot(e.to_string()))?;
        rt.pool.check_invariants().map_err(RuntimeError::Snapshot)?;
        rt.bank.check_supply().map_err(RuntimeError::Snapshot)?;
        let custody = rt.pool.custody();
        let (low, high) = (rt.pool.token_low(), rt.pool.token_high());
        if rt.bank.balance_of(&low, &custody) < rt.pool.reserve_low()
            || rt.bank.balance_of(&high, &custody) < rt.pool.reserve_high()
        {
            return Err(RuntimeError::Snapshot("custody balance below pool reserves".to_string()));
        }
        Ok(rt)
    }
}

fn dispatch(pool: &mut Pool, host: &mut CallHost<'_>, action: PoolAction) -> Result<CallOutput, RuntimeError> {
    let output = match action {
        PoolAction::Approve { token, amount } => {
            host.bank.approve(&token, &host.caller, &pool.custody(), amount)?;
            CallOutput::Approved { token, amount }
        }
        PoolAction::AddLiquidity(params) => CallOutput::LiquidityAdded(pool.add_liquidity(host, &params)?),
        PoolAction::RemoveLiquidity(params) => {
            CallOutput::LiquidityRemoved(pool.remove_liquidity(host, &params)?)
        }
        PoolAction::SwapExactTokensForTokens(params) => CallOutput::Swapped {
            amount_out: pool.swap_exact_tokens_for_tokens(host, &params)?,
        },
        PoolAction::GetPrice { token_a, token_b } => CallOutput::Price {
            price: pool.get_price(&token_a, &token_b)?,
        },
        PoolAction::GetAmountOut {
            amount_in,
            reserve_in,
            reserve_out,
        } => CallOutput::AmountOut {
            amount_out: Pool::get_amount_out(amount_in, reserve_in, reserve_out)?,
        },
        PoolAction::ShareBalance { holder } => CallOutput::Shares {
            holder,
            shares: pool.share_balance(&holder),
        },
        PoolAction::PoolInfo => CallOutput::Info(registry::pool_info(pool, &*host.bank)),
    };
    Ok(output)
}

// ─────────────────────────────────────────────────────────────
// TESTS
// ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> TokenId {
        GenesisConfig::token_id("XYK")
    }

    fn usd() -> TokenId {
        GenesisConfig::token_id("USD")
    }

    fn alice() -> Address {
        GenesisConfig::address("alice")
    }

    fn bob() -> Address {
        GenesisConfig::address("bob")
    }

    fn runtime() -> Runtime {
        GenesisConfig::sample().build_runtime().unwrap()
    }

    fn call(caller: Address, timestamp: u64, action: PoolAction) -> PoolCall {
        PoolCall {
            caller,
            timestamp,
            action,
        }
    }

    fn seed(rt: &mut Runtime) -> CallReceipt {
        let t = rt.now();
        rt.call(call(
            alice(),
            t,
            PoolAction::AddLiquidity(AddLiquidityParams {
                token_a: x(),
                token_b: usd(),
                amount_a_desired: 1_000_000,
                amount_b_desired: 4_000_000,
                amount_a_min: 0,
                amount_b_min: 0,
                recipient: alice(),
                deadline: t + 60,
            }),
        ))
        .unwrap()
    }

    #[test]
    fn test_add_liquidity_moves_bank_balances() {
        let mut rt = runtime();
        let receipt = seed(&mut rt);
        let CallOutput::LiquidityAdded(out) = receipt.output else {
            panic!("unexpected output {:?}", receipt.output);
        };
        // isqrt(4e12) = 2_000_000
        assert_eq!(out.shares, 2_000_000 - 1_000);
        assert_eq!(rt.bank().balance_of(&x(), &rt.pool().custody()), 1_000_000);
        assert_eq!(rt.bank().balance_of(&usd(), &alice()), 2_000_000_000 - 4_000_000);
        assert_eq!(receipt.events.len(), 2);
        assert_eq!(rt.events().len(), 2);
    }

    #[test]
    fn test_failed_call_restores_bank_and_pool() {
        let mut rt = runtime();
        seed(&mut rt);
        let carol = Address::derive("carol");
        // carol holds XYK with an allowance but no USD: second transfer-in fails
        rt.mint(&x(), &carol, 10_000).unwrap();
        rt.call(call(carol, rt.now(), PoolAction::Approve { token: x(), amount: u128::MAX }))
            .unwrap();
        let before = rt.clone();

        let err = rt
            .call(call(
                carol,
                rt.now(),
                PoolAction::AddLiquidity(AddLiquidityParams {
                    token_a: x(),
                    token_b: usd(),
                    amount_a_desired: 1_000,
                    amount_b_desired: 4_000,
                    amount_a_min: 0,
                    amount_b_min: 0,
                    recipient: carol,
                    deadline: rt.now(),
                }),
            ))
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Pool(PoolError::TransferFailed(TransferError::InsufficientAllowance { .. }))
        ));
        assert_eq!(err.kind(), "TransferFailed");
        assert_eq!(rt, before);
    }

    #[test]
    fn test_swap_without_allowance_fails_cleanly() {
        let mut rt = runtime();
        seed(&mut rt);
        let dave = Address::derive("dave");
        rt.mint(&x(), &dave, 500).unwrap();
        let before = rt.clone();
        let err = rt
            .call(call(
                dave,
                rt.now(),
                PoolAction::SwapExactTokensForTokens(SwapParams::exact_in(x(), usd(), 500, 0, dave, rt.now())),
            ))
            .unwrap_err();
        assert_eq!(err.kind(), "TransferFailed");
        assert_eq!(rt, before);
    }

    #[test]
    fn test_clock_must_not_go_backwards() {
        let mut rt = runtime();
        let t = rt.now();
        rt.call(call(bob(), t + 10, PoolAction::PoolInfo)).unwrap();
        let err = rt.call(call(bob(), t + 9, PoolAction::PoolInfo)).unwrap_err();
        assert_eq!(err, RuntimeError::ClockSkew { last: t + 10, got: t + 9 });
        assert_eq!(rt.now(), t + 10);
    }

    #[test]
    fn test_rejected_call_keeps_clock() {
        let mut rt = runtime();
        let t = rt.now();
        let err = rt
            .call(call(bob(), t + 50, PoolAction::GetPrice { token_a: x(), token_b: usd() }))
            .unwrap_err();
        assert_eq!(err, RuntimeError::Pool(PoolError::NoLiquidity));
        assert_eq!(rt.now(), t);

        // An earlier timestamp than the rejected one is still accepted
        rt.call(call(bob(), t + 10, PoolAction::PoolInfo)).unwrap();
        assert_eq!(rt.now(), t + 10);
    }

    #[test]
    fn test_queries() {
        let mut rt = runtime();
        let t = rt.now();
        let err = rt
            .call(call(bob(), t, PoolAction::GetPrice { token_a: x(), token_b: usd() }))
            .unwrap_err();
        assert_eq!(err, RuntimeError::Pool(PoolError::NoLiquidity));

        seed(&mut rt);
        let r = rt
            .call(call(bob(), t, PoolAction::GetPrice { token_a: x(), token_b: usd() }))
            .unwrap();
        assert_eq!(r.output, CallOutput::Price { price: 4 * xyk_core::PRICE_SCALE });

        let r = rt.call(call(bob(), t, PoolAction::ShareBalance { holder: alice() })).unwrap();
        assert_eq!(r.output, CallOutput::Shares { holder: alice(), shares: 1_999_000 });

        let r = rt
            .call(call(
                bob(),
                t,
                PoolAction::GetAmountOut { amount_in: 10, reserve_in: 1_000, reserve_out: 2_000 },
            ))
            .unwrap();
        assert_eq!(r.output, CallOutput::AmountOut { amount_out: 19 });

        let r = rt.call(call(bob(), t, PoolAction::PoolInfo)).unwrap();
        let CallOutput::Info(info) = r.output else {
            panic!("unexpected output");
        };
        assert_eq!(info.total_shares, 2_000_000);
        assert_eq!(info.holders, 2);
        assert!(r.events.is_empty());
        assert!(PoolAction::PoolInfo.is_query());
    }

    #[test]
    fn test_call_json_abi() {
        let mut rt = runtime();
        seed(&mut rt);
        let json = format!(
            r#"{{"caller":"{}","timestamp":{},"action":{{"action":"SwapExactTokensForTokens","amount_in":"1000","amount_out_min":"3000","path":["{}","{}"],"recipient":"{}","deadline":{}}}}}"#,
            bob(),
            rt.now(),
            x(),
            usd(),
            bob(),
            rt.now() + 5
        );
        let receipt = rt.call_json(&json).unwrap();
        // 997_000·4_000_000 / (1_000_000_000 + 997_000) = 3984
        assert_eq!(receipt.output, CallOutput::Swapped { amount_out: 3_984 });
        let encoded = serde_json::to_value(&receipt).unwrap();
        assert_eq!(encoded["output"]["output"], "Swapped");
        assert_eq!(encoded["output"]["amount_out"], "3984");
        assert_eq!(encoded["events"][1]["event"], "Swap");

        assert!(rt.call_json("{\"caller\":\"zz\"}").is_err());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut rt = runtime();
        seed(&mut rt);
        let json = rt.serialize_state().unwrap();
        let restored = Runtime::deserialize_state(&json).unwrap();
        assert_eq!(restored, rt);
    }

    #[test]
    fn test_snapshot_rejects_unbacked_reserves() {
        let mut rt = runtime();
        seed(&mut rt);
        let mut value: serde_json::Value = serde_json::from_str(&rt.serialize_state().unwrap()).unwrap();
        let custody = rt.pool().custody().to_hex();
        let x_hex = x().to_hex();
        // move the custody's XYK to alice, keeping supply intact
        let balances = &mut value["bank"]["tokens"][&x_hex]["balances"];
        balances[&custody] = serde_json::Value::String("0".to_string());
        let alice_hex = alice().to_hex();
        let alice_bal: u128 = balances[&alice_hex].as_str().unwrap().parse().unwrap();
        balances[&alice_hex] = serde_json::Value::String((alice_bal + 1_000_000).to_string());

        let err = Runtime::deserialize_state(&value.to_string()).unwrap_err();
        assert_eq!(err, RuntimeError::Snapshot("custody balance below pool reserves".to_string()));
    }
}
