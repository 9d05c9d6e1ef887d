//! Fuzz target: random call sequences against a funded runtime
//!
//! Every call either commits or leaves the runtime exactly as it was.
//! After each call the pool must be consistent, the custody must hold the
//! reserves and swaps must never shrink the reserve product.
//!
//! Run: cargo +nightly fuzz run fuzz_pool_ops

#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use xyk_core::{AddLiquidityParams, RemoveLiquidityParams, SwapParams};
use xyk_runtime::{GenesisConfig, PoolAction, PoolCall};

const ACCOUNTS: [&str; 2] = ["alice", "bob"];

#[derive(Arbitrary, Debug)]
enum Op {
    Add { who: bool, a_is_xyk: bool, amount_a: u64, amount_b: u64, min_a: u32, min_b: u32 },
    Remove { who: bool, shares: u64, min_a: u32, min_b: u32 },
    Swap { who: bool, sell_xyk: bool, amount_in: u64, min_out: u32 },
    Approve { who: bool, xyk: bool, amount: u64 },
}

#[derive(Arbitrary, Debug)]
struct FuzzOpsInput {
    ops: Vec<(u8, Op)>,
}

fuzz_target!(|input: FuzzOpsInput| {
    let config = GenesisConfig::sample();
    let mut rt = match config.build_runtime() {
        Ok(rt) => rt,
        Err(_) => return,
    };
    let xyk = GenesisConfig::token_id("XYK");
    let usd = GenesisConfig::token_id("USD");
    let custody = rt.pool().custody();

    // Bound the sequence length (prevent slow inputs)
    for (step, op) in input.ops.into_iter().take(64) {
        let timestamp = rt.now() + u64::from(step % 4);
        let deadline = timestamp + 10;
        let (caller, action) = match op {
            Op::Add { who, a_is_xyk, amount_a, amount_b, min_a, min_b } => {
                let (token_a, token_b) = if a_is_xyk { (xyk, usd) } else { (usd, xyk) };
                let recipient = GenesisConfig::address(ACCOUNTS[who as usize]);
                (
                    recipient,
                    PoolAction::AddLiquidity(AddLiquidityParams {
                        token_a,
                        token_b,
                        amount_a_desired: amount_a.into(),
                        amount_b_desired: amount_b.into(),
                        amount_a_min: min_a.into(),
                        amount_b_min: min_b.into(),
                        recipient,
                        deadline,
                    }),
                )
            }
            Op::Remove { who, shares, min_a, min_b } => {
                let recipient = GenesisConfig::address(ACCOUNTS[who as usize]);
                (
                    recipient,
                    PoolAction::RemoveLiquidity(RemoveLiquidityParams {
                        token_a: xyk,
                        token_b: usd,
                        shares: shares.into(),
                        amount_a_min: min_a.into(),
                        amount_b_min: min_b.into(),
                        recipient,
                        deadline,
                    }),
                )
            }
            Op::Swap { who, sell_xyk, amount_in, min_out } => {
                let (token_in, token_out) = if sell_xyk { (xyk, usd) } else { (usd, xyk) };
                let recipient = GenesisConfig::address(ACCOUNTS[who as usize]);
                (
                    recipient,
                    PoolAction::SwapExactTokensForTokens(SwapParams::exact_in(
                        token_in,
                        token_out,
                        amount_in.into(),
                        min_out.into(),
                        recipient,
                        deadline,
                    )),
                )
            }
            Op::Approve { who, xyk: on_xyk, amount } => (
                GenesisConfig::address(ACCOUNTS[who as usize]),
                PoolAction::Approve {
                    token: if on_xyk { xyk } else { usd },
                    amount: amount.into(),
                },
            ),
        };

        let is_swap = matches!(action, PoolAction::SwapExactTokensForTokens(_));
        let before = rt.clone();
        let k_before = rt.pool().product();

        match rt.call(PoolCall { caller, timestamp, action }) {
            Ok(_) => {
                if is_swap {
                    assert!(rt.pool().product() >= k_before);
                }
            }
            Err(_) => {
                assert_eq!(rt.pool(), before.pool());
                assert_eq!(rt.bank(), before.bank());
                assert_eq!(rt.events().len(), before.events().len());
            }
        }

        assert!(rt.pool().check_invariants().is_ok());
        assert!(rt.bank().check_supply().is_ok());
        assert_eq!(rt.bank().balance_of(&xyk, &custody), rt.pool().get_reserves(&xyk, &usd).map(|r| r.0).unwrap_or(0));
        assert_eq!(rt.bank().balance_of(&usd, &custody), rt.pool().get_reserves(&xyk, &usd).map(|r| r.1).unwrap_or(0));
    }
});
