//! Fuzz target: pool arithmetic over the full u128 range
//!
//! The quote functions must return Ok/Err without panicking, and the
//! exact-output inverse must always buy at least what it promises.
//!
//! Run: cargo +nightly fuzz run fuzz_pool_math

#![no_main]
use libfuzzer_sys::fuzz_target;
use xyk_core::math::{get_amount_in, get_amount_out, isqrt, product, quote};

fuzz_target!(|input: (u128, u128, u128)| {
    let (amount, reserve_in, reserve_out) = input;

    if let Ok(out) = get_amount_out(amount, reserve_in, reserve_out) {
        assert!(out < reserve_out);
    }

    if let Ok(needed) = get_amount_in(amount, reserve_in, reserve_out) {
        if let Ok(bought) = get_amount_out(needed, reserve_in, reserve_out) {
            assert!(bought >= amount);
        }
    }

    let _ = quote(amount, reserve_in, reserve_out);

    let p = product(reserve_in, reserve_out);
    let root = isqrt(p);
    assert!(root * root <= p);
});
