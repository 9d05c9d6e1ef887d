//! Fuzz target: call and snapshot JSON deserialization
//!
//! Feeds arbitrary bytes to the call decoder and to snapshot restore.
//! Neither may panic; a snapshot that decodes must pass its own checks.
//!
//! Run: cargo +nightly fuzz run fuzz_call_deserialize -- -max_len=4096

#![no_main]
use libfuzzer_sys::fuzz_target;
use xyk_runtime::{PoolCall, Runtime};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _: Result<PoolCall, _> = serde_json::from_str(s);

        if let Ok(rt) = Runtime::deserialize_state(s) {
            assert!(rt.pool().check_invariants().is_ok());
            assert!(rt.bank().check_supply().is_ok());
        }
    }

    let _: Result<PoolCall, _> = serde_json::from_slice(data);
});
