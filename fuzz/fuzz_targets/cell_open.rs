//! Fuzz target for Secure Cell open
//!
//! Drives header parsing, KDF dispatch, and GCM opening with a fixed key.
//! Arbitrary blobs must be rejected cleanly; only authentication or
//! framing errors are acceptable outcomes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealbox_crypto::cell;

fuzz_target!(|data: &[u8]| {
    let _ = cell::open(&[0u8; 32], data, &[]);
    let _ = cell::open(&[], data, b"context");
});
