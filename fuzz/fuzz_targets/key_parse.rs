//! Fuzz target for EC key parsing
//!
//! Exercises container validation plus point decompression and scalar
//! range checks. No input may panic; invalid points and corrupt containers
//! must come back as typed errors.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealbox_crypto::keys::{EcPrivateKey, EcPublicKey};

fuzz_target!(|data: &[u8]| {
    let _ = EcPublicKey::parse(data);
    let _ = EcPrivateKey::parse(data);
});
