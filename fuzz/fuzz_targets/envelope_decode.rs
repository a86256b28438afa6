//! Fuzz target for Secure Message framing
//!
//! Covers both the encrypted envelope and the signed frame, whose length
//! arithmetic (`12 + data_len + sig_len`) is a classic overflow spot.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealbox_proto::message;

fuzz_target!(|data: &[u8]| {
    let _ = message::decode_envelope(data);
    let _ = message::decode_signed(data);
});
