//! Fuzz target for Container::decode
//!
//! Arbitrary bytes must never panic the container parser: truncated
//! headers, lying size fields, and corrupt CRCs all have to surface as
//! errors.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealbox_proto::Container;

fuzz_target!(|data: &[u8]| {
    let _ = Container::decode(data);
});
