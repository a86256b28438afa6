//! Fail-fast access to the system CSPRNG.
//!
//! Every random draw in this crate goes through [`random_bytes`] so that a
//! failing or short-reading entropy source becomes a typed error instead of
//! a panic. Operations abort on [`RandomFailure`] before any partial output
//! is produced.

use rand_core::{OsRng, RngCore};
use thiserror::Error;

/// The system CSPRNG failed or returned a short read.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("system csprng unavailable or returned a short read")]
pub struct RandomFailure;

/// Draw exactly `N` random bytes from the system CSPRNG.
///
/// # Errors
///
/// - [`RandomFailure`] if the entropy source reports an error
pub fn random_bytes<const N: usize>() -> Result<[u8; N], RandomFailure> {
    let mut buf = [0u8; N];
    OsRng.try_fill_bytes(&mut buf).map_err(|_| RandomFailure)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_are_distinct() {
        let a = random_bytes::<32>().unwrap();
        let b = random_bytes::<32>().unwrap();
        assert_ne!(a, b, "two 32-byte draws colliding means the rng is broken");
    }
}
