//! Key derivation for Secure Cell.
//!
//! Two stages compose here, and the wire format depends on both staying
//! bit-exact:
//!
//! 1. The labelled HMAC-SHA-256 derivation ([`themis_kdf`]) that turns the
//!    caller's master key, a fixed label, and the context blocks into a
//!    32-byte cell key. An empty master key is replaced by an *implicit
//!    key* synthesized from the label and the context blocks.
//! 2. A secondary derivation ([`soter_derive`]) selected by the KDF nibble
//!    of the cell algorithm field. Seal always selects the identity path;
//!    the PBKDF2 path exists for compatibility with the algorithm-field
//!    dispatch and is routed but never reached from Seal.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use sealbox_proto::cell_header::{KDF_MASK, KDF_NONE, KDF_PBKDF2};

type HmacSha256 = Hmac<Sha256>;

/// Derivation label for Secure Cell message keys.
pub const CELL_KEY_LABEL: &[u8] = b"Themis secure cell message key";

/// Width of the synthesized implicit key.
const IMPLICIT_KEY_LEN: usize = 32;

/// Output width of the PBKDF2 secondary derivation.
const PBKDF2_OUTPUT_LEN: usize = 16;

/// Errors from the secondary key derivation dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KdfError {
    /// The KDF nibble of the algorithm field holds an unknown value
    #[error("unknown kdf algorithm {alg:#010x}")]
    InvalidAlgorithm {
        /// Full algorithm field value as found on the wire
        alg: u32,
    },
}

/// Labelled HMAC-SHA-256 key derivation.
///
/// Computes `HMAC-SHA256(K, 0x00000001 || label || 0x00 || blocks…)` where
/// empty context blocks are skipped. When `key` is empty, K becomes the
/// implicit key: the first 32 bytes of the label, with each non-empty
/// context block XOR-ed into its first `min(32, len)` bytes. Context bytes
/// past the first 32 of a block do not contribute; this is part of the wire
/// contract.
#[must_use]
pub fn themis_kdf(key: &[u8], label: &[u8], context_blocks: &[&[u8]]) -> Zeroizing<[u8; 32]> {
    let mut implicit = Zeroizing::new([0u8; IMPLICIT_KEY_LEN]);
    let key: &[u8] = if key.is_empty() {
        let head = label.len().min(IMPLICIT_KEY_LEN);
        implicit[..head].copy_from_slice(&label[..head]);
        for block in context_blocks.iter().filter(|block| !block.is_empty()) {
            for (dst, src) in implicit.iter_mut().zip(block.iter()) {
                *dst ^= src;
            }
        }
        &implicit[..]
    } else {
        key
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(&[0, 0, 0, 1]);
    mac.update(label);
    mac.update(&[0]);
    for block in context_blocks.iter().filter(|block| !block.is_empty()) {
        mac.update(block);
    }

    Zeroizing::new(mac.finalize().into_bytes().into())
}

/// Derive the cell key for a message of `message_len` bytes.
///
/// The first context block is always the little-endian plaintext length;
/// the caller's associated data follows as the second block (skipped when
/// empty).
#[must_use]
pub fn derive_cell_key(key: &[u8], message_len: u32, context: &[u8]) -> Zeroizing<[u8; 32]> {
    let length_block = message_len.to_le_bytes();
    themis_kdf(key, CELL_KEY_LABEL, &[&length_block, context])
}

/// Secondary derivation selected by the algorithm field.
///
/// `0x00` passes the key through unchanged; `0x01` applies
/// PBKDF2-HMAC-SHA-256 with an empty salt, an iteration count of zero (a
/// boundary the wire format fixes: the output is the first PRF block), and
/// a 16-byte output.
///
/// # Errors
///
/// - [`KdfError::InvalidAlgorithm`] for any other nibble value
pub fn soter_derive(alg: u32, key: &[u8]) -> Result<Zeroizing<Vec<u8>>, KdfError> {
    match alg & KDF_MASK {
        KDF_NONE => Ok(Zeroizing::new(key.to_vec())),
        KDF_PBKDF2 => {
            let mut out = Zeroizing::new(vec![0u8; PBKDF2_OUTPUT_LEN]);
            pbkdf2::pbkdf2_hmac::<Sha256>(key, &[], 0, &mut out);
            Ok(out)
        }
        _ => Err(KdfError::InvalidAlgorithm { alg }),
    }
}
