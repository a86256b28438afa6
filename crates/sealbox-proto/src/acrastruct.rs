//! AcraStruct container layout.
//!
//! ```text
//! offset 0    begin tag      8 × 0x22 ('"')
//! offset 8    public key     45 bytes, marshalled compressed P-256 key
//! offset 53   wrapped key    84 bytes, Secure Message wrap of the data key
//! offset 137  data length    u64 little-endian
//! offset 145  encrypted data
//! ```
//!
//! The key block widths are fixed by construction: a compressed P-256
//! public-key container is 45 bytes, and the Secure Message wrap of a
//! 32-byte key with empty context is 84 bytes (8-byte envelope + 44-byte
//! cell header + 32 ciphertext bytes). This module owns the arithmetic and
//! the structural validation; key parsing and decryption happen upstream.

use crate::errors::{ProtocolError, Result};

/// The byte repeated through the begin tag.
pub const TAG_SYMBOL: u8 = b'"';

/// AcraStruct begin tag.
pub const TAG_BEGIN: [u8; 8] = [TAG_SYMBOL; 8];

/// Marshalled compressed P-256 public-key container length.
pub const PUBLIC_KEY_LEN: usize = 45;

/// Secure Message wrap of a 32-byte data key.
pub const WRAPPED_KEY_LEN: usize = 84;

/// Public key plus wrapped data key.
pub const KEY_BLOCK_LEN: usize = PUBLIC_KEY_LEN + WRAPPED_KEY_LEN;

/// Width of the little-endian data-length field.
pub const DATA_LENGTH_LEN: usize = 8;

/// Size of the random symmetric data key.
pub const SYMMETRIC_KEY_LEN: usize = 32;

/// Smallest well-formed AcraStruct (empty encrypted payload).
pub const MIN_LEN: usize = TAG_BEGIN.len() + KEY_BLOCK_LEN + DATA_LENGTH_LEN;

/// Borrowed sections of a validated AcraStruct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcraStructParts<'a> {
    /// Marshalled ephemeral public key
    pub public_key: &'a [u8],
    /// Secure Message wrap of the data key
    pub wrapped_key: &'a [u8],
    /// Sealed payload (cell header + ciphertext)
    pub encrypted_data: &'a [u8],
}

/// Validate the framing of an AcraStruct without touching key material.
///
/// # Errors
///
/// - [`ProtocolError::Truncated`] if the buffer is below the 145-byte
///   minimum
/// - [`ProtocolError::InvalidBeginTag`] if the first eight bytes are not
///   `0x22`
/// - [`ProtocolError::DataLengthMismatch`] if the length field disagrees
///   with the trailing segment
pub fn validate(data: &[u8]) -> Result<()> {
    if data.len() < MIN_LEN {
        return Err(ProtocolError::Truncated { needed: MIN_LEN, actual: data.len() });
    }
    if data[..TAG_BEGIN.len()] != TAG_BEGIN {
        return Err(ProtocolError::InvalidBeginTag);
    }
    let declared = u64::from_le_bytes(
        data[MIN_LEN - DATA_LENGTH_LEN..MIN_LEN].try_into().expect("fixed 8-byte slice"),
    );
    let actual = data.len() - MIN_LEN;
    if declared != actual as u64 {
        return Err(ProtocolError::DataLengthMismatch { declared, actual });
    }
    Ok(())
}

/// Validate an AcraStruct and split it into its sections.
///
/// # Errors
///
/// Same conditions as [`validate`].
pub fn split(data: &[u8]) -> Result<AcraStructParts<'_>> {
    validate(data)?;
    let inner = &data[TAG_BEGIN.len()..];
    Ok(AcraStructParts {
        public_key: &inner[..PUBLIC_KEY_LEN],
        wrapped_key: &inner[PUBLIC_KEY_LEN..KEY_BLOCK_LEN],
        encrypted_data: &inner[KEY_BLOCK_LEN + DATA_LENGTH_LEN..],
    })
}

/// Assemble an AcraStruct from its already-built sections.
///
/// # Panics
///
/// Panics (in debug builds) if the key sections do not have their fixed
/// widths; the caller constructs both and the widths are invariants of
/// those constructions.
#[must_use]
pub fn assemble(public_key: &[u8], wrapped_key: &[u8], encrypted_data: &[u8]) -> Vec<u8> {
    debug_assert_eq!(public_key.len(), PUBLIC_KEY_LEN);
    debug_assert_eq!(wrapped_key.len(), WRAPPED_KEY_LEN);

    let mut out = Vec::with_capacity(MIN_LEN + encrypted_data.len());
    out.extend_from_slice(&TAG_BEGIN);
    out.extend_from_slice(public_key);
    out.extend_from_slice(wrapped_key);
    out.extend_from_slice(&(encrypted_data.len() as u64).to_le_bytes());
    out.extend_from_slice(encrypted_data);
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample(payload: &[u8]) -> Vec<u8> {
        assemble(&[0xA1; PUBLIC_KEY_LEN], &[0xB2; WRAPPED_KEY_LEN], payload)
    }

    #[test]
    fn split_recovers_sections() {
        let blob = sample(b"sealed payload");

        let parts = split(&blob).unwrap();
        assert_eq!(parts.public_key, &[0xA1; PUBLIC_KEY_LEN]);
        assert_eq!(parts.wrapped_key, &[0xB2; WRAPPED_KEY_LEN]);
        assert_eq!(parts.encrypted_data, b"sealed payload");
    }

    #[test]
    fn layout_offsets() {
        let blob = sample(b"x");
        assert_eq!(&blob[..8], b"\"\"\"\"\"\"\"\"");
        assert_eq!(blob[8], 0xA1);
        assert_eq!(blob[53], 0xB2);
        assert_eq!(&blob[137..145], &1u64.to_le_bytes());
        assert_eq!(blob.len(), MIN_LEN + 1);
    }

    #[test]
    fn reject_short_buffer() {
        assert!(matches!(
            validate(&[TAG_SYMBOL; MIN_LEN - 1]),
            Err(ProtocolError::Truncated { needed: 145, .. })
        ));
    }

    #[test]
    fn reject_wrong_tag() {
        let mut blob = sample(b"data");
        blob[3] = b'!';
        assert_eq!(validate(&blob), Err(ProtocolError::InvalidBeginTag));
    }

    #[test]
    fn reject_length_field_mismatch() {
        let mut blob = sample(b"data");
        blob[137] = 0xFF;

        assert!(matches!(validate(&blob), Err(ProtocolError::DataLengthMismatch { .. })));
    }

    proptest! {
        #[test]
        fn roundtrip_arbitrary_payloads(payload in prop::collection::vec(any::<u8>(), 0..1024)) {
            let blob = sample(&payload);
            let parts = split(&blob).unwrap();
            prop_assert_eq!(parts.encrypted_data, &payload[..]);
        }

        #[test]
        fn validate_never_panics(buf in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = validate(&buf);
        }
    }
}
