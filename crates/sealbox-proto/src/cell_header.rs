//! Authenticated-encryption header for Secure Cell blobs.
//!
//! A sealed cell is `CellHeader || ciphertext`. The header is 44 bytes,
//! all little-endian:
//!
//! ```text
//! offset 0   alg         u32, 0x40010100 (AES-GCM, 256-bit key)
//! offset 4   iv length   u32, always 12
//! offset 8   tag length  u32, always 16
//! offset 12  msg length  u32, plaintext byte count
//! offset 16  iv          12 bytes
//! offset 28  auth tag    16 bytes
//! ```
//!
//! Only `msg length`, `iv`, and `auth tag` vary between blobs; the other
//! fields are fixed and validated on decode so that a header describing a
//! different cipher configuration is rejected before any key derivation
//! happens.

use bytes::BufMut;

use crate::errors::{ProtocolError, Result};

/// Serialized header length (16 fixed bytes + IV + tag).
pub const CELL_HEADER_LEN: usize = 44;

/// Algorithm identifier: AES-GCM with a 256-bit key, no secondary KDF.
pub const ALG_AES_256_GCM: u32 = 0x4001_0100;

/// Mask selecting the secondary-derivation nibble of the algorithm field.
pub const KDF_MASK: u32 = 0x0f00_0000;

/// Secondary derivation: none, use the cell key directly.
pub const KDF_NONE: u32 = 0x0000_0000;

/// Secondary derivation: PBKDF2-HMAC-SHA-256.
pub const KDF_PBKDF2: u32 = 0x0100_0000;

/// GCM nonce width in bytes.
pub const IV_LEN: usize = 12;

/// GCM authentication tag width in bytes.
pub const AUTH_TAG_LEN: usize = 16;

/// Decoded Secure Cell header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellHeader {
    /// Algorithm field as found on the wire
    pub alg: u32,
    /// Plaintext length in bytes
    pub message_len: u32,
    /// GCM nonce
    pub iv: [u8; IV_LEN],
    /// GCM authentication tag
    pub auth_tag: [u8; AUTH_TAG_LEN],
}

impl CellHeader {
    /// Build a header for a freshly sealed message.
    #[must_use]
    pub fn new(message_len: u32, iv: [u8; IV_LEN], auth_tag: [u8; AUTH_TAG_LEN]) -> Self {
        Self { alg: ALG_AES_256_GCM, message_len, iv, auth_tag }
    }

    /// Append the serialized header to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u32_le(self.alg);
        dst.put_u32_le(IV_LEN as u32);
        dst.put_u32_le(AUTH_TAG_LEN as u32);
        dst.put_u32_le(self.message_len);
        dst.put_slice(&self.iv);
        dst.put_slice(&self.auth_tag);
    }

    /// Serialize the header into its fixed-size array form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; CELL_HEADER_LEN] {
        let mut out = [0u8; CELL_HEADER_LEN];
        let mut cursor = &mut out[..];
        self.encode(&mut cursor);
        out
    }

    /// Parse a header from the front of a sealed blob.
    ///
    /// Validates every fixed field; trailing bytes after the header are the
    /// caller's ciphertext and are not examined here.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Truncated`] if fewer than 44 bytes are available
    /// - [`ProtocolError::UnsupportedHeaderField`] if the algorithm, IV
    ///   length, or tag length differs from the AES-256-GCM configuration
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < CELL_HEADER_LEN {
            return Err(ProtocolError::Truncated { needed: CELL_HEADER_LEN, actual: buf.len() });
        }

        let field = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);

        let alg = field(0);
        if alg != ALG_AES_256_GCM {
            return Err(ProtocolError::UnsupportedHeaderField { field: "algorithm", value: alg });
        }
        let iv_len = field(4);
        if iv_len as usize != IV_LEN {
            return Err(ProtocolError::UnsupportedHeaderField { field: "iv length", value: iv_len });
        }
        let tag_len = field(8);
        if tag_len as usize != AUTH_TAG_LEN {
            return Err(ProtocolError::UnsupportedHeaderField {
                field: "auth tag length",
                value: tag_len,
            });
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&buf[16..16 + IV_LEN]);
        let mut auth_tag = [0u8; AUTH_TAG_LEN];
        auth_tag.copy_from_slice(&buf[28..28 + AUTH_TAG_LEN]);

        Ok(Self { alg, message_len: field(12), iv, auth_tag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CellHeader {
        CellHeader::new(7, [0xAA; IV_LEN], [0xBB; AUTH_TAG_LEN])
    }

    #[test]
    fn layout_is_little_endian() {
        let bytes = sample().to_bytes();

        assert_eq!(&bytes[0..4], &[0x00, 0x01, 0x01, 0x40]);
        assert_eq!(&bytes[4..8], &12u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &16u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &7u32.to_le_bytes());
        assert_eq!(&bytes[16..28], &[0xAA; 12]);
        assert_eq!(&bytes[28..44], &[0xBB; 16]);
    }

    #[test]
    fn full_header_matches_wire_fixture() {
        let expected = "000101400c0000001000000007000000\
                        aaaaaaaaaaaaaaaaaaaaaaaa\
                        bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
        assert_eq!(hex::encode(sample().to_bytes()), expected);

        let decoded = CellHeader::decode(&hex::decode(expected).unwrap()).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn decode_roundtrip() {
        let header = sample();
        assert_eq!(CellHeader::decode(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn decode_ignores_trailing_ciphertext() {
        let mut blob = sample().to_bytes().to_vec();
        blob.extend_from_slice(b"ciphertext");
        assert_eq!(CellHeader::decode(&blob).unwrap(), sample());
    }

    #[test]
    fn reject_short_buffer() {
        assert!(matches!(
            CellHeader::decode(&[0u8; 43]),
            Err(ProtocolError::Truncated { needed: 44, actual: 43 })
        ));
    }

    #[test]
    fn reject_foreign_algorithm() {
        let mut bytes = sample().to_bytes();
        bytes[0..4].copy_from_slice(&0x4001_0200u32.to_le_bytes());

        assert!(matches!(
            CellHeader::decode(&bytes),
            Err(ProtocolError::UnsupportedHeaderField { field: "algorithm", .. })
        ));
    }

    #[test]
    fn reject_wrong_iv_length() {
        let mut bytes = sample().to_bytes();
        bytes[4..8].copy_from_slice(&16u32.to_le_bytes());

        assert!(matches!(
            CellHeader::decode(&bytes),
            Err(ProtocolError::UnsupportedHeaderField { field: "iv length", value: 16 })
        ));
    }
}
