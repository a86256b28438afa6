//! Secure Message envelopes.
//!
//! Two frame shapes share the `0x2604….` type space:
//!
//! Encrypted envelope (8-byte header, both fields little-endian):
//!
//! ```text
//! u32 type          0x26042720 for EC-encrypted
//! u32 total length  header + body, must equal the buffer length
//! body
//! ```
//!
//! Signed frame (12-byte header, all fields little-endian):
//!
//! ```text
//! u32 type          0x26042620 for EC-signed
//! u32 data length
//! u32 sig length
//! data
//! signature         ASN.1 DER
//! ```
//!
//! The signed frame carries two lengths instead of a total; their sum plus
//! the 12-byte header must equal the buffer length exactly.

use bytes::BufMut;

use crate::errors::{ProtocolError, Result};

/// Encrypted-envelope header length.
pub const MESSAGE_HEADER_LEN: usize = 8;

/// Signed-frame header length (`type | data len | sig len`).
pub const SIGNED_HEADER_LEN: usize = 12;

/// Type tag of an EC-encrypted Secure Message.
pub const TYPE_EC_ENCRYPTED: u32 = 0x2604_2720;

/// Type tag of an EC-signed Secure Message.
pub const TYPE_EC_SIGNED: u32 = 0x2604_2620;

/// Whether a type tag denotes any encrypted Secure Message flavor.
#[must_use]
pub fn is_encrypted_type(message_type: u32) -> bool {
    message_type & 0xffff_ff00 == 0x2604_2700
}

/// Wrap a body in an encrypted-message envelope.
///
/// # Errors
///
/// - [`ProtocolError::PayloadTooLarge`] if `8 + body.len()` overflows the
///   u32 total-length field
pub fn encode_envelope(message_type: u32, body: &[u8]) -> Result<Vec<u8>> {
    let total = u32::try_from(MESSAGE_HEADER_LEN + body.len())
        .map_err(|_| ProtocolError::PayloadTooLarge { size: body.len() })?;

    let mut out = Vec::with_capacity(total as usize);
    out.put_u32_le(message_type);
    out.put_u32_le(total);
    out.put_slice(body);
    Ok(out)
}

/// Split an encrypted-message envelope into its type tag and body.
///
/// # Errors
///
/// - [`ProtocolError::Truncated`] if the buffer cannot hold the header
/// - [`ProtocolError::InvalidMessageLength`] if the total-length field does
///   not equal the buffer length
pub fn decode_envelope(buf: &[u8]) -> Result<(u32, &[u8])> {
    if buf.len() < MESSAGE_HEADER_LEN {
        return Err(ProtocolError::Truncated { needed: MESSAGE_HEADER_LEN, actual: buf.len() });
    }
    let message_type = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let declared = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;
    if declared != buf.len() {
        return Err(ProtocolError::InvalidMessageLength { declared, actual: buf.len() });
    }
    Ok((message_type, &buf[MESSAGE_HEADER_LEN..]))
}

/// Frame a payload and its DER signature as an EC-signed message.
///
/// # Errors
///
/// - [`ProtocolError::PayloadTooLarge`] if either section overflows its
///   u32 length field
pub fn encode_signed(data: &[u8], signature: &[u8]) -> Result<Vec<u8>> {
    let data_len =
        u32::try_from(data.len()).map_err(|_| ProtocolError::PayloadTooLarge { size: data.len() })?;
    let sig_len = u32::try_from(signature.len())
        .map_err(|_| ProtocolError::PayloadTooLarge { size: signature.len() })?;

    let mut out = Vec::with_capacity(SIGNED_HEADER_LEN + data.len() + signature.len());
    out.put_u32_le(TYPE_EC_SIGNED);
    out.put_u32_le(data_len);
    out.put_u32_le(sig_len);
    out.put_slice(data);
    out.put_slice(signature);
    Ok(out)
}

/// Split an EC-signed frame into `(data, signature)`.
///
/// Validates the type tag and the exact length arithmetic. The signature
/// itself is not inspected; cryptographic verification happens upstream.
///
/// # Errors
///
/// - [`ProtocolError::Truncated`] if the buffer cannot hold the header
/// - [`ProtocolError::InvalidTag`] if the type tag is not EC-signed
/// - [`ProtocolError::InvalidMessageLength`] if
///   `12 + data len + sig len != buffer length`
pub fn decode_signed(buf: &[u8]) -> Result<(&[u8], &[u8])> {
    if buf.len() < SIGNED_HEADER_LEN {
        return Err(ProtocolError::Truncated { needed: SIGNED_HEADER_LEN, actual: buf.len() });
    }
    let message_type = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if message_type != TYPE_EC_SIGNED {
        return Err(ProtocolError::InvalidTag { tag: [buf[0], buf[1], buf[2], buf[3]] });
    }
    let data_len = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;
    let sig_len = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;

    let declared = SIGNED_HEADER_LEN
        .checked_add(data_len)
        .and_then(|n| n.checked_add(sig_len))
        .ok_or(ProtocolError::InvalidMessageLength { declared: usize::MAX, actual: buf.len() })?;
    if declared != buf.len() {
        return Err(ProtocolError::InvalidMessageLength { declared, actual: buf.len() });
    }

    let data = &buf[SIGNED_HEADER_LEN..SIGNED_HEADER_LEN + data_len];
    let signature = &buf[SIGNED_HEADER_LEN + data_len..];
    Ok((data, signature))
}
