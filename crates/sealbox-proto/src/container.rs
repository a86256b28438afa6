//! Tagged CRC container framing.
//!
//! A container is a 12-byte header followed by an opaque body:
//!
//! ```text
//! offset 0  tag       4 ASCII bytes
//! offset 4  size      u32 big-endian, includes the 12-byte header
//! offset 8  crc       u32 little-endian, IEEE CRC32
//! offset 12 body
//! ```
//!
//! The checksum always covers the full serialized container with the four
//! CRC bytes treated as zero, so it can be computed in place after the rest
//! of the frame is laid out.
//!
//! # Invariants
//!
//! - Size Consistency: `size == 12 + body.len()`. [`Container::decode`]
//!   rejects buffers whose length differs from the declared size.
//! - Checksum Coverage: the CRC is recomputed over the exact bytes on the
//!   wire; a single flipped bit anywhere outside the CRC field changes it.

use bytes::BufMut;

use crate::errors::{ProtocolError, Result};

/// Length of the container tag.
pub const TAG_LEN: usize = 4;

/// Length of the fixed container header (`tag | size | crc`).
pub const HEADER_LEN: usize = 12;

/// Byte offset of the big-endian size field.
pub const SIZE_OFFSET: usize = 4;

/// Byte offset of the little-endian CRC field.
pub const CRC_OFFSET: usize = 8;

/// A decoded container: tag plus a borrowed body.
///
/// Produced by [`Container::decode`] after all structural checks passed.
/// Tag *recognition* is left to the caller; this layer only guarantees the
/// framing and the checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container<'a> {
    /// The four tag bytes
    pub tag: [u8; 4],
    /// Body bytes following the 12-byte header
    pub body: &'a [u8],
}

impl<'a> Container<'a> {
    /// Serialize a container with the given tag and body.
    ///
    /// Writes the header, body, and finalized CRC into `dst`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::PayloadTooLarge`] if `12 + body.len()` does not
    ///   fit the u32 size field
    pub fn encode(tag: [u8; 4], body: &[u8], dst: &mut Vec<u8>) -> Result<()> {
        let total = u32::try_from(HEADER_LEN + body.len())
            .map_err(|_| ProtocolError::PayloadTooLarge { size: body.len() })?;

        let start = dst.len();
        dst.reserve(total as usize);
        dst.put_slice(&tag);
        dst.put_u32(total);
        dst.put_u32_le(0);
        dst.put_slice(body);

        let crc = crc_over_zeroed(&dst[start..], CRC_OFFSET);
        dst[start + CRC_OFFSET..start + HEADER_LEN].copy_from_slice(&crc.to_le_bytes());
        Ok(())
    }

    /// Serialize a container into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Container::encode`].
    #[must_use = "the container is returned, not written anywhere"]
    pub fn encode_to_vec(tag: [u8; 4], body: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        Self::encode(tag, body, &mut out)?;
        Ok(out)
    }

    /// Parse and validate a container occupying the whole buffer.
    ///
    /// Checks, in order: minimum length, declared size against the buffer
    /// length, and the CRC. The tag is returned as-is for the caller to
    /// recognize.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Truncated`] if the buffer cannot hold a header
    /// - [`ProtocolError::LengthMismatch`] if the size field disagrees with
    ///   the buffer length
    /// - [`ProtocolError::CrcMismatch`] if the checksum does not verify
    pub fn decode(buf: &'a [u8]) -> Result<Self> {
        let tag = peek_tag(buf)?;

        let declared = u32::from_be_bytes([
            buf[SIZE_OFFSET],
            buf[SIZE_OFFSET + 1],
            buf[SIZE_OFFSET + 2],
            buf[SIZE_OFFSET + 3],
        ]) as usize;
        if declared != buf.len() {
            return Err(ProtocolError::LengthMismatch { declared, actual: buf.len() });
        }

        let stored = u32::from_le_bytes([
            buf[CRC_OFFSET],
            buf[CRC_OFFSET + 1],
            buf[CRC_OFFSET + 2],
            buf[CRC_OFFSET + 3],
        ]);
        let computed = crc_over_zeroed(buf, CRC_OFFSET);
        if stored != computed {
            return Err(ProtocolError::CrcMismatch { stored, computed });
        }

        Ok(Self { tag, body: &buf[HEADER_LEN..] })
    }
}

/// Read the tag of a container without validating the rest.
///
/// # Errors
///
/// - [`ProtocolError::Truncated`] if the buffer is shorter than a header
pub fn peek_tag(buf: &[u8]) -> Result<[u8; 4]> {
    if buf.len() < HEADER_LEN {
        return Err(ProtocolError::Truncated { needed: HEADER_LEN, actual: buf.len() });
    }
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&buf[..TAG_LEN]);
    Ok(tag)
}

/// IEEE CRC32 of `frame` with the four bytes at `crc_offset` treated as
/// zero.
///
/// This is the checksum convention every Sealbox container uses: the frame
/// is laid out first, then the CRC is computed as if its own field were
/// zero and written into place. Verification runs the same computation over
/// the received bytes.
///
/// # Panics
///
/// Panics if `crc_offset + 4 > frame.len()`; callers always pass a frame
/// that holds at least a full header.
#[must_use]
pub fn crc_over_zeroed(frame: &[u8], crc_offset: usize) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&frame[..crc_offset]);
    hasher.update(&[0u8; 4]);
    hasher.update(&frame[crc_offset + 4..]);
    hasher.finalize()
}
