//! Error types for Sealbox wire framing.
//!
//! Every decoder failure is a typed variant carrying the expected/actual
//! values that caused the rejection. Callers in higher layers either
//! propagate these as-is or collapse them into their own domain errors
//! (e.g. signature verification treats any framing defect as a bad
//! signature).

use thiserror::Error;

/// Convenience alias for framing results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from encoding or decoding wire containers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is smaller than the fixed header it must contain
    #[error("buffer too short: need at least {needed} bytes, got {actual}")]
    Truncated {
        /// Minimum number of bytes required
        needed: usize,
        /// Number of bytes available
        actual: usize,
    },

    /// Declared container size does not match the buffer length
    #[error("container declares {declared} bytes, buffer has {actual}")]
    LengthMismatch {
        /// Size announced in the header
        declared: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// Container tag is not one of the recognized prefixes
    #[error("unrecognized container tag {tag:02x?}")]
    InvalidTag {
        /// The four tag bytes found on the wire
        tag: [u8; 4],
    },

    /// CRC32 integrity field does not match the recomputed checksum
    #[error("crc32 mismatch: field holds {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// Checksum stored in the container
        stored: u32,
        /// Checksum recomputed over the container
        computed: u32,
    },

    /// Payload does not fit the length field of its frame
    #[error("payload of {size} bytes exceeds the frame length field")]
    PayloadTooLarge {
        /// Offending payload size
        size: usize,
    },

    /// Message envelope length field disagrees with the buffer
    #[error("message envelope declares {declared} bytes, buffer has {actual}")]
    InvalidMessageLength {
        /// Total length announced in the envelope header
        declared: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// A fixed cell header field holds an unsupported value
    #[error("unsupported cell header {field}: {value:#010x}")]
    UnsupportedHeaderField {
        /// Which header field was rejected
        field: &'static str,
        /// The value found on the wire
        value: u32,
    },

    /// AcraStruct begin tag is missing or wrong
    #[error("acrastruct begin tag mismatch")]
    InvalidBeginTag,

    /// AcraStruct data-length field disagrees with the trailing segment
    #[error("acrastruct declares {declared} data bytes, trailing segment has {actual}")]
    DataLengthMismatch {
        /// Length stored in the 8-byte field
        declared: u64,
        /// Bytes actually present after the field
        actual: usize,
    },
}
