//! Sealbox wire framing.
//!
//! Byte-level layouts shared by every Sealbox container, with no
//! cryptography beyond CRC32 integrity fields. The crate is organized by
//! container kind:
//!
//! - [`container`]: the tagged 12-byte header (`tag | size BE | crc LE`)
//!   that frames EC keys and session frames
//! - [`cell_header`]: the 44-byte authenticated-encryption header emitted
//!   in front of Secure Cell ciphertext
//! - [`message`]: the 8-byte Secure Message envelope and the 12-byte
//!   signed-message framing
//! - [`acrastruct`]: the AcraStruct hybrid-container layout
//!
//! All decoders are fail-fast: header fields are validated before any
//! payload is touched, declared sizes must match the buffer exactly, and
//! malformed input is rejected with a typed [`ProtocolError`]. Nothing in
//! this crate allocates secret material; encoding works on caller-provided
//! buffers via [`bytes::BufMut`] or returns plain `Vec<u8>`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod acrastruct;
pub mod cell_header;
pub mod container;
pub mod errors;
pub mod message;

pub use cell_header::CellHeader;
pub use container::Container;
pub use errors::{ProtocolError, Result};
