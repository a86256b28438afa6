//! Secure Cell, Seal mode.
//!
//! A sealed cell is a self-describing blob: the 44-byte authenticated
//! header ([`sealbox_proto::cell_header`]) followed by the AES-256-GCM
//! ciphertext. The per-message key is derived from the caller's master key,
//! the plaintext length, and the optional context ([`crate::kdf`]); the
//! context additionally binds the ciphertext as GCM associated data, so a
//! cell sealed under one context never opens under another.
//!
//! Keys of any length are accepted; an empty key selects the implicit-key
//! derivation. Both choices are part of the wire contract, not a
//! convenience.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use thiserror::Error;

use sealbox_proto::cell_header::{AUTH_TAG_LEN, CELL_HEADER_LEN, IV_LEN};
use sealbox_proto::{CellHeader, ProtocolError};

use crate::kdf::{self, KdfError};
use crate::rng::{self, RandomFailure};

/// Errors from sealing or opening a cell.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    /// Plaintext does not fit the u32 message-length field
    #[error("payload of {size} bytes exceeds the u32 message length field")]
    DataTooLarge {
        /// Offending plaintext size
        size: usize,
    },

    /// Sealed blob is structurally malformed
    #[error("malformed sealed cell: {0}")]
    Framing(#[from] ProtocolError),

    /// The algorithm field requested an unknown key derivation
    #[error(transparent)]
    Kdf(#[from] KdfError),

    /// GCM tag verification failed: wrong key, wrong context, or tampering
    #[error("cell authentication failed")]
    AuthenticationFailed,

    /// The system CSPRNG failed while drawing the IV
    #[error(transparent)]
    Random(#[from] RandomFailure),
}

/// Seal `plaintext` under `key`, binding `context` into the KDF and the
/// GCM associated data. Returns the ciphertext and its header separately.
///
/// # Errors
///
/// - [`CellError::DataTooLarge`] if the plaintext length overflows u32
/// - [`CellError::Random`] if the IV cannot be drawn
pub fn seal_detached(
    key: &[u8],
    plaintext: &[u8],
    context: &[u8],
) -> Result<(Vec<u8>, CellHeader), CellError> {
    let message_len = u32::try_from(plaintext.len())
        .map_err(|_| CellError::DataTooLarge { size: plaintext.len() })?;

    let cell_key = kdf::derive_cell_key(key, message_len, context);
    let derived = kdf::soter_derive(sealbox_proto::cell_header::ALG_AES_256_GCM, cell_key.as_slice())?;
    let iv: [u8; IV_LEN] = rng::random_bytes()?;

    let Ok(cipher) = Aes256Gcm::new_from_slice(&derived) else {
        unreachable!("cell key derivation always yields 32 bytes");
    };
    let Ok(mut sealed) = cipher.encrypt(
        Nonce::from_slice(&iv),
        Payload { msg: plaintext, aad: context },
    ) else {
        unreachable!("AES-GCM encryption cannot fail for u32-sized plaintext");
    };

    // The AEAD appends the tag to the ciphertext; the wire format carries
    // it in the header instead.
    let mut auth_tag = [0u8; AUTH_TAG_LEN];
    auth_tag.copy_from_slice(&sealed[plaintext.len()..]);
    sealed.truncate(plaintext.len());

    Ok((sealed, CellHeader::new(message_len, iv, auth_tag)))
}

/// Seal `plaintext` into a single self-describing blob
/// (`header || ciphertext`).
///
/// # Errors
///
/// Same conditions as [`seal_detached`].
pub fn seal(key: &[u8], plaintext: &[u8], context: &[u8]) -> Result<Vec<u8>, CellError> {
    let (ciphertext, header) = seal_detached(key, plaintext, context)?;

    let mut out = Vec::with_capacity(CELL_HEADER_LEN + ciphertext.len());
    header.encode(&mut out);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open a sealed blob produced by [`seal`].
///
/// # Errors
///
/// - [`CellError::Framing`] if the header is malformed or the ciphertext
///   length disagrees with the header's message length
/// - [`CellError::AuthenticationFailed`] if the GCM tag does not verify
///   (wrong key, wrong context, or any modified byte)
pub fn open(key: &[u8], sealed: &[u8], context: &[u8]) -> Result<Vec<u8>, CellError> {
    let header = CellHeader::decode(sealed)?;
    let ciphertext = &sealed[CELL_HEADER_LEN..];
    if ciphertext.len() != header.message_len as usize {
        return Err(CellError::Framing(ProtocolError::LengthMismatch {
            declared: header.message_len as usize,
            actual: ciphertext.len(),
        }));
    }

    let cell_key = kdf::derive_cell_key(key, header.message_len, context);
    let derived = kdf::soter_derive(header.alg, cell_key.as_slice())?;

    let Ok(cipher) = Aes256Gcm::new_from_slice(&derived) else {
        unreachable!("cell key derivation always yields 32 bytes");
    };

    let mut joined = Vec::with_capacity(ciphertext.len() + AUTH_TAG_LEN);
    joined.extend_from_slice(ciphertext);
    joined.extend_from_slice(&header.auth_tag);

    cipher
        .decrypt(Nonce::from_slice(&header.iv), Payload { msg: &joined, aad: context })
        .map_err(|_| CellError::AuthenticationFailed)
}
