//! AcraStruct: hybrid encryption against a long-term public key.
//!
//! Each AcraStruct is produced with a throwaway P-256 keypair and a
//! throwaway 32-byte data key:
//!
//! 1. the data key is wrapped for the recipient with a Secure Message
//!    (ephemeral private × recipient public),
//! 2. the payload is sealed under the data key as a Secure Cell bound to
//!    the caller's context,
//! 3. tag, ephemeral public key, wrapped key, and sealed payload are framed
//!    per [`sealbox_proto::acrastruct`].
//!
//! Only the holder of the recipient's private key can recover the data
//! key, and only with the matching context can the payload be opened. The
//! ephemeral private key and the data key live for the duration of one
//! call and are wiped on every exit path.

use thiserror::Error;
use zeroize::Zeroizing;

use sealbox_proto::acrastruct as layout;
use sealbox_proto::ProtocolError;

use crate::cell::{self, CellError};
use crate::keys::{EcCurve, EcKeyPair, EcPrivateKey, EcPublicKey, KeyError};
use crate::message::{MessageError, SecureMessage};
use crate::rng::{self, RandomFailure};

/// Errors from creating or decrypting an AcraStruct.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcraStructError {
    /// Container framing is malformed
    #[error("malformed acrastruct: {0}")]
    Framing(#[from] ProtocolError),

    /// The embedded ephemeral public key is invalid
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Wrapping or unwrapping the data key failed
    #[error(transparent)]
    Message(#[from] MessageError),

    /// Sealing or opening the payload failed
    #[error(transparent)]
    Cell(#[from] CellError),

    /// The system CSPRNG failed while drawing the data key
    #[error(transparent)]
    Random(#[from] RandomFailure),
}

/// Encrypt `plaintext` for the holder of `peer_public`, binding `context`.
///
/// `peer_public` must be a P-256 key: the ephemeral side of the key wrap is
/// always generated on P-256, and Secure Message requires both sides on one
/// curve.
///
/// # Errors
///
/// - [`AcraStructError::Message`] with a curve mismatch if `peer_public` is
///   not P-256
/// - [`AcraStructError::Random`] if the CSPRNG fails
/// - [`AcraStructError::Cell`] if the payload exceeds the cell size limit
pub fn create_acrastruct(
    plaintext: &[u8],
    peer_public: &EcPublicKey,
    context: &[u8],
) -> Result<Vec<u8>, AcraStructError> {
    let data_key = Zeroizing::new(rng::random_bytes::<{ layout::SYMMETRIC_KEY_LEN }>()?);

    // The ephemeral keypair exists only to wrap the data key; it is dropped
    // (and its scalar wiped) as soon as the wrap is done.
    let (public_bytes, wrapped_key) = {
        let ephemeral = EcKeyPair::generate(EcCurve::P256)?;
        let public_bytes = ephemeral.public.marshal();
        let wrapped =
            SecureMessage::new(&ephemeral.private, peer_public)?.wrap(&data_key[..])?;
        (public_bytes, wrapped)
    };
    debug_assert_eq!(wrapped_key.len(), layout::WRAPPED_KEY_LEN);

    let encrypted = cell::seal(&data_key[..], plaintext, context)?;
    Ok(layout::assemble(&public_bytes, &wrapped_key, &encrypted))
}

/// Decrypt an AcraStruct with the recipient's private key and context.
///
/// # Errors
///
/// - [`AcraStructError::Framing`] if the tag, length, or length field are
///   wrong
/// - [`AcraStructError::Key`] if the embedded public key does not parse
/// - [`AcraStructError::Message`] / [`AcraStructError::Cell`] if the key
///   unwrap or the payload authentication fails (wrong private key or
///   wrong context)
pub fn decrypt_acrastruct(
    data: &[u8],
    private: &EcPrivateKey,
    context: &[u8],
) -> Result<Vec<u8>, AcraStructError> {
    let parts = layout::split(data)?;
    let ephemeral_public = EcPublicKey::parse(parts.public_key)?;

    let data_key = Zeroizing::new(
        SecureMessage::new(private, &ephemeral_public)?.unwrap(parts.wrapped_key)?,
    );
    Ok(cell::open(&data_key[..], parts.encrypted_data, context)?)
}
