//! Secure Message: single-shot encrypted or signed messages between EC
//! keyholders.
//!
//! The encrypted flavor derives a shared key via ECDH (the X coordinate of
//! `peer_public · our_scalar`, at curve width), seals the payload as a
//! Secure Cell with empty context, and frames the result in the 8-byte
//! envelope. The construction is symmetric: either side of a keypair swap
//! derives the same shared key, so `wrap` and `unwrap` work in both
//! directions.
//!
//! The signed flavor carries the plaintext and a DER ECDSA signature over
//! its SHA-256 digest in the 12-byte signed frame. Verification collapses
//! every framing defect into [`MessageError::VerifyFailed`]; a caller
//! learns only that the message cannot be trusted.

use thiserror::Error;
use zeroize::Zeroizing;

use sealbox_proto::message as wire;
use sealbox_proto::ProtocolError;

use crate::cell::{self, CellError};
use crate::keys::{EcCurve, EcPrivateKey, EcPublicKey, KeyError};

/// Errors from wrapping, unwrapping, signing, or verifying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Sender and receiver keys live on different curves
    #[error("keys use different curves: {ours:?} and {theirs:?}")]
    CurveMismatch {
        /// Curve of the private key
        ours: EcCurve,
        /// Curve of the public key
        theirs: EcCurve,
    },

    /// Envelope framing is malformed
    #[error("malformed message envelope: {0}")]
    Envelope(#[from] ProtocolError),

    /// The envelope type tag is not the expected flavor
    #[error("unexpected message type {found:#010x}")]
    UnexpectedType {
        /// Type tag found in the envelope
        found: u32,
    },

    /// The sealed body failed to open
    #[error(transparent)]
    Cell(#[from] CellError),

    /// Key-level failure while signing
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Signature or signed frame did not verify
    #[error("message verification failed")]
    VerifyFailed,
}

/// An encrypted channel between one private key and one peer public key.
///
/// Both keys are borrowed; the session holds no derived state. The ECDH
/// shared secret is recomputed per operation and wiped before returning.
#[derive(Debug)]
pub struct SecureMessage<'a> {
    private: &'a EcPrivateKey,
    public: &'a EcPublicKey,
}

impl<'a> SecureMessage<'a> {
    /// Pair a private key with a peer public key.
    ///
    /// # Errors
    ///
    /// - [`MessageError::CurveMismatch`] if the keys live on different
    ///   curves
    pub fn new(private: &'a EcPrivateKey, public: &'a EcPublicKey) -> Result<Self, MessageError> {
        if private.curve() != public.curve() {
            return Err(MessageError::CurveMismatch {
                ours: private.curve(),
                theirs: public.curve(),
            });
        }
        Ok(Self { private, public })
    }

    /// Encrypt `data` for the peer.
    ///
    /// # Errors
    ///
    /// - [`MessageError::Cell`] if sealing fails (oversized payload or RNG
    ///   failure)
    pub fn wrap(&self, data: &[u8]) -> Result<Vec<u8>, MessageError> {
        let shared = self.shared_key();
        let sealed = cell::seal(&shared, data, &[])?;
        Ok(wire::encode_envelope(wire::TYPE_EC_ENCRYPTED, &sealed)?)
    }

    /// Decrypt a message produced by the peer's [`wrap`](Self::wrap).
    ///
    /// # Errors
    ///
    /// - [`MessageError::Envelope`] if the envelope framing is malformed
    /// - [`MessageError::UnexpectedType`] if the type tag is not
    ///   EC-encrypted
    /// - [`MessageError::Cell`] if authentication fails
    pub fn unwrap(&self, data: &[u8]) -> Result<Vec<u8>, MessageError> {
        let (message_type, body) = wire::decode_envelope(data)?;
        if message_type != wire::TYPE_EC_ENCRYPTED {
            return Err(MessageError::UnexpectedType { found: message_type });
        }
        let shared = self.shared_key();
        Ok(cell::open(&shared, body, &[])?)
    }

    /// ECDH shared key: the X coordinate at curve width.
    fn shared_key(&self) -> Zeroizing<Vec<u8>> {
        match (self.private, self.public) {
            (EcPrivateKey::P256(secret), EcPublicKey::P256(public)) => {
                let shared =
                    p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Zeroizing::new(shared.raw_secret_bytes().to_vec())
            }
            (EcPrivateKey::P384(secret), EcPublicKey::P384(public)) => {
                let shared =
                    p384::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Zeroizing::new(shared.raw_secret_bytes().to_vec())
            }
            (EcPrivateKey::P521(secret), EcPublicKey::P521(public)) => {
                let shared =
                    p521::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Zeroizing::new(shared.raw_secret_bytes().to_vec())
            }
            _ => unreachable!("curve equality is checked at construction"),
        }
    }
}

/// Sign `data`, producing a self-contained signed frame.
///
/// # Errors
///
/// - [`MessageError::Key`] if the ECDSA backend fails
/// - [`MessageError::Envelope`] if a section overflows its length field
pub fn sign(data: &[u8], private: &EcPrivateKey) -> Result<Vec<u8>, MessageError> {
    let signature = private.sign(data)?;
    Ok(wire::encode_signed(data, &signature)?)
}

/// Verify a signed frame and return the embedded payload.
///
/// # Errors
///
/// - [`MessageError::VerifyFailed`] for any defect: bad framing, wrong
///   type, or an ECDSA signature that does not verify
pub fn verify(data: &[u8], public: &EcPublicKey) -> Result<Vec<u8>, MessageError> {
    let (message, signature) = wire::decode_signed(data).map_err(|_| MessageError::VerifyFailed)?;
    if !public.verify(message, signature) {
        return Err(MessageError::VerifyFailed);
    }
    Ok(message.to_vec())
}

#[cfg(test)]
mod tests {
    use crate::keys::EcKeyPair;

    use super::*;

    fn keypairs(curve: EcCurve) -> (EcKeyPair, EcKeyPair) {
        (EcKeyPair::generate(curve).unwrap(), EcKeyPair::generate(curve).unwrap())
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let (alice, bob) = keypairs(EcCurve::P256);

        let wrapped =
            SecureMessage::new(&alice.private, &bob.public).unwrap().wrap(b"hello bob").unwrap();
        let opened =
            SecureMessage::new(&bob.private, &alice.public).unwrap().unwrap(&wrapped).unwrap();
        assert_eq!(opened, b"hello bob");
    }

    #[test]
    fn protocol_is_symmetric() {
        let (alice, bob) = keypairs(EcCurve::P384);

        let from_bob =
            SecureMessage::new(&bob.private, &alice.public).unwrap().wrap(b"hello alice").unwrap();
        let opened =
            SecureMessage::new(&alice.private, &bob.public).unwrap().unwrap(&from_bob).unwrap();
        assert_eq!(opened, b"hello alice");
    }

    #[test]
    fn envelope_header_layout() {
        let (alice, bob) = keypairs(EcCurve::P256);
        let wrapped =
            SecureMessage::new(&alice.private, &bob.public).unwrap().wrap(b"x").unwrap();

        assert_eq!(&wrapped[0..4], &wire::TYPE_EC_ENCRYPTED.to_le_bytes());
        assert_eq!(&wrapped[4..8], &(wrapped.len() as u32).to_le_bytes());
    }

    #[test]
    fn curve_mismatch_is_rejected() {
        let p256 = EcKeyPair::generate(EcCurve::P256).unwrap();
        let p384 = EcKeyPair::generate(EcCurve::P384).unwrap();

        let err = SecureMessage::new(&p256.private, &p384.public).unwrap_err();
        assert_eq!(
            err,
            MessageError::CurveMismatch { ours: EcCurve::P256, theirs: EcCurve::P384 }
        );
    }

    #[test]
    fn wrong_recipient_cannot_unwrap() {
        let (alice, bob) = keypairs(EcCurve::P256);
        let eve = EcKeyPair::generate(EcCurve::P256).unwrap();

        let wrapped =
            SecureMessage::new(&alice.private, &bob.public).unwrap().wrap(b"secret").unwrap();
        let result = SecureMessage::new(&eve.private, &alice.public).unwrap().unwrap(&wrapped);
        assert_eq!(result, Err(MessageError::Cell(CellError::AuthenticationFailed)));
    }

    #[test]
    fn length_lie_is_rejected_before_decryption() {
        let (alice, bob) = keypairs(EcCurve::P256);
        let mut wrapped =
            SecureMessage::new(&alice.private, &bob.public).unwrap().wrap(b"secret").unwrap();
        wrapped[4] = wrapped[4].wrapping_add(1);

        let result = SecureMessage::new(&bob.private, &alice.public).unwrap().unwrap(&wrapped);
        assert!(matches!(
            result,
            Err(MessageError::Envelope(ProtocolError::InvalidMessageLength { .. }))
        ));
    }

    #[test]
    fn signed_frame_type_is_rejected_by_unwrap() {
        let (alice, bob) = keypairs(EcCurve::P256);
        let signed = sign(b"data", &alice.private).unwrap();

        // A signed frame decodes as an envelope only by accident; either
        // error is acceptable, but it must not unwrap.
        let result = SecureMessage::new(&bob.private, &alice.public).unwrap().unwrap(&signed);
        assert!(result.is_err());
    }

    #[test]
    fn sign_verify_roundtrip() {
        let pair = EcKeyPair::generate(EcCurve::P256).unwrap();

        let signed = sign(b"signed payload", &pair.private).unwrap();
        assert_eq!(verify(&signed, &pair.public).unwrap(), b"signed payload");
    }

    #[test]
    fn signed_frame_layout() {
        let pair = EcKeyPair::generate(EcCurve::P256).unwrap();
        let signed = sign(b"test", &pair.private).unwrap();

        assert_eq!(&signed[0..4], &wire::TYPE_EC_SIGNED.to_le_bytes());
        assert_eq!(&signed[4..8], &4u32.to_le_bytes());
        let sig_len = u32::from_le_bytes(signed[8..12].try_into().unwrap()) as usize;
        assert_eq!(signed.len(), 12 + 4 + sig_len);
        assert_eq!(&signed[12..16], b"test");
    }

    #[test]
    fn any_flipped_byte_fails_verification() {
        let pair = EcKeyPair::generate(EcCurve::P256).unwrap();
        let signed = sign(b"payload", &pair.private).unwrap();

        for byte in 0..signed.len() {
            let mut corrupted = signed.clone();
            corrupted[byte] ^= 0x01;
            assert!(
                verify(&corrupted, &pair.public).is_err(),
                "flip at byte {byte} must not verify"
            );
        }
    }

    #[test]
    fn verify_with_wrong_key_fails() {
        let (alice, bob) = keypairs(EcCurve::P256);
        let signed = sign(b"payload", &alice.private).unwrap();

        assert_eq!(verify(&signed, &bob.public), Err(MessageError::VerifyFailed));
    }

    #[test]
    fn verify_rejects_truncated_frame() {
        let pair = EcKeyPair::generate(EcCurve::P256).unwrap();
        let mut signed = sign(b"payload", &pair.private).unwrap();
        signed.truncate(10);

        assert_eq!(verify(&signed, &pair.public), Err(MessageError::VerifyFailed));
    }
}
