//! EC key material and its wire containers.
//!
//! Keys live on one of the NIST prime curves and serialize into the tagged
//! CRC container of [`sealbox_proto::container`]:
//!
//! ```text
//! tag      "UEC2" public / "REC2" private ('3' = P-384, '5' = P-521)
//! size     u32 BE, inclusive of the 12-byte header
//! crc      u32 LE over the container with this field zeroed
//! body     public:  compressed SEC1 point (0x02/0x03 || X)
//!          private: one zero byte, then the scalar at curve width
//! ```
//!
//! The private body's leading zero byte is a historical artifact of the
//! wire format and is reproduced bit-exactly: private and public
//! containers of the same curve have equal lengths (45 bytes on P-256).
//!
//! Parsing accepts uncompressed (`0x04`) public bodies as well. All scalar
//! and coordinate widths come from the curve, so P-384 and P-521 keys
//! marshal the same way at their own widths.

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use elliptic_curve::sec1::ToEncodedPoint;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use sealbox_proto::container::{self, Container};
use sealbox_proto::ProtocolError;

use crate::rng::{self, RandomFailure};

/// Shared prefix of public-key tags.
const PUBLIC_TAG_PREFIX: [u8; 3] = *b"UEC";

/// Shared prefix of private-key tags.
const PRIVATE_TAG_PREFIX: [u8; 3] = *b"REC";

/// Errors from key generation, serialization, or use.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Container shorter than its header, or its size field disagrees with
    /// the buffer
    #[error("key container has incorrect length")]
    InvalidLength,

    /// Tag is not a recognized key prefix for the expected key kind
    #[error("unrecognized key tag {tag:02x?}")]
    InvalidTag {
        /// The four tag bytes found on the wire
        tag: [u8; 4],
    },

    /// CRC32 detected corruption in the container
    #[error("crc32 check detected corruption in key container")]
    InvalidCrc,

    /// Point has an unknown prefix, is off-curve, or has no square root
    #[error("invalid EC point encoding")]
    InvalidPoint,

    /// Private scalar is zero, out of range, or mis-sized
    #[error("private scalar out of range for curve")]
    InvalidScalar,

    /// The ECDSA backend refused to produce a signature
    #[error("ecdsa signing failed")]
    SigningFailed,

    /// The system CSPRNG failed during key generation
    #[error(transparent)]
    Random(#[from] RandomFailure),
}

/// The NIST prime curve a key lives on.
///
/// The curve fixes the byte width of scalars and coordinates and the final
/// tag byte of the key's wire container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    /// NIST P-256
    P256,
    /// NIST P-384
    P384,
    /// NIST P-521
    P521,
}

impl EcCurve {
    /// Byte width of a field element or scalar on this curve.
    #[must_use]
    pub const fn field_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// Final tag byte of this curve's key containers.
    #[must_use]
    pub const fn tag_suffix(self) -> u8 {
        match self {
            Self::P256 => b'2',
            Self::P384 => b'3',
            Self::P521 => b'5',
        }
    }

    /// Total marshalled container length, identical for both key kinds:
    /// header, one prefix/pad byte, and a field element.
    #[must_use]
    pub const fn container_len(self) -> usize {
        container::HEADER_LEN + 1 + self.field_len()
    }

    fn from_tag_suffix(suffix: u8) -> Option<Self> {
        match suffix {
            b'2' => Some(Self::P256),
            b'3' => Some(Self::P384),
            b'5' => Some(Self::P521),
            _ => None,
        }
    }
}

/// An EC public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcPublicKey {
    /// Public point on P-256
    P256(p256::PublicKey),
    /// Public point on P-384
    P384(p384::PublicKey),
    /// Public point on P-521
    P521(p521::PublicKey),
}

/// An EC private key.
///
/// The inner scalar is zeroized on drop by the backing curve
/// implementation. Byte-level copies made for serialization are wiped
/// before the marshal returns.
#[derive(Debug, Clone)]
pub enum EcPrivateKey {
    /// Secret scalar on P-256
    P256(p256::SecretKey),
    /// Secret scalar on P-384
    P384(p384::SecretKey),
    /// Secret scalar on P-521
    P521(p521::SecretKey),
}

/// A private key together with its public half.
#[derive(Debug, Clone)]
pub struct EcKeyPair {
    /// The private half
    pub private: EcPrivateKey,
    /// The matching public half
    pub public: EcPublicKey,
}

impl EcKeyPair {
    /// Generate a fresh keypair on the given curve.
    ///
    /// # Errors
    ///
    /// - [`KeyError::Random`] if the system CSPRNG fails
    pub fn generate(curve: EcCurve) -> Result<Self, KeyError> {
        let private = EcPrivateKey::generate(curve)?;
        let public = private.public_key();
        Ok(Self { private, public })
    }
}

impl EcPublicKey {
    /// The curve this key lives on.
    #[must_use]
    pub fn curve(&self) -> EcCurve {
        match self {
            Self::P256(_) => EcCurve::P256,
            Self::P384(_) => EcCurve::P384,
            Self::P521(_) => EcCurve::P521,
        }
    }

    /// Serialize into a tagged CRC container with a compressed point body.
    #[must_use]
    pub fn marshal(&self) -> Vec<u8> {
        let point = match self {
            Self::P256(key) => key.to_encoded_point(true).as_bytes().to_vec(),
            Self::P384(key) => key.to_encoded_point(true).as_bytes().to_vec(),
            Self::P521(key) => key.to_encoded_point(true).as_bytes().to_vec(),
        };
        let tag = make_tag(PUBLIC_TAG_PREFIX, self.curve());

        let Ok(out) = Container::encode_to_vec(tag, &point) else {
            unreachable!("a compressed point container always fits the u32 size field");
        };
        out
    }

    /// Parse a public key from its container form.
    ///
    /// Compressed (`0x02`/`0x03`) and uncompressed (`0x04`) bodies are both
    /// accepted; the point is validated to lie on the tagged curve.
    ///
    /// # Errors
    ///
    /// - [`KeyError::InvalidLength`] on truncation or size-field mismatch
    /// - [`KeyError::InvalidTag`] if the tag is not a public prefix with a
    ///   known curve suffix
    /// - [`KeyError::InvalidCrc`] if the checksum does not verify
    /// - [`KeyError::InvalidPoint`] if the body is not a valid point
    pub fn parse(buf: &[u8]) -> Result<Self, KeyError> {
        let (curve, body) = decode_key_container(buf, PUBLIC_TAG_PREFIX)?;
        match curve {
            EcCurve::P256 => p256::PublicKey::from_sec1_bytes(body)
                .map(Self::P256)
                .map_err(|_| KeyError::InvalidPoint),
            EcCurve::P384 => p384::PublicKey::from_sec1_bytes(body)
                .map(Self::P384)
                .map_err(|_| KeyError::InvalidPoint),
            EcCurve::P521 => p521::PublicKey::from_sec1_bytes(body)
                .map(Self::P521)
                .map_err(|_| KeyError::InvalidPoint),
        }
    }

    /// Verify a DER-encoded ECDSA signature over the SHA-256 digest of
    /// `message`.
    #[must_use = "a discarded verification result authenticates nothing"]
    pub fn verify(&self, message: &[u8], signature_der: &[u8]) -> bool {
        let digest: [u8; 32] = Sha256::digest(message).into();
        match self {
            Self::P256(key) => {
                let Ok(signature) = p256::ecdsa::Signature::from_der(signature_der) else {
                    return false;
                };
                p256::ecdsa::VerifyingKey::from(key).verify_prehash(&digest, &signature).is_ok()
            }
            Self::P384(key) => {
                let Ok(signature) = p384::ecdsa::Signature::from_der(signature_der) else {
                    return false;
                };
                p384::ecdsa::VerifyingKey::from(key)
                    .verify_prehash(&pad_digest::<48>(&digest), &signature)
                    .is_ok()
            }
            Self::P521(key) => {
                let Ok(signature) = p521::ecdsa::Signature::from_der(signature_der) else {
                    return false;
                };
                p521::ecdsa::VerifyingKey::from(ecdsa::VerifyingKey::<p521::NistP521>::from(key))
                    .verify_prehash(&pad_digest::<66>(&digest), &signature)
                    .is_ok()
            }
        }
    }
}

impl EcPrivateKey {
    /// The curve this key lives on.
    #[must_use]
    pub fn curve(&self) -> EcCurve {
        match self {
            Self::P256(_) => EcCurve::P256,
            Self::P384(_) => EcCurve::P384,
            Self::P521(_) => EcCurve::P521,
        }
    }

    /// Generate a fresh private key on the given curve.
    ///
    /// Candidate scalars are drawn from the system CSPRNG and tested
    /// against the curve order; out-of-range candidates are discarded and
    /// redrawn. P-521's order has a single significant bit in its top byte,
    /// so candidates are masked to that width first.
    ///
    /// # Errors
    ///
    /// - [`KeyError::Random`] if the system CSPRNG fails
    pub fn generate(curve: EcCurve) -> Result<Self, KeyError> {
        match curve {
            EcCurve::P256 => loop {
                let mut candidate = rng::random_bytes::<32>()?;
                let result = p256::SecretKey::from_slice(&candidate);
                candidate.zeroize();
                if let Ok(secret) = result {
                    return Ok(Self::P256(secret));
                }
            },
            EcCurve::P384 => loop {
                let mut candidate = rng::random_bytes::<48>()?;
                let result = p384::SecretKey::from_slice(&candidate);
                candidate.zeroize();
                if let Ok(secret) = result {
                    return Ok(Self::P384(secret));
                }
            },
            EcCurve::P521 => loop {
                let mut candidate = rng::random_bytes::<66>()?;
                candidate[0] &= 0x01;
                let result = p521::SecretKey::from_slice(&candidate);
                candidate.zeroize();
                if let Ok(secret) = result {
                    return Ok(Self::P521(secret));
                }
            },
        }
    }

    /// The public half of this key.
    #[must_use]
    pub fn public_key(&self) -> EcPublicKey {
        match self {
            Self::P256(key) => EcPublicKey::P256(key.public_key()),
            Self::P384(key) => EcPublicKey::P384(key.public_key()),
            Self::P521(key) => EcPublicKey::P521(key.public_key()),
        }
    }

    /// Serialize into a tagged CRC container.
    ///
    /// The body is one zero byte followed by the scalar at curve width; the
    /// temporary scalar copy is wiped before returning. The resulting
    /// buffer is itself key material and is the caller's to protect.
    #[must_use]
    pub fn marshal(&self) -> Vec<u8> {
        let curve = self.curve();
        let mut body = Zeroizing::new(vec![0u8; 1 + curve.field_len()]);
        match self {
            Self::P256(key) => {
                let mut scalar = key.to_bytes();
                body[1..].copy_from_slice(&scalar);
                scalar.as_mut_slice().zeroize();
            }
            Self::P384(key) => {
                let mut scalar = key.to_bytes();
                body[1..].copy_from_slice(&scalar);
                scalar.as_mut_slice().zeroize();
            }
            Self::P521(key) => {
                let mut scalar = key.to_bytes();
                body[1..].copy_from_slice(&scalar);
                scalar.as_mut_slice().zeroize();
            }
        }
        let tag = make_tag(PRIVATE_TAG_PREFIX, curve);

        let Ok(out) = Container::encode_to_vec(tag, &body) else {
            unreachable!("a scalar container always fits the u32 size field");
        };
        out
    }

    /// Parse a private key from its container form.
    ///
    /// # Errors
    ///
    /// - [`KeyError::InvalidLength`] on truncation, size-field mismatch, or
    ///   a body that is not `1 + field_len` bytes
    /// - [`KeyError::InvalidTag`] if the tag is not a private prefix with a
    ///   known curve suffix
    /// - [`KeyError::InvalidCrc`] if the checksum does not verify
    /// - [`KeyError::InvalidScalar`] if the scalar is zero or not below the
    ///   curve order
    pub fn parse(buf: &[u8]) -> Result<Self, KeyError> {
        let (curve, body) = decode_key_container(buf, PRIVATE_TAG_PREFIX)?;
        if body.len() != 1 + curve.field_len() {
            return Err(KeyError::InvalidLength);
        }
        let scalar = &body[1..];
        match curve {
            EcCurve::P256 => p256::SecretKey::from_slice(scalar)
                .map(Self::P256)
                .map_err(|_| KeyError::InvalidScalar),
            EcCurve::P384 => p384::SecretKey::from_slice(scalar)
                .map(Self::P384)
                .map_err(|_| KeyError::InvalidScalar),
            EcCurve::P521 => p521::SecretKey::from_slice(scalar)
                .map(Self::P521)
                .map_err(|_| KeyError::InvalidScalar),
        }
    }

    /// Produce a DER-encoded ECDSA signature over the SHA-256 digest of
    /// `message`.
    ///
    /// The digest is SHA-256 on every curve; on the wider curves it is
    /// left-zero-padded to the scalar width, which reads as the same
    /// big-endian integer the verification side derives from a short hash.
    ///
    /// # Errors
    ///
    /// - [`KeyError::SigningFailed`] if the backend rejects the operation
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        let digest: [u8; 32] = Sha256::digest(message).into();
        match self {
            Self::P256(key) => {
                let signing = p256::ecdsa::SigningKey::from(key);
                let signature: p256::ecdsa::Signature =
                    signing.sign_prehash(&digest).map_err(|_| KeyError::SigningFailed)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Self::P384(key) => {
                let signing = p384::ecdsa::SigningKey::from(key);
                let signature: p384::ecdsa::Signature = signing
                    .sign_prehash(&pad_digest::<48>(&digest))
                    .map_err(|_| KeyError::SigningFailed)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Self::P521(key) => {
                let signing = p521::ecdsa::SigningKey::from(ecdsa::SigningKey::<p521::NistP521>::from(key));
                let signature: p521::ecdsa::Signature = signing
                    .sign_prehash(&pad_digest::<66>(&digest))
                    .map_err(|_| KeyError::SigningFailed)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }
}

/// Left-zero-pad a 32-byte digest to a wider scalar width.
fn pad_digest<const N: usize>(digest: &[u8; 32]) -> [u8; N] {
    let mut padded = [0u8; N];
    padded[N - 32..].copy_from_slice(digest);
    padded
}

fn make_tag(prefix: [u8; 3], curve: EcCurve) -> [u8; 4] {
    [prefix[0], prefix[1], prefix[2], curve.tag_suffix()]
}

/// Validate a key container and return its curve and body.
///
/// Error precedence follows the wire contract: length of the header first,
/// then tag recognition, then size-field consistency, then the CRC.
fn decode_key_container(
    buf: &[u8],
    expected_prefix: [u8; 3],
) -> Result<(EcCurve, &[u8]), KeyError> {
    let tag = container::peek_tag(buf).map_err(|_| KeyError::InvalidLength)?;

    let curve = EcCurve::from_tag_suffix(tag[3]).ok_or(KeyError::InvalidTag { tag })?;
    if tag[..3] != expected_prefix {
        return Err(KeyError::InvalidTag { tag });
    }

    let parsed = Container::decode(buf).map_err(|err| match err {
        ProtocolError::CrcMismatch { .. } => KeyError::InvalidCrc,
        _ => KeyError::InvalidLength,
    })?;
    Ok((curve, parsed.body))
}
