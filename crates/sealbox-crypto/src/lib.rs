//! Sealbox cryptographic engine.
//!
//! Hybrid-encryption containers and single-shot secure messages over the
//! NIST prime curves, interoperable byte-for-byte with the Themis/Acra
//! wire formats. Framing lives in [`sealbox_proto`]; this crate owns key
//! material and the KDF/AEAD composition.
//!
//! # Composition
//!
//! Upper layers compose lower ones and never bypass them:
//!
//! ```text
//! AcraStruct ──► Secure Message (EC) ──► Secure Cell ──► Themis-KDF + AES-256-GCM
//!      │                │
//!      │                └── ECDH / ECDSA on P-256, P-384, P-521
//!      └── ephemeral keypair + random data key
//!
//! Session first frame ──► EC key containers + ECDSA
//! ```
//!
//! - [`cell`]: authenticated symmetric envelope with optional context
//!   (associated data bound into both the KDF and the AEAD)
//! - [`message`]: ECDH-encrypted and ECDSA-signed one-shot messages
//! - [`acrastruct`]: hybrid blob readable only by a designated key holder
//! - [`keys`]: curve-tagged key containers with CRC integrity
//! - [`session`]: the first handshake frame of a secure session
//!
//! # Secret hygiene
//!
//! Ephemeral material (derived cell keys, ECDH shared secrets, random data
//! keys, ephemeral scalars) is scoped to a single operation and wiped on
//! every exit path, success or failure. Long-term private keys are borrowed
//! by reference and never copied into outputs. The system CSPRNG is a
//! fail-fast dependency: a short read aborts the operation with
//! [`rng::RandomFailure`] before any partial result exists.
//!
//! # Concurrency
//!
//! Every operation is pure and synchronous apart from CSPRNG reads. There
//! is no shared mutable state; keys are immutable after construction, so
//! concurrent use from independent contexts is safe.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod acrastruct;
pub mod cell;
pub mod kdf;
pub mod keys;
pub mod message;
pub mod rng;
pub mod session;

pub use acrastruct::{create_acrastruct, decrypt_acrastruct, AcraStructError};
pub use cell::{open as cell_open, seal as cell_seal, CellError};
pub use keys::{EcCurve, EcKeyPair, EcPrivateKey, EcPublicKey, KeyError};
pub use message::{sign, verify, MessageError, SecureMessage};
pub use session::{SecureSession, SessionCallbacks, SessionError, SessionEvent};
