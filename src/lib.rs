//! Cryptographic identity and content-attestation core of a mobile
//! social client: P-256 keypair lifecycle with a chain-style account
//! address, detached message signatures, WebAuthn/passkey assertion
//! verification (including the CBOR/COSE path that digs the public key
//! out of an attestation object), and tamper-evident photo attestation.
//!
//! The core performs no I/O of its own beyond the [`keystore`] seam and
//! is callable from any thread; the keypair is the only shared mutable
//! state and is serialized internally.

pub mod cbor;
pub mod config;
pub mod error;
pub mod keystore;
pub mod photo;
pub mod signer;
pub mod webauthn;

pub(crate) mod encoding;

pub use error::{Error, Result};
pub use keystore::{KeyStore, MemoryKeyStore, SealedFileStore};
pub use photo::{sign_photo, verify_photo, PhotoAttestation, VerificationResult, VerifyFailure};
pub use signer::{derive_address, verify_signature, SignedMessage, Signer};
pub use webauthn::{extract_p256_public_key, verify_assertion, PasskeyBridge};
