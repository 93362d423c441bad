use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use p256::ecdsa::signature::{Signer as _, Verifier as _};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::sync::Mutex;

use super::address::derive_address;
use super::message::{fresh_nonce, SignedMessage};
use crate::keystore::{KeyStore, StoreError};

/// Key-store label the active private scalar is persisted under.
pub const KEY_LABEL: &str = "wingseal-p256";

pub const PUBLIC_KEY_LEN: usize = 65;
pub const UNCOMPRESSED_TAG: u8 = 0x04;

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("no private key loaded")]
    NoPrivateKey,
    #[error("no public key available")]
    NoPublicKey,
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
    #[error("signing failed: {0}")]
    SigningFailure(String),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

/// Owns the account's P-256 keypair.
///
/// Explicitly constructed (no process-wide singleton) so tests can run
/// independent keypairs side by side. The active key sits behind one
/// mutex: generate/import/sign serialize, and a sign can never observe a
/// half-replaced key.
pub struct Signer<S: KeyStore> {
    store: S,
    key: Mutex<Option<SigningKey>>,
}

impl<S: KeyStore> Signer<S> {
    /// Construct over a key store, reloading a previously persisted key
    /// if one exists.
    pub fn new(store: S) -> Result<Self, SignerError> {
        let key = match store.load(KEY_LABEL)? {
            Some(scalar) => Some(
                SigningKey::from_slice(&scalar)
                    .map_err(|e| SignerError::InvalidKeyFormat(e.to_string()))?,
            ),
            None => None,
        };
        if key.is_some() {
            tracing::debug!("persisted keypair loaded");
        }
        Ok(Self {
            store,
            key: Mutex::new(key),
        })
    }

    /// Generate a fresh random keypair, persist it, and return the public
    /// point. Replaces any existing key.
    pub fn generate_keypair(&self) -> Result<[u8; PUBLIC_KEY_LEN], SignerError> {
        let key = SigningKey::random(&mut OsRng);
        self.store.save(KEY_LABEL, &key.to_bytes())?;
        let public = public_point(&key);
        *self.key.lock().unwrap() = Some(key);
        tracing::info!(address = derive_address(&public), "keypair generated");
        Ok(public)
    }

    /// Import a base64-encoded 32-byte private scalar. Replaces any
    /// existing key.
    pub fn import_private_key(&self, encoded: &str) -> Result<[u8; PUBLIC_KEY_LEN], SignerError> {
        let scalar = BASE64
            .decode(encoded.trim())
            .map_err(|e| SignerError::InvalidKeyFormat(e.to_string()))?;
        let key = SigningKey::from_slice(&scalar)
            .map_err(|e| SignerError::InvalidKeyFormat(e.to_string()))?;
        self.store.save(KEY_LABEL, &key.to_bytes())?;
        let public = public_point(&key);
        *self.key.lock().unwrap() = Some(key);
        tracing::info!(address = derive_address(&public), "keypair imported");
        Ok(public)
    }

    /// Base64 of the private scalar, or `None` when no key is set.
    /// Callers own the "this is sensitive" warning to the user.
    pub fn export_private_key(&self) -> Option<String> {
        let guard = self.key.lock().unwrap();
        guard.as_ref().map(|key| BASE64.encode(key.to_bytes()))
    }

    /// The 65-byte uncompressed public point, if a key is set.
    pub fn public_key(&self) -> Option<[u8; PUBLIC_KEY_LEN]> {
        let guard = self.key.lock().unwrap();
        guard.as_ref().map(public_point)
    }

    /// Deterministic account address for the current public key.
    pub fn address(&self) -> Option<String> {
        self.public_key().map(|pk| derive_address(&pk))
    }

    pub fn has_key(&self) -> bool {
        self.key.lock().unwrap().is_some()
    }

    /// Destroy the active keypair and its persisted copy (account reset).
    pub fn clear(&self) -> Result<(), SignerError> {
        let mut guard = self.key.lock().unwrap();
        self.store.delete(KEY_LABEL)?;
        *guard = None;
        tracing::info!("keypair destroyed");
        Ok(())
    }

    /// DER-encoded ECDSA/P-256 signature over SHA-256 of `data`.
    pub fn sign_bytes(&self, data: &[u8]) -> Result<Vec<u8>, SignerError> {
        let guard = self.key.lock().unwrap();
        let key = guard.as_ref().ok_or(SignerError::NoPrivateKey)?;
        let signature: Signature = key
            .try_sign(data)
            .map_err(|e| SignerError::SigningFailure(e.to_string()))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    /// Sign an application message string.
    pub fn sign_message(&self, message: &str) -> Result<Vec<u8>, SignerError> {
        self.sign_bytes(message.as_bytes())
    }

    /// Build and sign a replay-resistant [`SignedMessage`] for `action`:
    /// fresh timestamp and nonce, signature over their concatenation.
    pub fn sign_action(&self, action: &str) -> Result<SignedMessage, SignerError> {
        let timestamp = chrono::Utc::now().timestamp();
        let nonce = fresh_nonce();
        let payload = format!("{action}{timestamp}{nonce}");
        let signature = self.sign_message(&payload)?;
        tracing::debug!(action, timestamp, nonce, "message signed");
        Ok(SignedMessage {
            action: action.to_string(),
            timestamp,
            nonce,
            signature,
        })
    }
}

fn public_point(key: &SigningKey) -> [u8; PUBLIC_KEY_LEN] {
    key.verifying_key()
        .to_encoded_point(false)
        .as_bytes()
        .try_into()
        .expect("uncompressed P-256 point is 65 bytes")
}

/// Check a DER signature over SHA-256 of `message` against a 65-byte
/// uncompressed public key. Never errors; any malformed input is `false`,
/// and the key shape is rejected before any cryptographic work.
pub fn verify_signature(signature: &[u8], message: &[u8], public_key: &[u8]) -> bool {
    if public_key.len() != PUBLIC_KEY_LEN || public_key[0] != UNCOMPRESSED_TAG {
        return false;
    }
    let verifying_key = match VerifyingKey::from_sec1_bytes(public_key) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let signature = match Signature::from_der(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    verifying_key.verify(message, &signature).is_ok()
}
