use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use std::path::PathBuf;

use super::{KeyStore, StoreError};

const NONCE_LEN: usize = 12;

/// File-backed key storage sealed with AES-256-GCM.
///
/// One file per label under `dir`, laid out as `nonce(12) || ciphertext`.
/// Labels become file names directly, so they must be path-safe; every
/// label this crate uses is.
pub struct SealedFileStore {
    aes_key: [u8; 32],
    dir: PathBuf,
}

impl SealedFileStore {
    pub fn new(aes_key: [u8; 32], dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { aes_key, dir })
    }

    fn path(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}.bin"))
    }
}

impl KeyStore for SealedFileStore {
    fn save(&self, label: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(&self.aes_key)
            .map_err(|e| StoreError::Encryption(e.to_string()))?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), bytes)
            .map_err(|e| StoreError::Encryption(e.to_string()))?;

        let mut file_bytes = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        file_bytes.extend_from_slice(&nonce_bytes);
        file_bytes.extend_from_slice(&ciphertext);

        std::fs::write(self.path(label), file_bytes)?;
        Ok(())
    }

    fn load(&self, label: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path(label);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.len() < NONCE_LEN {
            return Err(StoreError::Corrupt("file too short".into()));
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new_from_slice(&self.aes_key)
            .map_err(|e| StoreError::Encryption(e.to_string()))?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| StoreError::Encryption(e.to_string()))?;

        Ok(Some(plaintext))
    }

    fn delete(&self, label: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path(label)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
