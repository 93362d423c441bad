pub mod memory;
pub mod sealed;

pub use memory::MemoryKeyStore;
pub use sealed::SealedFileStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encrypt: {0}")]
    Encryption(String),
    #[error("Corrupt: {0}")]
    Corrupt(String),
}

/// Secure key storage seam. On-device this is backed by the platform
/// keychain; this crate ships an in-memory store and an AES-256-GCM
/// sealed file store.
pub trait KeyStore: Send + Sync {
    fn save(&self, label: &str, bytes: &[u8]) -> Result<(), StoreError>;
    fn load(&self, label: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn delete(&self, label: &str) -> Result<(), StoreError>;
}

impl<T: KeyStore + ?Sized> KeyStore for &T {
    fn save(&self, label: &str, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).save(label, bytes)
    }
    fn load(&self, label: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load(label)
    }
    fn delete(&self, label: &str) -> Result<(), StoreError> {
        (**self).delete(label)
    }
}

impl<T: KeyStore + ?Sized> KeyStore for std::sync::Arc<T> {
    fn save(&self, label: &str, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).save(label, bytes)
    }
    fn load(&self, label: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load(label)
    }
    fn delete(&self, label: &str) -> Result<(), StoreError> {
        (**self).delete(label)
    }
}
