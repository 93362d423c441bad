use std::collections::HashMap;
use std::sync::Mutex;

use super::{KeyStore, StoreError};

/// Ephemeral key storage for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryKeyStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn save(&self, label: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(label.to_string(), bytes.to_vec());
        Ok(())
    }

    fn load(&self, label: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().unwrap().get(label).cloned())
    }

    fn delete(&self, label: &str) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(label);
        Ok(())
    }
}
