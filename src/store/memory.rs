//! Process-local secret store.
//!
//! Values are zeroized when replaced, deleted, or when the store is dropped.
//! Suitable for tests and for sessions that must not touch the disk.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use zeroize::Zeroizing;

use super::{SecretStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Zeroizing<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, Zeroizing<String>>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::OperationFailed("memory store lock poisoned".to_string()))
    }
}

impl SecretStore for MemoryStore {
    fn put(&self, name: &str, secret: &str) -> Result<(), StoreError> {
        self.entries()?
            .insert(name.to_string(), Zeroizing::new(secret.to_string()));
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<Zeroizing<String>>, StoreError> {
        Ok(self.entries()?.get(name).cloned())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.entries()?.remove(name);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        write!(f, "MemoryStore([REDACTED] {} entries)", count)
    }
}
