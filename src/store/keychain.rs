//! OS keychain backed secret store.
//!
//! Uses the `keyring` crate: the Keychain on macOS and iOS, the Credential
//! Manager on Windows. On any other target `keyring` only offers an
//! in-process mock that forgets every secret once its entry is dropped, so
//! every operation fails with [`StoreError::Unsupported`] there instead of
//! pretending to persist.

use keyring::Entry;
use zeroize::Zeroizing;

use super::{SecretStore, StoreError};
use crate::config::DEFAULT_SERVICE_NAME;

/// Whether `keyring` is built with a persistent backend for this target.
pub const NATIVE_BACKEND: bool = cfg!(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "windows"
));

impl From<keyring::Error> for StoreError {
    fn from(err: keyring::Error) -> Self {
        StoreError::OperationFailed(err.to_string())
    }
}

/// Secret store writing one keychain entry per secret name.
#[derive(Debug, Clone)]
pub struct KeychainStore {
    service: String,
}

impl KeychainStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, name: &str) -> Result<Entry, StoreError> {
        if !NATIVE_BACKEND {
            return Err(StoreError::Unsupported);
        }
        Ok(Entry::new(&self.service, name)?)
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl SecretStore for KeychainStore {
    fn put(&self, name: &str, secret: &str) -> Result<(), StoreError> {
        self.entry(name)?.set_password(secret)?;
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<Zeroizing<String>>, StoreError> {
        match self.entry(name)?.get_password() {
            Ok(secret) => Ok(Some(Zeroizing::new(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        match self.entry(name)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted, idempotent
            Err(e) => Err(StoreError::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_app_service_name() {
        assert_eq!(KeychainStore::default().service(), DEFAULT_SERVICE_NAME);
    }

    #[test]
    fn custom_service_name() {
        assert_eq!(KeychainStore::new("test.service").service(), "test.service");
    }

    #[test]
    #[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "windows")))]
    fn without_native_backend_every_operation_fails() {
        let store = KeychainStore::new("com.sealedchat.test");
        assert!(matches!(
            store.put("identity:test", "secret"),
            Err(StoreError::Unsupported)
        ));
        assert!(matches!(
            store.get("identity:test"),
            Err(StoreError::Unsupported)
        ));
        assert!(matches!(
            store.delete("identity:test"),
            Err(StoreError::Unsupported)
        ));
    }

    #[test]
    #[cfg_attr(
        not(any(target_os = "macos", target_os = "ios", target_os = "windows")),
        ignore = "no OS keychain on this platform"
    )]
    fn secret_survives_separate_entries() {
        let store = KeychainStore::new("com.sealedchat.test");
        let name = "identity:keychain-roundtrip";

        store.put(name, "persisted").unwrap();
        // A fresh store instance opens a new keyring entry
        let reread = KeychainStore::new("com.sealedchat.test").get(name).unwrap();
        assert_eq!(reread.as_deref().map(String::as_str), Some("persisted"));

        store.delete(name).unwrap();
        assert!(store.get(name).unwrap().is_none());
    }
}
