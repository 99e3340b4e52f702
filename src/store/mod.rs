//! Confidential storage for secret key material.
//!
//! The crypto core never decides where private keys live. Callers inject a
//! [`SecretStore`]: the OS keychain on desktop, an in-memory map in tests.
//! Secrets are handed out as [`Zeroizing`] strings and [`with_secret`]
//! scopes access so the in-memory copy is wiped as soon as the caller is
//! done with it.

#[cfg(feature = "keychain")]
pub mod keychain;
pub mod memory;

use thiserror::Error;
use zeroize::Zeroizing;

#[cfg(feature = "keychain")]
pub use keychain::KeychainStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No secret stored under {0}")]
    NotFound(String),
    #[error("Secret store operation failed: {0}")]
    OperationFailed(String),
    #[error("No OS keychain backend on this platform")]
    Unsupported,
}

/// Key-value store for secrets, addressed by name.
pub trait SecretStore: Send + Sync {
    /// Store `secret` under `name`, replacing any previous value.
    fn put(&self, name: &str, secret: &str) -> Result<(), StoreError>;

    /// Retrieve the secret under `name`.
    ///
    /// Returns `None` if nothing was stored.
    fn get(&self, name: &str) -> Result<Option<Zeroizing<String>>, StoreError>;

    /// Remove the secret under `name`. Idempotent.
    fn delete(&self, name: &str) -> Result<(), StoreError>;
}

/// Run `f` with the secret under `name`, then wipe the loaded copy.
///
/// The secret is only reachable inside the closure; it is zeroized when the
/// closure returns, whether it succeeded or not.
pub fn with_secret<S, T, E, F>(store: &S, name: &str, f: F) -> Result<T, E>
where
    S: SecretStore + ?Sized,
    E: From<StoreError>,
    F: FnOnce(&str) -> Result<T, E>,
{
    let secret = store
        .get(name)?
        .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
    f(secret.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_secret_passes_stored_value() {
        let store = MemoryStore::new();
        store.put("k", "value").unwrap();

        let len: Result<usize, StoreError> = with_secret(&store, "k", |s| Ok(s.len()));
        assert_eq!(len.unwrap(), 5);
    }

    #[test]
    fn with_secret_reports_missing_entry() {
        let store = MemoryStore::new();
        let result: Result<(), StoreError> = with_secret(&store, "absent", |_| Ok(()));
        assert!(matches!(result, Err(StoreError::NotFound(name)) if name == "absent"));
    }

    #[test]
    fn with_secret_propagates_closure_error() {
        let store = MemoryStore::new();
        store.put("k", "value").unwrap();

        let result: Result<(), StoreError> = with_secret(&store, "k", |_| {
            Err(StoreError::OperationFailed("boom".to_string()))
        });
        assert!(matches!(result, Err(StoreError::OperationFailed(_))));
    }

    #[test]
    fn works_through_trait_object() {
        let store: Box<dyn SecretStore> = Box::new(MemoryStore::new());
        store.put("k", "v").unwrap();
        let value: Result<String, StoreError> =
            with_secret(store.as_ref(), "k", |s| Ok(s.to_string()));
        assert_eq!(value.unwrap(), "v");
    }
}
