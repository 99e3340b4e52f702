//! Per-user key material for one session.
//!
//! An [`Identity`] is created or loaded by the calling layer and passed into
//! whatever needs it. There is no process-wide "current user". The caller
//! owns its lifetime, and dropping it wipes the private keys.
//!
//! Rotation keeps the previous key pairs. Messages record the public key
//! they were encrypted with, so a rotated identity can still read its
//! history.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{
    self, export_private_key, fingerprint, generate_key_pair_with_bits, import_private_key,
    import_public_key, CryptoError, EncodedKey, KeyPair,
};
use crate::store::{self, SecretStore, StoreError};

/// Persisted record format version.
const RECORD_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Identity record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Stored identity is corrupt: {0}")]
    Corrupt(String),
}

/// Secret-store record. Holds exported private keys, wiped on drop.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
struct IdentityRecord {
    version: u32,
    current: String,
    #[serde(default)]
    retired: Vec<String>,
}

/// Key pairs of one user: the current pair plus every pair it replaced.
#[derive(Debug)]
pub struct Identity {
    user_id: String,
    current: KeyPair,
    /// Oldest first.
    retired: Vec<KeyPair>,
}

impl Identity {
    /// Start an identity from an existing key pair.
    pub fn new(user_id: impl Into<String>, key_pair: KeyPair) -> Self {
        Self {
            user_id: user_id.into(),
            current: key_pair,
            retired: Vec::new(),
        }
    }

    /// Start an identity with a freshly generated key pair.
    pub fn generate(user_id: impl Into<String>, bits: usize) -> Result<Self, CryptoError> {
        let user_id = user_id.into();
        let pair = generate_key_pair_with_bits(bits)?;
        log::info!("Created identity for user {}", user_id);
        Ok(Self::new(user_id, pair))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn current(&self) -> &KeyPair {
        &self.current
    }

    pub fn retired(&self) -> &[KeyPair] {
        &self.retired
    }

    /// The public key to publish for this user.
    pub fn public_key(&self) -> Result<EncodedKey, CryptoError> {
        self.current.export_public_key()
    }

    /// Replace the current pair with a freshly generated one.
    ///
    /// Returns the new public key; the caller must publish it so that senders
    /// stop using the old one.
    pub fn rotate(&mut self, bits: usize) -> Result<EncodedKey, CryptoError> {
        let pair = generate_key_pair_with_bits(bits)?;
        self.rotate_to(pair)
    }

    /// Replace the current pair with `pair` (e.g. one generated in the
    /// background) and retire the old one.
    pub fn rotate_to(&mut self, pair: KeyPair) -> Result<EncodedKey, CryptoError> {
        let published = pair.export_public_key()?;
        let old = std::mem::replace(&mut self.current, pair);
        log::info!(
            "Rotated identity {}: {} -> {}",
            self.user_id,
            fingerprint(old.public_key()),
            fingerprint(self.current.public_key())
        );
        self.retired.push(old);
        Ok(published)
    }

    /// Decrypt a message addressed to this identity.
    ///
    /// With `key_used` (the public key recorded next to the message) the
    /// matching pair is selected directly, current or retired. Without it,
    /// pairs are tried newest first.
    pub fn decrypt(
        &self,
        ciphertext: &str,
        key_used: Option<&EncodedKey>,
    ) -> Result<String, CryptoError> {
        match key_used {
            Some(encoded) => {
                let public = import_public_key(encoded.as_str())?;
                let pair = self
                    .pairs_newest_first()
                    .find(|pair| pair.public_key() == &public)
                    .ok_or_else(|| {
                        log::warn!(
                            "Message for {} was encrypted with unknown key {}",
                            self.user_id,
                            fingerprint(&public)
                        );
                        CryptoError::Decryption
                    })?;
                crypto::decrypt(ciphertext, pair.private_key())
            }
            None => {
                for pair in self.pairs_newest_first() {
                    match crypto::decrypt(ciphertext, pair.private_key()) {
                        Err(CryptoError::Decryption) => continue,
                        other => return other,
                    }
                }
                Err(CryptoError::Decryption)
            }
        }
    }

    /// Drop the retired pair whose public key is `key`.
    ///
    /// Messages encrypted with that key become unreadable. Returns whether a
    /// pair was removed; the current pair is never touched.
    pub fn remove_retired(&mut self, key: &EncodedKey) -> Result<bool, CryptoError> {
        let public = import_public_key(key.as_str())?;
        let before = self.retired.len();
        self.retired.retain(|pair| pair.public_key() != &public);
        let removed = self.retired.len() != before;
        if removed {
            log::info!(
                "Removed retired key {} from identity {}",
                fingerprint(&public),
                self.user_id
            );
        }
        Ok(removed)
    }

    /// Keep only the `keep` most recently retired pairs.
    ///
    /// Returns the number of pairs dropped.
    pub fn prune_retired(&mut self, keep: usize) -> usize {
        let excess = self.retired.len().saturating_sub(keep);
        self.retired.drain(..excess);
        if excess > 0 {
            log::info!(
                "Pruned {} retired key pairs from identity {}",
                excess,
                self.user_id
            );
        }
        excess
    }

    fn pairs_newest_first(&self) -> impl Iterator<Item = &KeyPair> {
        std::iter::once(&self.current).chain(self.retired.iter().rev())
    }

    /// Persist all key pairs into `store`.
    pub fn save<S: SecretStore + ?Sized>(&self, store: &S) -> Result<(), IdentityError> {
        let record = IdentityRecord {
            version: RECORD_VERSION,
            current: export_private_key(&self.current)?.to_string(),
            retired: self
                .retired
                .iter()
                .map(|pair| export_private_key(pair).map(|s| s.to_string()))
                .collect::<Result<_, _>>()?,
        };
        let json = Zeroizing::new(serde_json::to_string(&record)?);
        store.put(&secret_name(&self.user_id), &json)?;
        log::info!(
            "Saved identity {} ({} retired key pairs)",
            self.user_id,
            self.retired.len()
        );
        Ok(())
    }

    /// Load the identity of `user_id` from `store`.
    ///
    /// Returns `None` if nothing was saved for this user.
    pub fn load<S: SecretStore + ?Sized>(
        store: &S,
        user_id: &str,
    ) -> Result<Option<Self>, IdentityError> {
        let loaded = store::with_secret(store, &secret_name(user_id), |json| {
            let record: IdentityRecord = serde_json::from_str(json)?;
            if record.version != RECORD_VERSION {
                return Err(IdentityError::Corrupt(format!(
                    "unsupported record version {}",
                    record.version
                )));
            }

            let current = import_private_key(&record.current)?;
            let retired = record
                .retired
                .iter()
                .map(|encoded| import_private_key(encoded))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Self {
                user_id: user_id.to_string(),
                current,
                retired,
            })
        });

        match loaded {
            Ok(identity) => {
                log::info!("Loaded identity {}", user_id);
                Ok(Some(identity))
            }
            Err(IdentityError::Store(StoreError::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove the saved identity of `user_id` from `store`.
    pub fn forget<S: SecretStore + ?Sized>(store: &S, user_id: &str) -> Result<(), IdentityError> {
        store.delete(&secret_name(user_id))?;
        log::info!("Forgot identity {}", user_id);
        Ok(())
    }
}

fn secret_name(user_id: &str) -> String {
    format!("identity:{}", user_id)
}
