//! Key generation, export and import.
//!
//! Asymmetric keys are RSA with OAEP/SHA-256. Public keys export as SPKI DER,
//! private keys as PKCS#8 DER, symmetric keys as their raw 32 bytes. All
//! exports are base64 text via [`codec`](super::codec).
//!
//! TRUST MODEL: the exported private key is the weakest point of the scheme.
//! Whoever holds that string can read every message sent to the identity, so
//! it must only ever land in confidential local storage (see
//! [`crate::store`]) and never be sent to a server.

use std::fmt;

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::aes::AES_KEY_SIZE;
use super::codec;
use super::error::CryptoError;
use super::rsa_oaep::{self, RSA_DEFAULT_BITS};
use super::utils::generate_aes_key;

/// Exported public key: base64 of the SPKI DER encoding.
///
/// Non-secret. Stored next to the user record and next to every message
/// encrypted with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedKey(String);

impl EncodedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for EncodedKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EncodedKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for EncodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public half of a key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    pub(crate) fn rsa(&self) -> &RsaPublicKey {
        &self.0
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }
}

/// Private half of a key pair. Zeroized on drop by the `rsa` crate.
#[derive(Clone)]
pub struct PrivateKey(RsaPrivateKey);

impl PrivateKey {
    pub(crate) fn rsa(&self) -> &RsaPrivateKey {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey([REDACTED] {} bits)", self.0.size() * 8)
    }
}

/// Linked public and private keys of one identity.
///
/// Only constructed by generation or by importing a private key, where the
/// public half is derived from the private one. A private key can therefore
/// never sit next to a public key from another generation.
#[derive(Debug, Clone)]
pub struct KeyPair {
    public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    fn from_private(private: RsaPrivateKey) -> Self {
        Self {
            public: PublicKey(private.to_public_key()),
            private: PrivateKey(private),
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn export_public_key(&self) -> Result<EncodedKey, CryptoError> {
        export_public_key(&self.public)
    }
}

/// Shared AES-256 key of one group conversation.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; AES_KEY_SIZE]);

impl SymmetricKey {
    pub(crate) fn bytes(&self) -> &[u8; AES_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        // Not constant time.
        self.0 == other.0
    }
}

/// Generate a fresh 2048-bit key pair.
pub fn generate_key_pair() -> Result<KeyPair, CryptoError> {
    generate_key_pair_with_bits(RSA_DEFAULT_BITS)
}

/// Generate a fresh key pair with a modulus of `bits` (2048 to 4096).
pub fn generate_key_pair_with_bits(bits: usize) -> Result<KeyPair, CryptoError> {
    let private = rsa_oaep::generate(bits)?;
    let pair = KeyPair::from_private(private);
    log::info!(
        "Generated {}-bit key pair {}",
        bits,
        fingerprint(pair.public_key())
    );
    Ok(pair)
}

/// Generate a key pair on the blocking thread pool.
///
/// RSA generation takes long enough to stall an async executor or a UI
/// thread, so async callers should use this instead of
/// [`generate_key_pair_with_bits`].
pub async fn generate_key_pair_in_background(bits: usize) -> Result<KeyPair, CryptoError> {
    tokio::task::spawn_blocking(move || generate_key_pair_with_bits(bits))
        .await
        .map_err(|e| CryptoError::Background(e.to_string()))?
}

/// Export a public key as base64 SPKI DER.
pub fn export_public_key(key: &PublicKey) -> Result<EncodedKey, CryptoError> {
    let der = key
        .0
        .to_public_key_der()
        .map_err(|e| CryptoError::KeyFormat(e.to_string()))?;
    Ok(EncodedKey(codec::encode(der.as_bytes())))
}

/// Export the private half of `pair` as base64 PKCS#8 DER.
///
/// The result is secret. The returned string is wiped when dropped.
pub fn export_private_key(pair: &KeyPair) -> Result<Zeroizing<String>, CryptoError> {
    let der = pair
        .private
        .0
        .to_pkcs8_der()
        .map_err(|e| CryptoError::KeyFormat(e.to_string()))?;
    Ok(Zeroizing::new(codec::encode(der.as_bytes())))
}

/// Import a public key exported by [`export_public_key`].
pub fn import_public_key(encoded: &str) -> Result<PublicKey, CryptoError> {
    let der = codec::decode(encoded)?;
    let key = RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| CryptoError::KeyFormat(e.to_string()))?;
    rsa_oaep::check_modulus_bits(key.size() * 8)?;
    Ok(PublicKey(key))
}

/// Import a private key exported by [`export_private_key`].
///
/// Returns the full pair; the public half is derived from the private key.
pub fn import_private_key(encoded: &str) -> Result<KeyPair, CryptoError> {
    let der = Zeroizing::new(codec::decode(encoded)?);
    let key = RsaPrivateKey::from_pkcs8_der(&der)
        .map_err(|e| CryptoError::KeyFormat(e.to_string()))?;
    rsa_oaep::check_modulus_bits(key.size() * 8)?;
    key.validate()
        .map_err(|e| CryptoError::KeyFormat(e.to_string()))?;
    Ok(KeyPair::from_private(key))
}

/// Generate a fresh symmetric key for a group conversation.
pub fn generate_symmetric_key() -> Result<SymmetricKey, CryptoError> {
    Ok(SymmetricKey(generate_aes_key()?))
}

/// Export a symmetric key as base64 of its raw bytes. Secret.
pub fn export_symmetric_key(key: &SymmetricKey) -> Zeroizing<String> {
    Zeroizing::new(codec::encode(&key.0))
}

/// Import a symmetric key exported by [`export_symmetric_key`].
pub fn import_symmetric_key(encoded: &str) -> Result<SymmetricKey, CryptoError> {
    let raw = Zeroizing::new(codec::decode(encoded)?);
    let bytes: [u8; AES_KEY_SIZE] = raw.as_slice().try_into().map_err(|_| {
        CryptoError::KeyFormat(format!(
            "symmetric key must be {} bytes, got {}",
            AES_KEY_SIZE,
            raw.len()
        ))
    })?;
    Ok(SymmetricKey(bytes))
}

/// Short fingerprint of a public key, formatted `XXXX-XXXX-XXXX-XXXX`.
///
/// First 8 bytes of SHA-256 over the SPKI DER. Safe to log.
pub fn fingerprint(key: &PublicKey) -> String {
    let der = match key.0.to_public_key_der() {
        Ok(der) => der,
        Err(_) => return "????-????-????-????".to_string(),
    };
    let hash = Sha256::digest(der.as_bytes());
    let hex = hex::encode_upper(&hash[..8]);
    format!(
        "{}-{}-{}-{}",
        &hex[0..4],
        &hex[4..8],
        &hex[8..12],
        &hex[12..16]
    )
}
