//! AES-256-GCM sealing for group messages.
//!
//! Sealed format: IV (12 bytes) || Ciphertext || Auth Tag (16 bytes)
//! Same layout as Web Crypto `AES-GCM` output prefixed with its IV.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};

use super::error::CryptoError;
use super::utils::generate_iv;

/// AES-256-GCM key size in bytes (256 bits).
pub const AES_KEY_SIZE: usize = 32;

/// AES-GCM IV size in bytes (96 bits).
pub const AES_IV_SIZE: usize = 12;

/// AES-GCM authentication tag size in bytes (128 bits).
pub const AES_TAG_SIZE: usize = 16;

/// Minimum sealed data size: IV + auth tag (empty plaintext).
pub const MIN_SEALED_SIZE: usize = AES_IV_SIZE + AES_TAG_SIZE;

/// Seal data with a fresh random IV.
///
/// Every call draws a new IV, so sealing the same plaintext twice under the
/// same key yields different output.
pub fn seal(plaintext: &[u8], key: &[u8; AES_KEY_SIZE]) -> Result<Vec<u8>, CryptoError> {
    let iv = generate_iv()?;
    let cipher = Aes256Gcm::new(key.into());

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(seal_error)?;

    // IV || ciphertext (which already includes the tag)
    let mut sealed = Vec::with_capacity(AES_IV_SIZE + ciphertext.len());
    sealed.extend_from_slice(&iv);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// GCM only refuses to encrypt beyond its 2^36 - 32 byte plaintext limit.
fn seal_error(_: aes_gcm::Error) -> CryptoError {
    CryptoError::Encryption
}

/// Unseal data produced by [`seal`].
///
/// Extracts the IV from the first 12 bytes and decrypts the remainder.
/// Truncated input, a wrong key and a modified byte all fail the same way.
pub fn unseal(sealed: &[u8], key: &[u8; AES_KEY_SIZE]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < MIN_SEALED_SIZE {
        return Err(CryptoError::Decryption);
    }

    let (iv, ciphertext) = sealed.split_at(AES_IV_SIZE);
    let cipher = Aes256Gcm::new(key.into());

    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}
