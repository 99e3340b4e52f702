//! Secure random source access.
//!
//! `OsRng` panics when the operating system cannot supply entropy. Every
//! caller goes through the fallible helpers here so that an unavailable
//! source surfaces as `CryptoError::RandomSourceUnavailable` instead.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use super::aes::{AES_IV_SIZE, AES_KEY_SIZE};
use super::error::CryptoError;

/// Fill `buf` from the OS secure random source.
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        log::error!("Secure random source unavailable: {}", e);
        CryptoError::RandomSourceUnavailable
    })
}

/// Generate a random 32-byte AES key.
pub fn generate_aes_key() -> Result<[u8; AES_KEY_SIZE], CryptoError> {
    let mut key = [0u8; AES_KEY_SIZE];
    fill_random(&mut key)?;
    Ok(key)
}

/// Generate a random 12-byte IV.
pub fn generate_iv() -> Result<[u8; AES_IV_SIZE], CryptoError> {
    let mut iv = [0u8; AES_IV_SIZE];
    fill_random(&mut iv)?;
    Ok(iv)
}

/// Check that the secure random source can produce bytes.
///
/// Key generation draws from `OsRng` through library code that cannot
/// report failure, so it draws a sample first.
pub fn ensure_random_source() -> Result<(), CryptoError> {
    let mut sample = [0u8; 16];
    fill_random(&mut sample)?;
    sample.zeroize();
    Ok(())
}

/// Zeroize sensitive data in a byte slice.
pub fn clear_bytes(buf: &mut [u8]) {
    buf.zeroize();
}
