//! RSA-OAEP with SHA-256 for one-to-one messages.
//!
//! Matches Web Crypto `RSA-OAEP` with `hash: "SHA-256"` and an empty label.
//! The message is encrypted directly under the recipient key, so its size is
//! bounded by the modulus: `k - 2 * 32 - 2` bytes (190 for 2048-bit keys).

use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use super::error::CryptoError;
use super::utils::ensure_random_source;

/// Default modulus size in bits.
pub const RSA_DEFAULT_BITS: usize = 2048;

/// Smallest modulus accepted for generation or import.
pub const RSA_MIN_BITS: usize = 2048;

/// Largest modulus accepted for generation or import.
pub const RSA_MAX_BITS: usize = 4096;

/// SHA-256 output size in bytes.
const OAEP_HASH_SIZE: usize = 32;

/// OAEP padding overhead: two hash lengths plus two bytes.
pub const OAEP_OVERHEAD: usize = 2 * OAEP_HASH_SIZE + 2;

/// Maximum plaintext bytes for a modulus of `modulus_bytes`.
pub fn max_payload_for(modulus_bytes: usize) -> usize {
    modulus_bytes.saturating_sub(OAEP_OVERHEAD)
}

/// Maximum plaintext bytes that `key` can encrypt.
pub fn max_payload(key: &RsaPublicKey) -> usize {
    max_payload_for(key.size())
}

/// Check that a modulus size is in the accepted range.
pub fn check_modulus_bits(bits: usize) -> Result<(), CryptoError> {
    if !(RSA_MIN_BITS..=RSA_MAX_BITS).contains(&bits) {
        return Err(CryptoError::KeyFormat(format!(
            "RSA modulus of {} bits outside accepted range {}..={}",
            bits, RSA_MIN_BITS, RSA_MAX_BITS
        )));
    }
    Ok(())
}

/// Generate an RSA private key of `bits` from the OS random source.
pub fn generate(bits: usize) -> Result<RsaPrivateKey, CryptoError> {
    check_modulus_bits(bits)?;
    ensure_random_source()?;

    RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| CryptoError::KeyGeneration(e.to_string()))
}

/// Encrypt `plaintext` for the holder of `key`.
pub fn encrypt(plaintext: &[u8], key: &RsaPublicKey) -> Result<Vec<u8>, CryptoError> {
    let max = max_payload(key);
    if plaintext.len() > max {
        return Err(CryptoError::PayloadTooLarge {
            len: plaintext.len(),
            max,
        });
    }

    ensure_random_source()?;
    key.encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| match e {
            rsa::Error::MessageTooLong => CryptoError::PayloadTooLarge {
                len: plaintext.len(),
                max,
            },
            other => CryptoError::KeyFormat(other.to_string()),
        })
}

/// Decrypt `ciphertext` with the recipient's private key.
///
/// The private-key operation is blinded with fresh randomness, since the
/// ciphertext is attacker controlled. Every failure (wrong key, wrong
/// length, bad padding) maps to `CryptoError::Decryption`.
pub fn decrypt(ciphertext: &[u8], key: &RsaPrivateKey) -> Result<Vec<u8>, CryptoError> {
    ensure_random_source()?;
    key.decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::tests::{other_pair, shared_pair};

    #[test]
    fn payload_limit_for_common_sizes() {
        assert_eq!(max_payload_for(256), 190);
        assert_eq!(max_payload_for(384), 318);
        assert_eq!(max_payload_for(512), 446);
        assert_eq!(max_payload_for(10), 0);
    }

    #[test]
    fn modulus_range_is_enforced() {
        assert!(check_modulus_bits(1024).is_err());
        assert!(check_modulus_bits(2048).is_ok());
        assert!(check_modulus_bits(4096).is_ok());
        assert!(check_modulus_bits(8192).is_err());
    }

    #[test]
    fn blinded_decrypt_roundtrip() {
        let pair = shared_pair();
        let sealed = encrypt(b"blinded", pair.public_key().rsa()).unwrap();
        assert_eq!(decrypt(&sealed, pair.private_key().rsa()).unwrap(), b"blinded");
    }

    #[test]
    fn blinded_decrypt_with_wrong_key_fails() {
        let sealed = encrypt(b"blinded", shared_pair().public_key().rsa()).unwrap();
        assert!(matches!(
            decrypt(&sealed, other_pair().private_key().rsa()),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn generate_rejects_weak_modulus() {
        assert!(matches!(generate(1024), Err(CryptoError::KeyFormat(_))));
    }
}
