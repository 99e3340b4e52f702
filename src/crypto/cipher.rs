//! Message encryption over text.
//!
//! Plaintext goes in as a UTF-8 string and ciphertext comes out as base64,
//! ready for a text column or a JSON field.

use super::aes;
use super::codec;
use super::error::CryptoError;
use super::keys::{fingerprint, PrivateKey, PublicKey, SymmetricKey};
use super::rsa_oaep;
use super::utils::clear_bytes;

/// Largest message in bytes that can be encrypted for `recipient`.
pub fn max_payload_len(recipient: &PublicKey) -> usize {
    rsa_oaep::max_payload(recipient.rsa())
}

/// Encrypt a message for the holder of `recipient`.
///
/// Fails with `PayloadTooLarge` when the UTF-8 encoding of `plaintext` is
/// longer than [`max_payload_len`]. Longer messages belong on the group path.
pub fn encrypt(plaintext: &str, recipient: &PublicKey) -> Result<String, CryptoError> {
    let sealed = rsa_oaep::encrypt(plaintext.as_bytes(), recipient.rsa())?;
    log::debug!(
        "Encrypted {} bytes for {}",
        plaintext.len(),
        fingerprint(recipient)
    );
    Ok(codec::encode(&sealed))
}

/// Decrypt a message encrypted for our own key.
pub fn decrypt(ciphertext: &str, own_key: &PrivateKey) -> Result<String, CryptoError> {
    let sealed = codec::decode(ciphertext)?;
    let plaintext = rsa_oaep::decrypt(&sealed, own_key.rsa()).inspect_err(|_| {
        log::warn!("Message decryption failed ({} byte ciphertext)", sealed.len());
    })?;
    into_text(plaintext)
}

/// Encrypt a message under a group key.
///
/// Output is base64 of `IV || ciphertext || tag`, with a fresh IV per call.
pub fn encrypt_group(plaintext: &str, key: &SymmetricKey) -> Result<String, CryptoError> {
    let sealed = aes::seal(plaintext.as_bytes(), key.bytes())?;
    log::debug!("Sealed {} byte group message", plaintext.len());
    Ok(codec::encode(&sealed))
}

/// Decrypt a group message.
///
/// Wrong key and tampered data both fail with `Decryption`.
pub fn decrypt_group(ciphertext: &str, key: &SymmetricKey) -> Result<String, CryptoError> {
    let sealed = codec::decode(ciphertext)?;
    let plaintext = aes::unseal(&sealed, key.bytes()).inspect_err(|_| {
        log::warn!("Group message authentication failed ({} bytes)", sealed.len());
    })?;
    into_text(plaintext)
}

/// Convert decrypted bytes to a `String`.
///
/// Non-UTF-8 output is reported as a decryption failure; it cannot come
/// from `encrypt`.
fn into_text(plaintext: Vec<u8>) -> Result<String, CryptoError> {
    String::from_utf8(plaintext).map_err(|e| {
        let mut bytes = e.into_bytes();
        clear_bytes(&mut bytes);
        CryptoError::Decryption
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::generate_symmetric_key;
    use crate::crypto::tests::{other_pair, shared_pair};
    use proptest::prelude::*;

    #[test]
    fn asymmetric_roundtrip() {
        let pair = shared_pair();
        let ciphertext = encrypt("hello", pair.public_key()).unwrap();
        assert_eq!(decrypt(&ciphertext, pair.private_key()).unwrap(), "hello");
    }

    #[test]
    fn empty_message_roundtrip() {
        let pair = shared_pair();
        let ciphertext = encrypt("", pair.public_key()).unwrap();
        assert_eq!(decrypt(&ciphertext, pair.private_key()).unwrap(), "");
    }

    #[test]
    fn multibyte_text_roundtrip() {
        let pair = shared_pair();
        let text = "Grüße aus Köln 👋";
        let ciphertext = encrypt(text, pair.public_key()).unwrap();
        assert_eq!(decrypt(&ciphertext, pair.private_key()).unwrap(), text);
    }

    #[test]
    fn asymmetric_ciphertext_is_one_modulus_long() {
        let pair = shared_pair();
        let ciphertext = encrypt("hello", pair.public_key()).unwrap();
        assert_eq!(codec::decode(&ciphertext).unwrap().len(), 256);
    }

    #[test]
    fn payload_at_limit_encrypts() {
        let pair = shared_pair();
        let max = max_payload_len(pair.public_key());
        assert_eq!(max, 190);

        let text = "a".repeat(max);
        let ciphertext = encrypt(&text, pair.public_key()).unwrap();
        assert_eq!(decrypt(&ciphertext, pair.private_key()).unwrap(), text);
    }

    #[test]
    fn payload_one_byte_over_limit_fails() {
        let pair = shared_pair();
        let max = max_payload_len(pair.public_key());
        let text = "a".repeat(max + 1);
        assert!(matches!(
            encrypt(&text, pair.public_key()),
            Err(CryptoError::PayloadTooLarge { len, max: m }) if len == max + 1 && m == max
        ));
    }

    #[test]
    fn limit_counts_bytes_not_chars() {
        let pair = shared_pair();
        // 64 three-byte characters = 192 bytes
        let text = "€".repeat(64);
        assert!(matches!(
            encrypt(&text, pair.public_key()),
            Err(CryptoError::PayloadTooLarge { len: 192, .. })
        ));
    }

    #[test]
    fn wrong_private_key_fails() {
        let ciphertext = encrypt("for one reader", shared_pair().public_key()).unwrap();
        assert!(matches!(
            decrypt(&ciphertext, other_pair().private_key()),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn tampered_asymmetric_ciphertext_fails() {
        let pair = shared_pair();
        let mut raw = codec::decode(&encrypt("hello", pair.public_key()).unwrap()).unwrap();
        raw[100] ^= 0x01;
        assert!(matches!(
            decrypt(&codec::encode(&raw), pair.private_key()),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn malformed_ciphertext_text_is_decoding_error() {
        let pair = shared_pair();
        assert!(matches!(
            decrypt("***", pair.private_key()),
            Err(CryptoError::Decoding(_))
        ));
        let key = generate_symmetric_key().unwrap();
        assert!(matches!(
            decrypt_group("***", &key),
            Err(CryptoError::Decoding(_))
        ));
    }

    #[test]
    fn group_roundtrip() {
        let key = generate_symmetric_key().unwrap();
        let ciphertext = encrypt_group("hi all", &key).unwrap();
        assert_eq!(decrypt_group(&ciphertext, &key).unwrap(), "hi all");
    }

    #[test]
    fn group_handles_long_messages() {
        let key = generate_symmetric_key().unwrap();
        let text = "long group message ".repeat(1000);
        let ciphertext = encrypt_group(&text, &key).unwrap();
        assert_eq!(decrypt_group(&ciphertext, &key).unwrap(), text);
    }

    #[test]
    fn group_encryption_is_not_deterministic() {
        let key = generate_symmetric_key().unwrap();
        let first = encrypt_group("same text", &key).unwrap();
        let second = encrypt_group("same text", &key).unwrap();
        assert_ne!(first, second);
        assert_eq!(decrypt_group(&first, &key).unwrap(), "same text");
        assert_eq!(decrypt_group(&second, &key).unwrap(), "same text");
    }

    #[test]
    fn group_wrong_key_fails() {
        let ciphertext = encrypt_group("secret", &generate_symmetric_key().unwrap()).unwrap();
        let other = generate_symmetric_key().unwrap();
        assert!(matches!(
            decrypt_group(&ciphertext, &other),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn group_truncated_input_fails() {
        let key = generate_symmetric_key().unwrap();
        let short = codec::encode(&[0u8; 20]);
        assert!(matches!(
            decrypt_group(&short, &key),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn group_every_ciphertext_byte_is_authenticated() {
        let key = generate_symmetric_key().unwrap();
        let raw = codec::decode(&encrypt_group("tamper me", &key).unwrap()).unwrap();

        for i in aes::AES_IV_SIZE..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x80;
            assert!(
                matches!(
                    decrypt_group(&codec::encode(&tampered), &key),
                    Err(CryptoError::Decryption)
                ),
                "flipping byte {} was not detected",
                i
            );
        }
    }

    #[test]
    fn non_utf8_plaintext_is_rejected() {
        let key = generate_symmetric_key().unwrap();
        let sealed = aes::seal(&[0xFF, 0xFE, 0xFD], key.bytes()).unwrap();
        assert!(matches!(
            decrypt_group(&codec::encode(&sealed), &key),
            Err(CryptoError::Decryption)
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn group_roundtrip_any_text(text in ".{0,300}") {
            let key = generate_symmetric_key().unwrap();
            let ciphertext = encrypt_group(&text, &key).unwrap();
            prop_assert_eq!(decrypt_group(&ciphertext, &key).unwrap(), text);
        }

        #[test]
        fn asymmetric_roundtrip_any_short_text(text in ".{0,40}") {
            let pair = shared_pair();
            prop_assume!(text.len() <= max_payload_len(pair.public_key()));
            let ciphertext = encrypt(&text, pair.public_key()).unwrap();
            prop_assert_eq!(decrypt(&ciphertext, pair.private_key()).unwrap(), text);
        }
    }
}
