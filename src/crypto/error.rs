//! Error taxonomy shared by the key manager and the message cipher.

use thiserror::Error;

use super::codec::CodecError;

/// Failure of a key management or message cipher operation.
///
/// Variants never carry key material or plaintext.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The text is not valid base64.
    #[error("Malformed encoding: {0}")]
    Decoding(#[from] CodecError),

    /// Valid encoding, but the bytes are not a key of the expected algorithm.
    #[error("Invalid key: {0}")]
    KeyFormat(String),

    /// Plaintext exceeds the asymmetric payload limit for the key size.
    #[error("Payload too large: {len} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    /// The symmetric cipher refused the input.
    #[error("Encryption failed")]
    Encryption,

    /// Wrong key, corrupted ciphertext or tampering. Indistinguishable by design
    /// of the padding and AEAD schemes.
    #[error("Decryption failed")]
    Decryption,

    /// The environment has no working secure random generator.
    #[error("Secure random source unavailable")]
    RandomSourceUnavailable,

    /// The key generator rejected its parameters.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// A background worker did not complete.
    #[error("Background task failed: {0}")]
    Background(String),
}
