//! Message encryption core.
//!
//! One-to-one messages are encrypted directly with the recipient's RSA-OAEP
//! public key. Group messages use a shared AES-256-GCM key. Keys and
//! ciphertext travel as base64 text.

pub mod aes;
pub mod cipher;
pub mod codec;
pub mod error;
pub mod keys;
pub mod rsa_oaep;
pub mod utils;


// Re-export primary functions for convenience
pub use cipher::{decrypt, decrypt_group, encrypt, encrypt_group, max_payload_len};
pub use codec::CodecError;
pub use error::CryptoError;
pub use keys::{
    export_private_key, export_public_key, export_symmetric_key, fingerprint,
    generate_key_pair, generate_key_pair_in_background, generate_key_pair_with_bits,
    generate_symmetric_key, import_private_key, import_public_key, import_symmetric_key,
    EncodedKey, KeyPair, PrivateKey, PublicKey, SymmetricKey,
};
