//! End-to-end encryption core for chat messages.
//!
//! - [`crypto`]: key generation/export/import, message encryption, codec
//! - [`identity`]: a user's key pairs for one session, with rotation
//! - [`store`]: injected confidential storage for private keys
//! - [`message`]: plaintext/encrypted send path and stored message records
//! - [`config`]: environment configuration for the `sealed-chat` binary

pub mod config;
pub mod crypto;
pub mod identity;
pub mod message;
pub mod store;

pub use crypto::{CryptoError, EncodedKey, KeyPair, PrivateKey, PublicKey, SymmetricKey};
pub use identity::{Identity, IdentityError};
pub use message::{open_message, prepare_message, PreparedMessage, StoredMessage};
pub use store::{with_secret, MemoryStore, SecretStore, StoreError};
