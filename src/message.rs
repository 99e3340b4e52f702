//! Send and receive paths for one-to-one messages.
//!
//! A message goes out encrypted when the recipient has published a public
//! key and in plaintext otherwise. The choice is an explicit
//! [`PreparedMessage`] variant instead of a flag threaded through the caller.

use serde::{Deserialize, Serialize};

use crate::crypto::{self, import_public_key, CryptoError, EncodedKey};
use crate::identity::Identity;

/// Outgoing message body, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedMessage {
    /// Recipient has no public key on record.
    Plain(String),
    /// Encrypted for the recipient; `key_used` is kept for traceability and
    /// for picking the right private key after a rotation.
    Encrypted {
        ciphertext: String,
        key_used: EncodedKey,
    },
}

impl PreparedMessage {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, PreparedMessage::Encrypted { .. })
    }
}

/// Prepare `text` for a recipient whose published key is `recipient_key`.
pub fn prepare_message(
    text: &str,
    recipient_key: Option<&EncodedKey>,
) -> Result<PreparedMessage, CryptoError> {
    let Some(encoded) = recipient_key else {
        log::debug!("Recipient has no public key, sending plaintext");
        return Ok(PreparedMessage::Plain(text.to_string()));
    };

    let public = import_public_key(encoded.as_str())?;
    let ciphertext = crypto::encrypt(text, &public)?;
    Ok(PreparedMessage::Encrypted {
        ciphertext,
        key_used: encoded.clone(),
    })
}

/// Message row as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub content: String,
    pub is_encrypted: bool,
    /// Public key the content was encrypted with. Absent on plaintext rows
    /// and on rows written before keys were recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub encryption_key: Option<EncodedKey>,
}

impl From<PreparedMessage> for StoredMessage {
    fn from(message: PreparedMessage) -> Self {
        match message {
            PreparedMessage::Plain(content) => Self {
                content,
                is_encrypted: false,
                encryption_key: None,
            },
            PreparedMessage::Encrypted {
                ciphertext,
                key_used,
            } => Self {
                content: ciphertext,
                is_encrypted: true,
                encryption_key: Some(key_used),
            },
        }
    }
}

/// Recover the text of a stored message for `reader`.
///
/// A failed decryption is returned as an error, never as empty text.
pub fn open_message(message: &StoredMessage, reader: &Identity) -> Result<String, CryptoError> {
    if !message.is_encrypted {
        return Ok(message.content.clone());
    }
    reader.decrypt(&message.content, message.encryption_key.as_ref())
}
