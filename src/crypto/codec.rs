//! Binary to text conversion for keys and ciphertext.
//!
//! Standard base64 alphabet with padding, the same output as the browser's
//! `btoa` over a byte string, so values can be exchanged with web clients.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Encode bytes as base64 text.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64 text back into bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    Ok(STANDARD.decode(text)?)
}
