//! Runtime configuration from the environment.
//!
//! Values come from process environment variables, after `.env` has been
//! loaded by the binary. Command-line flags take precedence over both.

use thiserror::Error;

use crate::crypto::rsa_oaep::{self, RSA_DEFAULT_BITS};

/// Keychain service name variable.
pub const KEYCHAIN_SERVICE_ENV: &str = "SEALED_CHAT_KEYCHAIN_SERVICE";

/// RSA modulus size variable, in bits.
pub const RSA_BITS_ENV: &str = "SEALED_CHAT_RSA_BITS";

/// Keychain service name used when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "com.sealedchat.desktop";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Keychain service under which identities are stored.
    pub keychain_service: String,
    /// Modulus size for newly generated key pairs.
    pub rsa_bits: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keychain_service: DEFAULT_SERVICE_NAME.to_string(),
            rsa_bits: RSA_DEFAULT_BITS,
        }
    }
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(service) = lookup(KEYCHAIN_SERVICE_ENV).filter(|s| !s.trim().is_empty()) {
            config.keychain_service = service;
        }

        if let Some(raw) = lookup(RSA_BITS_ENV) {
            config.rsa_bits = parse_rsa_bits(&raw)?;
        }

        Ok(config)
    }
}

/// Parse and range-check a modulus size.
pub fn parse_rsa_bits(raw: &str) -> Result<usize, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        name: RSA_BITS_ENV,
        value: raw.to_string(),
    };
    let bits: usize = raw.trim().parse().map_err(|_| invalid())?;
    rsa_oaep::check_modulus_bits(bits).map_err(|_| invalid())?;
    Ok(bits)
}
