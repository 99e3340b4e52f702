//! `sealed-chat` command line front-end.
//!
//! Identities (private keys) live in the OS keychain. Public keys,
//! ciphertext and group keys are read from and written to the terminal as
//! base64 text.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sealed_chat::config::{self, Config, ConfigError};
use sealed_chat::crypto::{
    self, export_symmetric_key, fingerprint, generate_key_pair_in_background,
    generate_symmetric_key, import_public_key, import_symmetric_key, CryptoError, EncodedKey,
};
use sealed_chat::identity::{Identity, IdentityError};
use sealed_chat::store::KeychainStore;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "sealed-chat", about = "End-to-end message encryption")]
struct Args {
    /// Keychain service name (overrides SEALED_CHAT_KEYCHAIN_SERVICE)
    #[arg(long, global = true)]
    service: Option<String>,

    /// RSA modulus size for new key pairs (overrides SEALED_CHAT_RSA_BITS)
    #[arg(long, global = true, value_parser = parse_bits)]
    bits: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an identity and print its public key
    Keygen {
        #[arg(long)]
        user: String,
        /// Replace an existing identity (its keys are lost)
        #[arg(long)]
        force: bool,
    },
    /// Print the current public key of an identity
    PublicKey {
        #[arg(long)]
        user: String,
    },
    /// Generate a new key pair, keeping the old one for reading history
    Rotate {
        #[arg(long)]
        user: String,
    },
    /// Encrypt a message for a published public key
    Encrypt {
        /// Recipient public key (base64)
        #[arg(long)]
        to: String,
        message: String,
    },
    /// Decrypt a message with a stored identity
    Decrypt {
        #[arg(long)]
        user: String,
        /// Public key the message was encrypted with, if recorded
        #[arg(long)]
        key_used: Option<String>,
        ciphertext: String,
    },
    /// Print a new group key
    GroupKeygen,
    /// Encrypt a message with a group key
    GroupEncrypt {
        #[arg(long)]
        key: String,
        message: String,
    },
    /// Decrypt a message with a group key
    GroupDecrypt {
        #[arg(long)]
        key: String,
        ciphertext: String,
    },
    /// Delete a stored identity from the keychain
    Forget {
        #[arg(long)]
        user: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("No identity stored for {0}; run `keygen` first")]
    NoIdentity(String),
    #[error("Identity for {0} already exists; pass --force to replace it")]
    IdentityExists(String),
}

fn parse_bits(raw: &str) -> Result<usize, String> {
    config::parse_rsa_bits(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env in the working directory is optional
    let _ = dotenvy::dotenv();

    env_logger::init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let mut config = Config::from_env()?;
    if let Some(service) = args.service {
        config.keychain_service = service;
    }
    if let Some(bits) = args.bits {
        config.rsa_bits = bits;
    }
    log::debug!("Using {:?}", config);

    let store = KeychainStore::new(config.keychain_service.clone());

    match args.command {
        Command::Keygen { user, force } => {
            if !force && Identity::load(&store, &user)?.is_some() {
                return Err(CliError::IdentityExists(user));
            }
            let pair = generate_key_pair_in_background(config.rsa_bits).await?;
            let identity = Identity::new(user, pair);
            identity.save(&store)?;
            println!("{}", identity.public_key()?);
        }
        Command::PublicKey { user } => {
            let identity = load_identity(&store, &user)?;
            println!("{}", identity.public_key()?);
        }
        Command::Rotate { user } => {
            let mut identity = load_identity(&store, &user)?;
            let pair = generate_key_pair_in_background(config.rsa_bits).await?;
            let published = identity.rotate_to(pair)?;
            identity.save(&store)?;
            println!("{}", published);
        }
        Command::Encrypt { to, message } => {
            let recipient = import_public_key(&to)?;
            log::info!("Encrypting for {}", fingerprint(&recipient));
            println!("{}", crypto::encrypt(&message, &recipient)?);
        }
        Command::Decrypt {
            user,
            key_used,
            ciphertext,
        } => {
            let identity = load_identity(&store, &user)?;
            let key_used = key_used.map(EncodedKey::from);
            println!("{}", identity.decrypt(&ciphertext, key_used.as_ref())?);
        }
        Command::GroupKeygen => {
            let key = generate_symmetric_key()?;
            println!("{}", export_symmetric_key(&key).as_str());
        }
        Command::GroupEncrypt { key, message } => {
            let key = import_symmetric_key(&key)?;
            println!("{}", crypto::encrypt_group(&message, &key)?);
        }
        Command::GroupDecrypt { key, ciphertext } => {
            let key = import_symmetric_key(&key)?;
            println!("{}", crypto::decrypt_group(&ciphertext, &key)?);
        }
        Command::Forget { user } => {
            Identity::forget(&store, &user)?;
        }
    }

    Ok(())
}

fn load_identity(store: &KeychainStore, user: &str) -> Result<Identity, CliError> {
    Identity::load(store, user)?.ok_or_else(|| CliError::NoIdentity(user.to_string()))
}
