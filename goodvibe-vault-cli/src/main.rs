//! GoodVibe Vault CLI
//!
//! Encrypts and decrypts PIN-protected envelopes and manages wallet sessions
//! stored in a local JSON file. Envelopes are the same strings the GoodVibe
//! web client keeps in `localStorage`, so they can be copied in either
//! direction.
//!
//! The PIN is read from `--pin` or the `GOODVIBE_PIN` environment variable
//! and is never written to disk.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use goodvibe_vault::{
    load_settings, spawn_decrypt, spawn_encrypt, vault::pins_match, FileStore, SessionManager,
    VaultError, WalletRecord,
};
use tracing::{debug, info};

/// GoodVibe PIN-protected wallet vault
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the session store (created on first write)
    #[arg(long, global = true, default_value = "goodvibe-store.json")]
    store: PathBuf,

    /// Path to a JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt text into an envelope
    Encrypt {
        /// Text to encrypt (read from stdin when omitted)
        #[arg(long)]
        text: Option<String>,

        #[arg(long, env = "GOODVIBE_PIN", hide_env_values = true)]
        pin: String,
    },

    /// Decrypt an envelope
    Decrypt {
        /// Envelope to decrypt (read from stdin when omitted)
        #[arg(long)]
        envelope: Option<String>,

        #[arg(long, env = "GOODVIBE_PIN", hide_env_values = true)]
        pin: String,
    },

    /// Manage stored wallet sessions
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Store a wallet under a PIN and make it the active session
    Create {
        #[arg(long)]
        name: String,

        /// Wallet address, used as the session id
        #[arg(long)]
        address: String,

        /// Hex-encoded private key
        #[arg(long)]
        private_key: String,

        /// Mnemonic phrase
        #[arg(long, default_value = "")]
        seed: String,

        #[arg(long, default_value = "ru")]
        lang: String,

        #[arg(long, env = "GOODVIBE_PIN", hide_env_values = true)]
        pin: String,

        /// Repeat the PIN; creation is refused if it differs
        #[arg(long)]
        pin_confirm: Option<String>,
    },

    /// List stored sessions
    List,

    /// Make a session active
    Select { id: String },

    /// Decrypt a session and print its wallet
    Unlock {
        /// Session id (defaults to the active session)
        id: Option<String>,

        #[arg(long, env = "GOODVIBE_PIN", hide_env_values = true)]
        pin: String,

        /// Include the private key and mnemonic in the output
        #[arg(long)]
        show_secrets: bool,
    },

    /// Set the avatar IPFS hash of a session
    SetAvatar {
        hash: String,

        /// Session id (defaults to the active session)
        #[arg(long)]
        id: Option<String>,

        #[arg(long, env = "GOODVIBE_PIN", hide_env_values = true)]
        pin: String,
    },

    /// Re-encrypt a session under a new PIN
    ChangePin {
        /// Session id (defaults to the active session)
        #[arg(long)]
        id: Option<String>,

        #[arg(long, env = "GOODVIBE_PIN", hide_env_values = true)]
        pin: String,

        #[arg(long)]
        new_pin: String,
    },

    /// Delete a session and its encrypted data
    Remove { id: String },

    /// Clear the active session
    Logout,
}

/// Collapse decryption failures into the one message a user should see.
fn user_error(err: VaultError) -> anyhow::Error {
    if err.is_decryption_failure() {
        debug!("Decryption failed: {:?}", err);
        anyhow!("incorrect PIN or corrupted data")
    } else {
        anyhow::Error::new(err)
    }
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn run_session(store: &Path, config: Option<&Path>, action: SessionCommand) -> Result<()> {
    let settings = match config {
        Some(path) => load_settings(path)
            .with_context(|| format!("Failed to load settings from {:?}", path))?,
        None => Default::default(),
    };
    info!("Opening session store {:?}", store);
    let store = FileStore::open(store)
        .with_context(|| format!("Failed to open session store {:?}", store))?;
    let mut manager = SessionManager::with_settings(store, &settings);

    let resolve = |manager: &SessionManager<FileStore>, id: Option<String>| -> Result<String> {
        match id {
            Some(id) => Ok(id),
            None => manager.require_active_session().map_err(user_error),
        }
    };

    match action {
        SessionCommand::Create {
            name,
            address,
            private_key,
            seed,
            lang,
            pin,
            pin_confirm,
        } => {
            if let Some(confirm) = pin_confirm {
                if !pins_match(&pin, &confirm) {
                    bail!("PIN confirmation does not match");
                }
            }
            let wallet = WalletRecord::new(name, address, private_key, seed).with_lang(lang);
            let session = manager.create_session(&wallet, &pin).map_err(user_error)?;
            println!("{}", session.id);
        }
        SessionCommand::List => {
            let active = manager.active_session_id().map_err(user_error)?;
            for session in manager.sessions().map_err(user_error)? {
                let marker = if active.as_deref() == Some(session.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {}\t{}\t{}",
                    marker,
                    session.id,
                    session.name,
                    session.created.to_rfc3339()
                );
            }
        }
        SessionCommand::Select { id } => {
            manager.select_session(&id).map_err(user_error)?;
        }
        SessionCommand::Unlock {
            id,
            pin,
            show_secrets,
        } => {
            let id = resolve(&manager, id)?;
            let wallet = manager.unlock(&id, &pin).map_err(user_error)?;
            if show_secrets {
                println!("{}", serde_json::to_string_pretty(&wallet)?);
            } else {
                println!("name:    {}", wallet.name);
                println!("address: {}", wallet.address);
                println!("lang:    {}", wallet.lang);
                if let Some(hash) = &wallet.avatar_hash {
                    println!("avatar:  {}", hash);
                }
            }
        }
        SessionCommand::SetAvatar { hash, id, pin } => {
            let id = resolve(&manager, id)?;
            manager
                .update_wallet(&id, &pin, |wallet| wallet.avatar_hash = Some(hash))
                .map_err(user_error)?;
        }
        SessionCommand::ChangePin { id, pin, new_pin } => {
            let id = resolve(&manager, id)?;
            manager.change_pin(&id, &pin, &new_pin).map_err(user_error)?;
        }
        SessionCommand::Remove { id } => {
            manager.remove_session(&id).map_err(user_error)?;
        }
        SessionCommand::Logout => {
            manager.logout().map_err(user_error)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("goodvibe_vault=info".parse()?),
        )
        .init();

    let args = Args::parse();
    debug!("Using store {:?}", args.store);

    match args.command {
        Command::Encrypt { text, pin } => {
            let text = match text {
                Some(text) => text,
                None => read_stdin()?,
            };
            let envelope = spawn_encrypt(text, pin).await.map_err(user_error)?;
            println!("{}", envelope);
        }
        Command::Decrypt { envelope, pin } => {
            let envelope = match envelope {
                Some(envelope) => envelope,
                None => read_stdin()?,
            };
            let plaintext = spawn_decrypt(envelope, pin).await.map_err(user_error)?;
            println!("{}", plaintext);
        }
        Command::Session { action } => {
            let store = args.store;
            let config = args.config;
            tokio::task::spawn_blocking(move || run_session(&store, config.as_deref(), action))
                .await
                .context("Session task failed")??;
        }
    }

    Ok(())
}
