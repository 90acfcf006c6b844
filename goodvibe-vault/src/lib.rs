//! GoodVibe wallet vault.
//!
//! Keeps a wallet's private key and mnemonic in untrusted key-value storage,
//! encrypted under a key stretched from the user's PIN. Envelopes are
//! interchangeable with the ones the GoodVibe web client writes to
//! `localStorage`.

pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod vault;

pub use config::{load_settings, save_settings, VaultSettings};
pub use error::{ErrorKind, VaultError, VaultResult};
pub use session::{SessionManager, SessionRecord, WalletRecord};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use vault::{decrypt_data, encrypt_data, spawn_decrypt, spawn_encrypt, PinPolicy};
