//! PIN-protected secret vault.
//!
//! A user PIN is stretched with PBKDF2-SHA256 (100 000 iterations) over a
//! random per-envelope salt into an AES-256-GCM key. The result is packed
//! into a self-contained base64 envelope that can sit in attacker-readable
//! storage; decrypting it needs only the envelope and the PIN.

pub mod codec;
pub mod envelope;
pub mod key;
pub mod pin;

pub use codec::{decrypt_data, encrypt_data, spawn_decrypt, spawn_encrypt};
pub use envelope::EncryptedEnvelope;
pub use key::{derive_key, VaultKey, NONCE_SIZE, PBKDF2_ITERATIONS, SALT_SIZE, TAG_SIZE};
pub use pin::{pins_match, PinPolicy};

#[cfg(test)]
mod proptests;
