//! PIN-based key derivation.
//!
//! The user's PIN is stretched with PBKDF2-HMAC-SHA256 over a per-envelope
//! salt into a 256-bit AES-GCM key. The derived bytes live only long enough
//! to build the cipher and are zeroized afterwards; the resulting
//! [`VaultKey`] can seal and open data but never hands its key back out.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use tracing::trace;
use zeroize::Zeroizing;

use crate::error::{VaultError, VaultResult};

/// PBKDF2 iteration count. Fixed: existing envelopes carry no parameters.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt size in bytes (128 bits).
pub const SALT_SIZE: usize = 16;

/// Nonce size for AES-GCM (96 bits).
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size.
pub const TAG_SIZE: usize = 16;

/// 256-bit key for AES-256.
const KEY_SIZE: usize = 32;

/// Symmetric key handle for one encrypt or decrypt call.
///
/// Only AEAD sealing and opening are exposed. There is no way to read the key
/// material back, and `Debug` never prints it.
pub struct VaultKey {
    cipher: Aes256Gcm,
}

impl VaultKey {
    /// Encrypt `plaintext`, returning ciphertext with the 16-byte tag appended.
    pub fn seal(&self, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> VaultResult<Vec<u8>> {
        self.cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| VaultError::Provider("AES-GCM encryption rejected the input".into()))
    }

    /// Verify the tag and decrypt. Any verification failure is an
    /// [`VaultError::AuthenticationFailure`]; no plaintext escapes on failure.
    pub fn open(&self, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> VaultResult<Vec<u8>> {
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| VaultError::AuthenticationFailure)
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive an AES-256-GCM key from `pin` and `salt`.
///
/// Deterministic in `(pin, salt)`. Any PIN is accepted here, including the
/// empty string; PIN policy is enforced by [`crate::session::SessionManager`].
pub fn derive_key(pin: &str, salt: &[u8; SALT_SIZE]) -> VaultResult<VaultKey> {
    let mut key_bytes = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(pin.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key_bytes[..]);

    let cipher = Aes256Gcm::new_from_slice(&key_bytes[..])
        .map_err(|e| VaultError::Provider(format!("Invalid key: {}", e)))?;

    trace!("Derived {}-byte key from PIN", KEY_SIZE);
    Ok(VaultKey { cipher })
}
