//! Encrypt and decrypt text under a PIN.
//!
//! Every call draws a fresh salt and nonce from the OS RNG, derives a key,
//! and packs the result into an [`EncryptedEnvelope`] string. Nothing is
//! cached between calls, so concurrent calls never share key material.

use rand::rngs::OsRng;
use rand::TryRngCore;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::envelope::EncryptedEnvelope;
use super::key::{derive_key, NONCE_SIZE, SALT_SIZE};
use crate::error::{VaultError, VaultResult};

fn fill_random(buf: &mut [u8]) -> VaultResult<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| VaultError::Provider(format!("OS RNG unavailable: {}", e)))
}

fn seal_with(
    plaintext: &str,
    pin: &str,
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
) -> VaultResult<EncryptedEnvelope> {
    let key = derive_key(pin, &salt)?;
    let ciphertext = key.seal(&nonce, plaintext.as_bytes())?;
    Ok(EncryptedEnvelope {
        salt,
        nonce,
        ciphertext,
    })
}

/// Encrypt `plaintext` under `pin` and return the storage string.
pub fn encrypt_data(plaintext: &str, pin: &str) -> VaultResult<String> {
    let mut salt = [0u8; SALT_SIZE];
    let mut nonce = [0u8; NONCE_SIZE];
    fill_random(&mut salt)?;
    fill_random(&mut nonce)?;

    let envelope = seal_with(plaintext, pin, salt, nonce)?;
    debug!(
        "Sealed {} plaintext bytes into {}-byte ciphertext",
        plaintext.len(),
        envelope.ciphertext.len()
    );
    envelope.encode()
}

/// Decrypt a storage string produced by [`encrypt_data`] (or the web client).
///
/// Fails with [`VaultError::MalformedEnvelope`] or
/// [`VaultError::AuthenticationFailure`], which render identically. A
/// malformed envelope still goes through key derivation so that it costs as
/// long as a wrong PIN.
pub fn decrypt_data(envelope: &str, pin: &str) -> VaultResult<String> {
    let envelope = match EncryptedEnvelope::decode(envelope) {
        Ok(envelope) => envelope,
        Err(err) => {
            let _ = derive_key(pin, &[0u8; SALT_SIZE]);
            debug!("Rejected envelope: {:?}", err);
            return Err(err);
        }
    };

    let key = derive_key(pin, &envelope.salt)?;
    let plaintext = key.open(&envelope.nonce, &envelope.ciphertext).map_err(|err| {
        debug!("Envelope failed authentication");
        err
    })?;

    String::from_utf8(plaintext).map_err(|e| {
        e.into_bytes().zeroize();
        VaultError::MalformedEnvelope("plaintext is not UTF-8".into())
    })
}

/// [`encrypt_data`] on the blocking thread pool.
pub async fn spawn_encrypt(plaintext: String, pin: String) -> VaultResult<String> {
    let plaintext = Zeroizing::new(plaintext);
    let pin = Zeroizing::new(pin);
    tokio::task::spawn_blocking(move || encrypt_data(&plaintext, &pin))
        .await
        .map_err(|e| VaultError::Provider(format!("Encryption task failed: {}", e)))?
}

/// [`decrypt_data`] on the blocking thread pool.
pub async fn spawn_decrypt(envelope: String, pin: String) -> VaultResult<String> {
    let pin = Zeroizing::new(pin);
    tokio::task::spawn_blocking(move || decrypt_data(&envelope, &pin))
        .await
        .map_err(|e| VaultError::Provider(format!("Decryption task failed: {}", e)))?
}
