//! Persisted envelope format.
//!
//! Format: `base64(JSON{"salt":[16 bytes],"iv":[12 bytes],"ct":[ciphertext+tag]})`
//!
//! The JSON text is byte-for-byte what a browser's `JSON.stringify` produces
//! for the same object, so envelopes written by the web client decode here
//! and vice versa.
//!
//! Encoding is always padded. Decoding follows `atob`: ASCII whitespace is
//! ignored anywhere, padding is optional and trailing bits are tolerated.

use base64::{
    alphabet,
    engine::{general_purpose::STANDARD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde::{Deserialize, Serialize};

use super::key::{NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::error::{VaultError, VaultResult};

/// Standard alphabet with `atob`'s leniency on padding and trailing bits.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// One encrypted record: salt and nonce for a single encryption call plus the
/// AES-GCM output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptedEnvelope {
    pub salt: [u8; SALT_SIZE],
    #[serde(rename = "iv")]
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext with the 16-byte tag appended.
    #[serde(rename = "ct")]
    pub ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    /// Serialize to the single-string storage form.
    pub fn encode(&self) -> VaultResult<String> {
        let json = serde_json::to_string(self)?;
        Ok(STANDARD.encode(json))
    }

    /// Parse and validate the storage form.
    ///
    /// Every structural problem becomes [`VaultError::MalformedEnvelope`].
    pub fn decode(encoded: &str) -> VaultResult<Self> {
        let compact: String = encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let json = FORGIVING
            .decode(compact)
            .map_err(|e| VaultError::MalformedEnvelope(format!("base64: {}", e)))?;

        let envelope: Self = serde_json::from_slice(&json)
            .map_err(|e| VaultError::MalformedEnvelope(format!("json: {}", e)))?;

        if envelope.ciphertext.len() < TAG_SIZE {
            return Err(VaultError::MalformedEnvelope(format!(
                "ciphertext too short: {} bytes",
                envelope.ciphertext.len()
            )));
        }

        Ok(envelope)
    }
}
