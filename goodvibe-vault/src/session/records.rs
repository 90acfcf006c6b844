use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Decrypted contents of a session envelope.
///
/// Serialized with the field names the web client writes, so records round
/// trip between the two.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub name: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    /// BIP-39 mnemonic, space separated.
    #[serde(default)]
    pub seed: String,
    /// Hex-encoded secp256k1 private key, no `0x` prefix.
    pub private_key: String,
    /// Checksummed chain address. Doubles as the session id.
    pub address: String,
    /// IPFS hash of the profile picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_hash: Option<String>,
}

fn default_lang() -> String {
    "ru".to_string()
}

impl WalletRecord {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        private_key: impl Into<String>,
        seed: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            lang: default_lang(),
            seed: seed.into(),
            private_key: private_key.into(),
            address: address.into(),
            avatar_hash: None,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }
}

impl std::fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRecord")
            .field("name", &self.name)
            .field("lang", &self.lang)
            .field("seed", &"[REDACTED]")
            .field("private_key", &"[REDACTED]")
            .field("address", &self.address)
            .field("avatar_hash", &self.avatar_hash)
            .finish()
    }
}

/// Public registry entry for a stored session. Carries no secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub name: String,
    pub created: DateTime<Utc>,
}
