use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::VaultResult;
use crate::vault::pin::{PinPolicy, DEFAULT_MIN_PIN_LENGTH};

/// Prefix the web client used for all of its storage keys.
pub const DEFAULT_KEY_PREFIX: &str = "goodvibe";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    pub key_prefix: String,
    pub min_pin_length: usize,
    pub digits_only_pin: bool,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            min_pin_length: DEFAULT_MIN_PIN_LENGTH,
            digits_only_pin: true,
        }
    }
}

impl VaultSettings {
    pub fn pin_policy(&self) -> PinPolicy {
        PinPolicy {
            min_length: self.min_pin_length,
            digits_only: self.digits_only_pin,
        }
    }
}

/// Load settings from `path`, falling back to defaults if the file is absent.
pub fn load_settings(path: &Path) -> VaultResult<VaultSettings> {
    if !path.exists() {
        return Ok(VaultSettings::default());
    }

    let content = std::fs::read_to_string(path)?;
    let settings: VaultSettings = serde_json::from_str(&content)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &VaultSettings) -> VaultResult<()> {
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
