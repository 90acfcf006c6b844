//! PIN policy.
//!
//! The codec itself accepts any PIN. Session-level operations run the PIN
//! through a [`PinPolicy`] first, since PBKDF2 alone does little for a
//! four-digit keyspace.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Minimum PIN length the web client has always required.
pub const DEFAULT_MIN_PIN_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinPolicy {
    pub min_length: usize,
    pub digits_only: bool,
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_PIN_LENGTH,
            digits_only: true,
        }
    }
}

impl PinPolicy {
    /// Reject PINs that are too short or contain non-digits.
    pub fn check(&self, pin: &str) -> crate::VaultResult<()> {
        let len = pin.chars().count();
        if len < self.min_length {
            return Err(crate::VaultError::WeakPin(format!(
                "must be at least {} characters",
                self.min_length
            )));
        }
        if self.digits_only && !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(crate::VaultError::WeakPin("must contain only digits".into()));
        }
        Ok(())
    }
}

/// Compare a PIN with its confirmation without early exit on mismatch.
pub fn pins_match(pin: &str, confirmation: &str) -> bool {
    pin.as_bytes().ct_eq(confirmation.as_bytes()).into()
}
