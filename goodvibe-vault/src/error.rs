//! Vault error types.
//!
//! Decryption failures come in two flavours internally (the envelope could
//! not be parsed, or the AEAD tag did not verify) but they render to the
//! outside world identically, so a caller probing PINs learns nothing about
//! which check rejected the input.

use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The envelope string is not valid base64/JSON or does not have the
    /// expected shape. The detail is for debug logging only.
    #[error("Decryption failed")]
    MalformedEnvelope(String),

    /// The AEAD tag check failed: wrong PIN or tampered envelope.
    #[error("Decryption failed")]
    AuthenticationFailure,

    /// The crypto provider (RNG, cipher) rejected the operation for a reason
    /// unrelated to the inputs.
    #[error("Crypto provider error: {0}")]
    Provider(String),

    /// The PIN does not satisfy the configured policy.
    #[error("PIN rejected: {0}")]
    WeakPin(String),

    /// No session with this id is registered.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// A session is already stored under this id.
    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    /// No session is currently selected.
    #[error("No active session")]
    NoActiveSession,

    /// A wallet record is missing a required field or was changed illegally.
    #[error("Invalid wallet record: {0}")]
    InvalidRecord(String),

    /// Persisted bookkeeping (session registry, decrypted record) is unreadable.
    #[error("Vault data is corrupted: {0}")]
    Corrupted(String),

    /// The backing key-value store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Stable classification of a [`VaultError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedEnvelope,
    AuthenticationFailure,
    Provider,
    WeakPin,
    SessionNotFound,
    AlreadyExists,
    NoActiveSession,
    InvalidRecord,
    Corrupted,
    Storage,
}

/// Result type alias for vault operations.
pub type VaultResult<T> = std::result::Result<T, VaultError>;

impl VaultError {
    /// Internal classification. Distinguishes malformed envelopes from
    /// authentication failures; do not surface this to untrusted callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedEnvelope(_) => ErrorKind::MalformedEnvelope,
            Self::AuthenticationFailure => ErrorKind::AuthenticationFailure,
            Self::Provider(_) => ErrorKind::Provider,
            Self::WeakPin(_) => ErrorKind::WeakPin,
            Self::SessionNotFound(_) => ErrorKind::SessionNotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NoActiveSession => ErrorKind::NoActiveSession,
            Self::InvalidRecord(_) => ErrorKind::InvalidRecord,
            Self::Corrupted(_) => ErrorKind::Corrupted,
            Self::Storage(_) | Self::Io(_) | Self::Serialization(_) => ErrorKind::Storage,
        }
    }

    /// True for any failure that must read as "incorrect PIN" to a user.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedEnvelope(_) | Self::AuthenticationFailure
        )
    }

    /// Error code for programmatic handling by callers outside the crate.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope(_) | Self::AuthenticationFailure => "DECRYPTION_FAILED",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::WeakPin(_) => "WEAK_PIN",
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::NoActiveSession => "NO_ACTIVE_SESSION",
            Self::InvalidRecord(_) => "INVALID_RECORD",
            Self::Corrupted(_) => "CORRUPTED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

// ============================================================================
// Serialization for callers across a process boundary
// ============================================================================

impl serde::Serialize for VaultError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("VaultError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
