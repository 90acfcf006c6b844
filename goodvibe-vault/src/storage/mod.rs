//! Key-value persistence for envelopes and session bookkeeping.
//!
//! The web client kept everything in `localStorage`. Here the store is an
//! explicit capability handed to [`crate::session::SessionManager`], so the
//! codec never touches storage and tests can run against memory.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::VaultResult;

/// String-to-string store with `localStorage` semantics.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> VaultResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> VaultResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> VaultResult<()>;
}
