//! Wallet sessions.
//!
//! A session is one wallet (name, address, key, mnemonic) stored encrypted
//! under the user's PIN, plus a public registry entry so the wallet can be
//! listed and picked before the PIN is entered.

mod manager;
mod records;

pub use manager::SessionManager;
pub use records::{SessionRecord, WalletRecord};
