//! SessionManager - wallet sessions on top of the vault codec.
//!
//! Storage layout (prefix `p`, default `goodvibe`):
//! - `p_sessions`: JSON array of [`SessionRecord`]
//! - `p_session_id`: id of the active session
//! - `p_userdata_<id>`: envelope holding the session's [`WalletRecord`]
//!
//! The PIN is never written anywhere. Every write produces a new envelope
//! with fresh salt and nonce; existing envelopes are only ever replaced.

use chrono::Utc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::records::{SessionRecord, WalletRecord};
use crate::config::VaultSettings;
use crate::error::{VaultError, VaultResult};
use crate::storage::KeyValueStore;
use crate::vault::{decrypt_data, encrypt_data, PinPolicy};

pub struct SessionManager<S> {
    store: S,
    key_prefix: String,
    policy: PinPolicy,
}

impl<S: KeyValueStore> SessionManager<S> {
    /// Manager with default settings (`goodvibe` prefix, 6+ digit PINs).
    pub fn new(store: S) -> Self {
        Self::with_settings(store, &VaultSettings::default())
    }

    pub fn with_settings(store: S, settings: &VaultSettings) -> Self {
        Self {
            store,
            key_prefix: settings.key_prefix.clone(),
            policy: settings.pin_policy(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn pin_policy(&self) -> PinPolicy {
        self.policy
    }

    fn sessions_key(&self) -> String {
        format!("{}_sessions", self.key_prefix)
    }

    fn active_key(&self) -> String {
        format!("{}_session_id", self.key_prefix)
    }

    fn userdata_key(&self, id: &str) -> String {
        format!("{}_userdata_{}", self.key_prefix, id)
    }

    // =========================================================================
    // Session registry
    // =========================================================================

    /// All registered sessions, in creation order.
    pub fn sessions(&self) -> VaultResult<Vec<SessionRecord>> {
        match self.store.get(&self.sessions_key())? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| VaultError::Corrupted(format!("Session registry: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    fn save_sessions(&mut self, sessions: &[SessionRecord]) -> VaultResult<()> {
        let raw = serde_json::to_string(sessions)?;
        let key = self.sessions_key();
        self.store.set(&key, &raw)
    }

    fn find_session(&self, id: &str) -> VaultResult<SessionRecord> {
        self.sessions()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| VaultError::SessionNotFound(id.to_string()))
    }

    /// Make `id` the active session. The PIN is checked later by [`Self::unlock`].
    pub fn select_session(&mut self, id: &str) -> VaultResult<()> {
        self.find_session(id)?;
        let key = self.active_key();
        self.store.set(&key, id)?;
        debug!("Selected session {}", id);
        Ok(())
    }

    pub fn active_session_id(&self) -> VaultResult<Option<String>> {
        self.store.get(&self.active_key())
    }

    /// Id of the active session, or [`VaultError::NoActiveSession`].
    pub fn require_active_session(&self) -> VaultResult<String> {
        self.active_session_id()?
            .ok_or(VaultError::NoActiveSession)
    }

    /// Forget which session is active. Stored sessions are untouched.
    pub fn logout(&mut self) -> VaultResult<()> {
        let key = self.active_key();
        self.store.remove(&key)?;
        info!("Logged out");
        Ok(())
    }

    // =========================================================================
    // Encrypted wallet data
    // =========================================================================

    fn seal_record(&mut self, record: &WalletRecord, pin: &str) -> VaultResult<()> {
        let plaintext = Zeroizing::new(serde_json::to_string(record)?);
        let envelope = encrypt_data(&plaintext, pin)?;
        let key = self.userdata_key(&record.address);
        self.store.set(&key, &envelope)
    }

    /// Encrypt `wallet` under `pin`, register it and make it active.
    ///
    /// Refuses with [`VaultError::AlreadyExists`] if a session or envelope
    /// already exists for the address; existing wallets are changed through
    /// [`Self::update_wallet`] or [`Self::change_pin`], which need the PIN.
    pub fn create_session(&mut self, wallet: &WalletRecord, pin: &str) -> VaultResult<SessionRecord> {
        if wallet.address.is_empty() {
            return Err(VaultError::InvalidRecord("address is required".into()));
        }
        self.policy.check(pin)?;

        let mut sessions = self.sessions()?;
        let registered = sessions.iter().any(|s| s.id == wallet.address);
        let has_data = self.store.get(&self.userdata_key(&wallet.address))?.is_some();
        if registered || has_data {
            warn!("Refusing to overwrite session {}", wallet.address);
            return Err(VaultError::AlreadyExists(wallet.address.clone()));
        }

        self.seal_record(wallet, pin)?;

        let record = SessionRecord {
            id: wallet.address.clone(),
            name: wallet.name.clone(),
            created: Utc::now(),
        };
        sessions.push(record.clone());
        self.save_sessions(&sessions)?;

        let key = self.active_key();
        self.store.set(&key, &record.id)?;

        info!("Created session {}", record.id);
        Ok(record)
    }

    /// Decrypt the session's wallet. A wrong PIN is
    /// [`VaultError::AuthenticationFailure`].
    pub fn unlock(&self, id: &str, pin: &str) -> VaultResult<WalletRecord> {
        let envelope = self
            .store
            .get(&self.userdata_key(id))?
            .ok_or_else(|| VaultError::SessionNotFound(id.to_string()))?;

        let plaintext = Zeroizing::new(decrypt_data(&envelope, pin)?);
        let record: WalletRecord = serde_json::from_str(&plaintext)
            .map_err(|e| VaultError::Corrupted(format!("Wallet record: {}", e)))?;

        debug!("Unlocked session {}", id);
        Ok(record)
    }

    /// Decrypt, apply `update`, and store under a fresh envelope.
    ///
    /// The address is the session id and cannot be changed.
    pub fn update_wallet<F>(&mut self, id: &str, pin: &str, update: F) -> VaultResult<WalletRecord>
    where
        F: FnOnce(&mut WalletRecord),
    {
        let mut record = self.unlock(id, pin)?;
        update(&mut record);

        if record.address != id {
            return Err(VaultError::InvalidRecord("address cannot be changed".into()));
        }

        self.seal_record(&record, pin)?;
        debug!("Updated session {}", id);
        Ok(record)
    }

    /// Re-encrypt the session's wallet under `new_pin`.
    pub fn change_pin(&mut self, id: &str, old_pin: &str, new_pin: &str) -> VaultResult<()> {
        self.policy.check(new_pin)?;
        let record = self.unlock(id, old_pin)?;
        self.seal_record(&record, new_pin)?;
        info!("Changed PIN for session {}", id);
        Ok(())
    }

    /// Delete a session's envelope and registry entry.
    pub fn remove_session(&mut self, id: &str) -> VaultResult<()> {
        let mut sessions = self.sessions()?;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);

        let key = self.userdata_key(id);
        let had_data = self.store.get(&key)?.is_some();
        if before == sessions.len() && !had_data {
            return Err(VaultError::SessionNotFound(id.to_string()));
        }

        self.store.remove(&key)?;
        self.save_sessions(&sessions)?;

        if self.active_session_id()?.as_deref() == Some(id) {
            self.logout()?;
        }

        info!("Removed session {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::MemoryStore;

    const PIN: &str = "123456";

    fn alice() -> WalletRecord {
        WalletRecord::new(
            "alice",
            "0xA11CE",
            "deadbeef",
            "one two three four five six seven eight nine ten eleven twelve",
        )
    }

    fn manager_with_alice() -> SessionManager<MemoryStore> {
        let mut manager = SessionManager::new(MemoryStore::new());
        manager.create_session(&alice(), PIN).unwrap();
        manager
    }

    #[test]
    fn test_create_session_registers_and_activates() {
        let manager = manager_with_alice();

        let sessions = manager.sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "0xA11CE");
        assert_eq!(sessions[0].name, "alice");
        assert_eq!(manager.active_session_id().unwrap().as_deref(), Some("0xA11CE"));

        let stored = manager.store().get("goodvibe_userdata_0xA11CE").unwrap().unwrap();
        assert!(!stored.contains("deadbeef"));
        assert!(manager.store().keys().all(|k| !k.contains("pin")));
    }

    #[test]
    fn test_unlock_with_correct_and_wrong_pin() {
        let manager = manager_with_alice();

        assert_eq!(manager.unlock("0xA11CE", PIN).unwrap(), alice());

        let err = manager.unlock("0xA11CE", "654321").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }

    #[test]
    fn test_weak_pin_rejected_before_anything_is_stored() {
        let mut manager = SessionManager::new(MemoryStore::new());
        let err = manager.create_session(&alice(), "1234").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WeakPin);
        assert!(manager.store().is_empty());
    }

    #[test]
    fn test_create_refuses_existing_session() {
        let mut manager = manager_with_alice();
        let first = manager.sessions().unwrap()[0].clone();
        let envelope = manager.store().get("goodvibe_userdata_0xA11CE").unwrap();

        let mallory = WalletRecord::new("mallory", "0xA11CE", "bb", "");
        let err = manager.create_session(&mallory, "999999").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        assert_eq!(manager.sessions().unwrap(), vec![first]);
        assert_eq!(manager.store().get("goodvibe_userdata_0xA11CE").unwrap(), envelope);
        assert_eq!(manager.unlock("0xA11CE", PIN).unwrap(), alice());
        assert!(manager.unlock("0xA11CE", "999999").is_err());
    }

    #[test]
    fn test_create_refuses_orphaned_envelope() {
        let mut store = MemoryStore::new();
        store.set("goodvibe_userdata_0xA11CE", "ZW52ZWxvcGU=").unwrap();
        let mut manager = SessionManager::new(store);

        let err = manager.create_session(&alice(), PIN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(
            manager.store().get("goodvibe_userdata_0xA11CE").unwrap().as_deref(),
            Some("ZW52ZWxvcGU=")
        );
        assert!(manager.sessions().unwrap().is_empty());
    }

    #[test]
    fn test_update_wallet_reencrypts_with_fresh_envelope() {
        let mut manager = manager_with_alice();
        let before = manager.store().get("goodvibe_userdata_0xA11CE").unwrap();

        let updated = manager
            .update_wallet("0xA11CE", PIN, |w| w.avatar_hash = Some("QmAvatar".into()))
            .unwrap();
        assert_eq!(updated.avatar_hash.as_deref(), Some("QmAvatar"));

        let after = manager.store().get("goodvibe_userdata_0xA11CE").unwrap();
        assert_ne!(before, after);
        assert_eq!(
            manager.unlock("0xA11CE", PIN).unwrap().avatar_hash.as_deref(),
            Some("QmAvatar")
        );
    }

    #[test]
    fn test_update_wallet_cannot_change_address() {
        let mut manager = manager_with_alice();
        let err = manager
            .update_wallet("0xA11CE", PIN, |w| w.address = "0xB0B".into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRecord);
        assert_eq!(manager.unlock("0xA11CE", PIN).unwrap().address, "0xA11CE");
    }

    #[test]
    fn test_change_pin() {
        let mut manager = manager_with_alice();

        assert!(manager.change_pin("0xA11CE", "000000", "7654321").is_err());
        assert!(manager.change_pin("0xA11CE", PIN, "12").is_err());

        manager.change_pin("0xA11CE", PIN, "7654321").unwrap();
        assert!(manager.unlock("0xA11CE", PIN).is_err());
        assert_eq!(manager.unlock("0xA11CE", "7654321").unwrap(), alice());
    }

    #[test]
    fn test_select_and_logout() {
        let mut manager = manager_with_alice();
        manager.logout().unwrap();
        assert_eq!(
            manager.require_active_session().unwrap_err().kind(),
            ErrorKind::NoActiveSession
        );

        manager.select_session("0xA11CE").unwrap();
        assert_eq!(manager.require_active_session().unwrap(), "0xA11CE");

        let err = manager.select_session("0xNOPE").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
    }

    #[test]
    fn test_remove_session() {
        let mut manager = manager_with_alice();
        manager.remove_session("0xA11CE").unwrap();

        assert!(manager.sessions().unwrap().is_empty());
        assert_eq!(manager.active_session_id().unwrap(), None);
        assert_eq!(
            manager.unlock("0xA11CE", PIN).unwrap_err().kind(),
            ErrorKind::SessionNotFound
        );
        assert_eq!(
            manager.remove_session("0xA11CE").unwrap_err().kind(),
            ErrorKind::SessionNotFound
        );
    }

    /// Memory store whose `remove` always fails.
    struct NoRemoveStore(MemoryStore);

    impl KeyValueStore for NoRemoveStore {
        fn get(&self, key: &str) -> VaultResult<Option<String>> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> VaultResult<()> {
            self.0.set(key, value)
        }

        fn remove(&mut self, key: &str) -> VaultResult<()> {
            Err(VaultError::Storage(format!("cannot remove {}", key)))
        }
    }

    #[test]
    fn test_failed_remove_keeps_session_listed() {
        let mut manager = SessionManager::new(NoRemoveStore(MemoryStore::new()));
        manager.create_session(&alice(), PIN).unwrap();

        let err = manager.remove_session("0xA11CE").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        let sessions = manager.sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "0xA11CE");
        assert_eq!(manager.unlock("0xA11CE", PIN).unwrap(), alice());
    }

    #[test]
    fn test_corrupted_registry_is_reported() {
        let mut store = MemoryStore::new();
        store.set("goodvibe_sessions", "{oops").unwrap();
        let manager = SessionManager::new(store);
        assert_eq!(manager.sessions().unwrap_err().kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_custom_prefix_and_policy() {
        let settings = VaultSettings {
            key_prefix: "test".into(),
            min_pin_length: 4,
            digits_only_pin: true,
        };
        let mut manager = SessionManager::with_settings(MemoryStore::new(), &settings);
        manager.create_session(&alice(), "4321").unwrap();
        assert!(manager.store().get("test_userdata_0xA11CE").unwrap().is_some());
        assert!(manager.store().get("goodvibe_sessions").unwrap().is_none());
    }

    #[test]
    fn test_empty_address_rejected() {
        let mut manager = SessionManager::new(MemoryStore::new());
        let wallet = WalletRecord::new("nobody", "", "00", "");
        assert_eq!(
            manager.create_session(&wallet, PIN).unwrap_err().kind(),
            ErrorKind::InvalidRecord
        );
    }
}
