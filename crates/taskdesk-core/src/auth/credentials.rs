use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::storage::{StorageError, TokenStorage};

/// Storage key holding the persisted credential pair
pub const TOKEN_KEY: &str = "token";

/// Access and refresh credentials, always held together.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    access_token: String,
    refresh_token: String,
}

impl CredentialPair {
    /// Returns `None` if either credential is empty; a half pair is anonymous.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Option<Self> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        if access_token.is_empty() || refresh_token.is_empty() {
            return None;
        }
        Some(Self {
            access_token,
            refresh_token,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// On-disk shape of the persisted pair.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedRecord {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

impl PersistedRecord {
    fn from_pair(pair: &CredentialPair) -> Self {
        Self {
            access_token: Some(pair.access_token.clone()),
            refresh_token: Some(pair.refresh_token.clone()),
            saved_at: Some(Utc::now()),
        }
    }

    fn into_pair(self) -> Option<CredentialPair> {
        CredentialPair::new(self.access_token?, self.refresh_token?)
    }
}

/// Holds the current credential pair and mirrors it into durable storage.
///
/// This is the only component that reads or writes persisted credentials.
/// Writers hold the lock across the in-memory swap and the storage write, so
/// `get` never observes a pair that is only half replaced. Records are
/// encoded before the lock is taken; only the backend write happens under it.
pub struct CredentialStore {
    storage: Arc<dyn TokenStorage>,
    current: RwLock<Option<CredentialPair>>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Option<CredentialPair> {
        self.current.read().clone()
    }

    /// A pair is currently held.
    pub fn is_active(&self) -> bool {
        self.current.read().is_some()
    }

    /// Replace the pair in memory and in storage.
    ///
    /// The in-memory pair is updated even if persisting fails; the error is
    /// returned so the caller can report it.
    pub fn set(&self, pair: CredentialPair) -> Result<(), StorageError> {
        let encoded = Self::encode(&pair);
        // Held across the storage write so memory and storage change together
        let mut current = self.current.write();
        let result = encoded.and_then(|contents| self.storage.set(TOKEN_KEY, &contents));
        *current = Some(pair);
        result
    }

    /// Replace the pair only if the stored refresh credential is still
    /// `expected_refresh`. Returns whether the swap happened.
    pub fn replace_if(&self, expected_refresh: &str, pair: CredentialPair) -> Result<bool, StorageError> {
        let encoded = Self::encode(&pair);
        let mut current = self.current.write();
        match current.as_ref() {
            Some(existing) if existing.refresh_token == expected_refresh => {
                let result = encoded.and_then(|contents| self.storage.set(TOKEN_KEY, &contents));
                *current = Some(pair);
                result.map(|_| true)
            }
            _ => Ok(false),
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        let mut current = self.current.write();
        *current = None;
        self.storage.remove(TOKEN_KEY)
    }

    /// Load the persisted pair into memory. Called once at startup.
    ///
    /// A record that is unreadable, or missing either credential, is treated
    /// as anonymous.
    pub fn hydrate(&self) -> Result<Option<CredentialPair>, StorageError> {
        let raw = self.storage.get(TOKEN_KEY)?;
        let pair = match raw {
            Some(contents) => match serde_json::from_str::<PersistedRecord>(&contents) {
                Ok(record) => {
                    let pair = record.into_pair();
                    if pair.is_none() {
                        warn!("Persisted credential record is incomplete, ignoring");
                    }
                    pair
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse persisted credentials, ignoring");
                    None
                }
            },
            None => None,
        };

        debug!(found = pair.is_some(), "Credential store hydrated");
        *self.current.write() = pair.clone();
        Ok(pair)
    }

    fn encode(pair: &CredentialPair) -> Result<String, StorageError> {
        Ok(serde_json::to_string(&PersistedRecord::from_pair(pair))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::{FileStorage, MemoryStorage};

    fn pair(access: &str, refresh: &str) -> CredentialPair {
        CredentialPair::new(access, refresh).unwrap()
    }

    #[test]
    fn test_partial_pair_is_rejected() {
        assert!(CredentialPair::new("", "r1").is_none());
        assert!(CredentialPair::new("a1", "").is_none());
    }

    #[test]
    fn test_set_get_clear() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CredentialStore::new(storage.clone());
        assert!(store.get().is_none());

        store.set(pair("a1", "r1")).unwrap();
        assert_eq!(store.get(), Some(pair("a1", "r1")));
        assert!(storage.get(TOKEN_KEY).unwrap().is_some());

        store.clear().unwrap();
        assert!(store.get().is_none());
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_persistence_survives_reload() {
        let dir = tempfile::tempdir().unwrap();

        let store = CredentialStore::new(Arc::new(FileStorage::new(dir.path().to_path_buf())));
        store.set(pair("a1", "r1")).unwrap();

        // Fresh store over the same directory simulates a restart
        let reloaded = CredentialStore::new(Arc::new(FileStorage::new(dir.path().to_path_buf())));
        assert!(reloaded.get().is_none());
        let hydrated = reloaded.hydrate().unwrap();
        assert_eq!(hydrated, Some(pair("a1", "r1")));
        assert_eq!(reloaded.get(), Some(pair("a1", "r1")));
    }

    #[test]
    fn test_hydrate_treats_partial_record_as_anonymous() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(TOKEN_KEY, r#"{"accessToken": "a1"}"#)
            .unwrap();

        let store = CredentialStore::new(storage);
        assert!(store.hydrate().unwrap().is_none());
        assert!(!store.is_active());
    }

    #[test]
    fn test_hydrate_ignores_corrupt_record() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "not json").unwrap();

        let store = CredentialStore::new(storage);
        assert!(store.hydrate().unwrap().is_none());
    }

    #[test]
    fn test_hydrate_accepts_record_without_timestamp() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(TOKEN_KEY, r#"{"accessToken": "a1", "refreshToken": "r1"}"#)
            .unwrap();

        let store = CredentialStore::new(storage);
        assert_eq!(store.hydrate().unwrap(), Some(pair("a1", "r1")));
    }

    #[test]
    fn test_replace_if_requires_matching_refresh() {
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
        store.set(pair("a1", "r1")).unwrap();

        assert!(!store.replace_if("other", pair("a2", "r2")).unwrap());
        assert_eq!(store.get(), Some(pair("a1", "r1")));

        assert!(store.replace_if("r1", pair("a2", "r2")).unwrap());
        assert_eq!(store.get(), Some(pair("a2", "r2")));

        store.clear().unwrap();
        assert!(!store.replace_if("r2", pair("a3", "r3")).unwrap());
        assert!(store.get().is_none());
    }

    /// Accepts reads, fails every write.
    struct ReadOnlyStorage;

    impl TokenStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Keyring("keychain locked".into()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_still_updates_memory() {
        let store = CredentialStore::new(Arc::new(ReadOnlyStorage));

        assert!(matches!(store.set(pair("a1", "r1")), Err(StorageError::Keyring(_))));
        assert_eq!(store.get(), Some(pair("a1", "r1")));

        assert!(store.replace_if("r1", pair("a2", "r2")).is_err());
        assert_eq!(store.get(), Some(pair("a2", "r2")));

        // A rejected swap touches neither memory nor storage
        assert!(!store.replace_if("r1", pair("a3", "r3")).unwrap());
        assert_eq!(store.get(), Some(pair("a2", "r2")));
    }

    #[test]
    fn test_stored_record_matches_memory_after_swap() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CredentialStore::new(storage.clone());
        store.set(pair("a1", "r1")).unwrap();

        assert!(store.replace_if("r1", pair("a2", "r2")).unwrap());

        let reloaded = CredentialStore::new(storage);
        assert_eq!(reloaded.hydrate().unwrap(), store.get());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", pair("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret"));
    }
}
