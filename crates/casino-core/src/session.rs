//! The single operator session and its durable storage.
//!
//! The store starts from whatever was persisted last time (no freshness check)
//! and only `login`/`logout`/`set_base_url` mutate it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::StorageError;

pub const STORAGE_TOKEN: &str = "casino.auth.token";
pub const STORAGE_USER: &str = "casino.auth.user";
pub const STORAGE_BASE: &str = "casino.auth.base";

/// Durable key-value storage that survives restarts.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// JSON object file, rewritten through a temp file and rename on every change.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = entries.len(), "opened session storage");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// In-process storage for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .remove(key);
        Ok(())
    }
}

impl<S: SessionStorage + ?Sized> SessionStorage for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Current operator credentials and backend address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub username: Option<String>,
    /// Empty means "use the proxy origin".
    pub base_url: String,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    session: Session,
}

impl SessionStore {
    /// Restore the persisted session, if any.
    pub fn load(storage: Box<dyn SessionStorage>) -> Self {
        let session = Session {
            token: storage.get(STORAGE_TOKEN),
            username: storage.get(STORAGE_USER),
            base_url: storage.get(STORAGE_BASE).unwrap_or_default(),
        };
        Self { storage, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Record a session whose token the backend has already accepted.
    pub fn login(&mut self, username: &str, token: &str, base_url: &str) -> Result<(), StorageError> {
        self.storage.set(STORAGE_TOKEN, token)?;
        self.storage.set(STORAGE_USER, username)?;
        self.storage.set(STORAGE_BASE, base_url)?;
        self.session = Session {
            token: Some(token.to_string()),
            username: Some(username.to_string()),
            base_url: base_url.to_string(),
        };
        info!(user = username, base_url, "logged in");
        Ok(())
    }

    /// Forget the credentials. The base URL is kept so it need not be retyped.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.storage.remove(STORAGE_TOKEN)?;
        self.storage.remove(STORAGE_USER)?;
        let user = self.session.username.take();
        self.session.token = None;
        info!(user = user.as_deref().unwrap_or("-"), "logged out");
        Ok(())
    }

    pub fn set_base_url(&mut self, base_url: &str) -> Result<(), StorageError> {
        self.storage.set(STORAGE_BASE, base_url)?;
        self.session.base_url = base_url.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_fresh_store_is_logged_out() {
        let store = SessionStore::load(Box::new(MemoryStorage::new()));
        assert!(!store.is_authenticated());
        assert_eq!(store.session(), &Session::default());
    }

    #[test]
    fn test_login_persists_across_reload() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SessionStore::load(Box::new(storage.clone()));
        store.login("admin", "Basic YWRtaW46YWRtaW4=", "http://mis:8080").unwrap();

        let reloaded = SessionStore::load(Box::new(storage));
        assert_eq!(reloaded.session(), store.session());
        assert_eq!(reloaded.session().token(), Some("Basic YWRtaW46YWRtaW4="));
    }

    #[test]
    fn test_logout_keeps_base_url() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SessionStore::load(Box::new(storage.clone()));
        store.login("admin", "Basic x", "http://mis").unwrap();
        store.logout().unwrap();

        assert!(!store.is_authenticated());
        assert_eq!(store.session().username, None);
        assert_eq!(store.session().base_url, "http://mis");
        assert_eq!(storage.get(STORAGE_TOKEN), None);
        assert_eq!(storage.get(STORAGE_USER), None);
        assert_eq!(storage.get(STORAGE_BASE).as_deref(), Some("http://mis"));

        let reloaded = SessionStore::load(Box::new(storage));
        assert!(!reloaded.is_authenticated());
        assert_eq!(reloaded.session().base_url, "http://mis");
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut store = SessionStore::load(Box::new(FileStorage::open(&path).unwrap()));
        store.login("pit-boss", "Basic cGl0OmJvc3M=", "").unwrap();
        assert!(path.exists());

        let reloaded = SessionStore::load(Box::new(FileStorage::open(&path).unwrap()));
        assert_eq!(reloaded.session().username.as_deref(), Some("pit-boss"));
        assert_eq!(reloaded.session().base_url, "");
        assert!(reloaded.is_authenticated());
    }

    #[test]
    fn test_file_storage_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(FileStorage::open(&path), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_set_base_url_while_logged_in() {
        let mut store = SessionStore::load(Box::new(MemoryStorage::new()));
        store.login("admin", "Basic x", "").unwrap();
        store.set_base_url("http://other").unwrap();
        assert_eq!(store.session().base_url, "http://other");
        assert!(store.is_authenticated());
    }
}
