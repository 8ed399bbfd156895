/*
[INPUT]:  Wallet session maps and a durable key-value backend
[OUTPUT]: Persisted sessions that survive process restarts
[POS]:    Session layer - durable storage for per-wallet tokens
[UPDATE]: When the storage key or serialization format changes
*/

use std::collections::HashMap;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::warn;

use crate::http::{Result, SessionError};

/// Storage key holding the serialized session map
const SESSION_STORE_KEY: &str = "satgate.sessions";

/// Durable key-value storage supplied by the host application
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

/// File-backed store keeping one file per key under a directory.
///
/// Values are owner-readable only; session tokens land here.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::Storage(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| SessionError::Storage(e.to_string()))?;
        }

        let path = self.key_path(key);
        fs::write(&path, value).map_err(|e| SessionError::Storage(e.to_string()))?;

        let mut perms = fs::metadata(&path)
            .map_err(|e| SessionError::Storage(e.to_string()))?
            .permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms).map_err(|e| SessionError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Storage(e.to_string())),
        }
    }
}

/// Durable mapping from wallet identifier to last-known bearer token
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the persisted session map.
    ///
    /// Missing or corrupt data yields an empty map; startup never fails on
    /// stale storage.
    pub async fn load(&self) -> HashMap<String, String> {
        let raw = match self.store.get(SESSION_STORE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashMap::new(),
            Err(e) => {
                warn!(error = %e, "session store read failed");
                return HashMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "discarding corrupt session data");
                HashMap::new()
            }
        }
    }

    /// Overwrite the persisted session map
    pub async fn save(&self, sessions: &HashMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string(sessions)?;
        self.store.set(SESSION_STORE_KEY, &raw).await
    }

    /// Remove all persisted sessions
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(SESSION_STORE_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("satgate-test-{}", Uuid::new_v4()));
        path
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));

        let mut sessions = HashMap::new();
        sessions.insert("w1".to_string(), "token-1".to_string());
        store.save(&sessions).await.unwrap();

        assert_eq!(store.load().await, sessions);

        store.clear().await.unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_data_loads_empty() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_data_loads_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(SESSION_STORE_KEY, "{not json").await.unwrap();

        let store = SessionStore::new(kv);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_lifecycle() {
        let dir = temp_dir();
        let kv = FileStore::new(&dir);

        assert_eq!(kv.get("satgate.sessions").await.unwrap(), None);

        kv.set("satgate.sessions", r#"{"w1":"token-1"}"#).await.unwrap();
        assert_eq!(
            kv.get("satgate.sessions").await.unwrap().as_deref(),
            Some(r#"{"w1":"token-1"}"#)
        );

        let metadata = fs::metadata(dir.join("satgate.sessions")).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);

        kv.remove("satgate.sessions").await.unwrap();
        assert_eq!(kv.get("satgate.sessions").await.unwrap(), None);

        // removing an absent key is not an error
        kv.remove("satgate.sessions").await.unwrap();

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = temp_dir();

        let mut sessions = HashMap::new();
        sessions.insert("w1".to_string(), "token-1".to_string());

        let store = SessionStore::new(Arc::new(FileStore::new(&dir)));
        store.save(&sessions).await.unwrap();

        let reopened = SessionStore::new(Arc::new(FileStore::new(&dir)));
        assert_eq!(reopened.load().await, sessions);

        fs::remove_dir_all(dir).unwrap();
    }
}
