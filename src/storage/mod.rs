//! Local chat-history storage
//!
//! Chat sessions live in a small string key-value store, the same way the web
//! client keeps them in browser local storage. The store is a trait so the
//! [`SessionStore`] can run over a durable `sled` database in the CLI and over
//! an in-memory map in tests.

use crate::error::{Result, TravelChatError};
use directories::ProjectDirs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub mod recency;
pub mod session_store;
pub mod title;
pub mod types;

pub use recency::{group_by_recency, RecencyBucket};
pub use session_store::{SessionStore, CURRENT_SESSION_KEY, DEFAULT_MAX_SESSIONS, SESSIONS_KEY};
pub use title::{generate_title, DEFAULT_TITLE};
pub use types::{
    new_session_id, now_millis, ChatMessage, ChatSession, MessageKind, MessageRole, GREETING_ID,
    GREETING_TEXT,
};

/// String key-value substrate for persisted state
///
/// Implementations complete every call before returning; there is no
/// buffering that a caller could observe.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Durable key-value store backed by an embedded `sled` database
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
}

impl SledStore {
    /// Open or create a store in the given directory
    ///
    /// # Errors
    ///
    /// Returns `TravelChatError::StorageUnavailable` if the database cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use travelchat::storage::SledStore;
    ///
    /// # fn main() -> travelchat::error::Result<()> {
    /// let dir = tempfile::tempdir()?;
    /// let store = SledStore::open(dir.path().join("history"))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TravelChatError::StorageUnavailable(format!(
                    "Failed to create storage directory: {}",
                    e
                ))
            })?;
        }

        let db = sled::open(&path).map_err(|e| {
            TravelChatError::StorageUnavailable(format!("Failed to open database: {}", e))
        })?;
        tracing::debug!("Opened chat history store at {}", path.display());

        Ok(Self { db, path })
    }

    /// Open the store in the user's data directory
    pub fn open_default() -> Result<Self> {
        Self::open(default_storage_path()?)
    }

    /// Location of the database directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let bytes = self
            .db
            .get(key.as_bytes())
            .map_err(|e| TravelChatError::StorageUnavailable(format!("Get failed: {}", e)))?;

        match bytes {
            Some(bytes) => {
                let value = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    TravelChatError::MalformedRecord(format!("Value for {} is not UTF-8: {}", key, e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| TravelChatError::StorageUnavailable(format!("Insert failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| TravelChatError::StorageUnavailable(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| TravelChatError::StorageUnavailable(format!("Remove failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| TravelChatError::StorageUnavailable(format!("Flush failed: {}", e)))?;

        Ok(())
    }
}

/// In-memory key-value store
///
/// An optional byte quota makes oversized writes fail the way a full browser
/// storage area does.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects any single value larger than `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| {
            TravelChatError::StorageUnavailable("Failed to acquire read lock".to_string())
        })?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            if value.len() > quota {
                return Err(TravelChatError::StorageUnavailable(format!(
                    "Quota exceeded: {} bytes > {} bytes",
                    value.len(),
                    quota
                ))
                .into());
            }
        }

        let mut entries = self.entries.write().map_err(|_| {
            TravelChatError::StorageUnavailable("Failed to acquire write lock".to_string())
        })?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| {
            TravelChatError::StorageUnavailable("Failed to acquire write lock".to_string())
        })?;
        entries.remove(key);
        Ok(())
    }
}

/// Default chat-history location inside the user's data directory
pub fn default_storage_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "travelchat", "travelchat").ok_or_else(|| {
        TravelChatError::StorageUnavailable("Could not determine data directory".into())
    })?;
    Ok(proj_dirs.data_dir().join("history"))
}
