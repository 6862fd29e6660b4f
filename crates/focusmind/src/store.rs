//! Persistent key-value storage
//!
//! Every component reads and writes its own keys in one flat namespace.
//! There are no transactions: a write to a key replaces the whole value.
//! - `MemoryStore`: process-local, used by tests and ephemeral runs
//! - `JsonFileStore`: one JSON object on disk, ~/.local/share/focusmind/storage.json

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{FocusMindError, Result};

/// Storage keys, shared with the UI surfaces
pub mod keys {
    pub const FOCUS_MODE_ACTIVE: &str = "focusModeActive";
    pub const BLOCKED_SITES: &str = "blockedSites";
    pub const NOTES: &str = "notes";
    pub const TOTAL_FOCUS_TIME: &str = "totalFocusTime";
    pub const DISTRACTIONS_BLOCKED: &str = "distractionsBlocked";
    /// Wall-clock start of the running focus session
    pub const FOCUS_SESSION_START: &str = "focusSessionStart";
}

/// Async get/set over named keys
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read one key; `None` when it was never written
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write every entry of `items`, replacing existing values
    async fn set(&self, items: Map<String, Value>) -> Result<()>;
}

/// Read a key and deserialize it
pub async fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| FocusMindError::Storage(format!("Failed to decode '{}': {}", key, e))),
    }
}

/// Read a key, falling back to `T::default()` when absent
pub async fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> Result<T> {
    Ok(load(store, key).await?.unwrap_or_default())
}

/// Serialize a value and write it under one key
pub async fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let mut items = Map::new();
    items.insert(key.to_string(), serde_json::to_value(value)?);
    store.set(items).await
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`
    pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let mut entries = self.entries.write().await;
        for (key, value) in items {
            entries.insert(key, value);
        }
        Ok(())
    }
}

/// Store persisted as a single JSON object file
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes file access within this process
    io: Mutex<()>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            io: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(FocusMindError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(FocusMindError::Storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(FocusMindError::Storage(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        let storage_err = |e: std::io::Error| {
            FocusMindError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage_err)?;
        }

        let content = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(storage_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(storage_err)
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let _io = self.io.lock().await;
        let map = self.read_all().await?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let _io = self.io.lock().await;
        let mut map = self.read_all().await?;
        for (key, value) in items {
            debug!(key = %key, "storage write");
            map.insert(key, value);
        }
        self.write_all(&map).await
    }
}
