//! Persistent key-value storage for license state.
//!
//! The client persists three small values (demo start date, license key and
//! the cached check result) through the [`KeyValueStore`] trait.
//!
//! ## Implementations
//!
//! **[`FileStore`]:** a single JSON document in the app data directory.
//! - Windows: `%APPDATA%\slm_client\`
//! - macOS: `~/Library/Application Support/slm_client/`
//! - Linux: `~/.local/share/slm_client/`
//!
//! **[`MemoryStore`]:** process-local map, shared between clones.

use crate::errors::{LicenseError, LicenseResult};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;

/// File name of the on-disk store.
const STORE_FILE: &str = "slm_store.json";

/// Directory name under the platform data directory.
const APP_DIR: &str = "slm_client";

/// Durable string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> LicenseResult<Option<String>>;

    /// Write a value, replacing any existing one.
    async fn set(&self, key: &str, value: &str) -> LicenseResult<()>;

    /// Remove a value. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> LicenseResult<()>;
}

/// Get the application data directory for the client.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join(APP_DIR))
}

// === File Store ===

/// JSON-file backed store.
///
/// Every operation re-reads the file, so separate processes sharing the same
/// directory observe each other's writes (last write wins).
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store inside `dir`, creating the directory on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE),
        }
    }

    /// Store inside the platform data directory.
    pub fn in_data_dir() -> LicenseResult<Self> {
        let dir = default_data_dir().ok_or_else(|| {
            LicenseError::StorageError(std::io::Error::new(
                ErrorKind::NotFound,
                "Could not determine app data directory",
            ))
        })?;
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> LicenseResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path).await {
            Ok(data) if data.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(LicenseError::StorageError(e)),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> LicenseResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec_pretty(entries)?;
        // Write beside the target and rename over it so a crash never
        // leaves a half-written store behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> LicenseResult<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> LicenseResult<()> {
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await?;
        tracing::trace!(key, path = %self.path.display(), "stored value");
        Ok(())
    }

    async fn delete(&self, key: &str) -> LicenseResult<()> {
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

// === Memory Store ===

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous peek, for tests and diagnostics.
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> LicenseResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> LicenseResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> LicenseResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}
