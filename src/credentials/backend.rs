//! Key-value storage backends for the persisted credential.
//!
//! - `FileStore`: one JSON file per key inside the config directory
//! - `KeyringStore`: OS keychain (Secret Service, macOS Keychain, Windows Credential Manager)
//! - `MemoryStore`: process-local map, used by tests

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable string storage addressed by key.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing whatever was there.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let value = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create {}", self.dir.display()))?;

        let path = self.path_for(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Cannot write {}", path.display()))?;

        // Token inside: owner-only on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Cannot remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// Stores each key as a keychain entry under one service name.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key)
            .with_context(|| format!("Cannot open keyring entry {}/{}", self.service, key))
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Cannot read from keyring"),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Cannot write to keyring")
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Cannot delete from keyring"),
        }
    }
}

/// In-memory store. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_lifecycle() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::new(temp_dir.path().join("nested"));

        assert_eq!(store.get("k")?, None);
        store.set("k", "v1")?;
        store.set("k", "v2")?;
        assert_eq!(store.get("k")?, Some("v2".to_string()));

        store.remove("k")?;
        assert_eq!(store.get("k")?, None);
        // Removing twice is fine
        store.remove("k")?;

        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_file_store_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let temp_dir = TempDir::new()?;
        let store = FileStore::new(temp_dir.path());
        store.set("newsbot_config", "{}")?;

        let mode = std::fs::metadata(temp_dir.path().join("newsbot_config.json"))?
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);

        Ok(())
    }

    #[test]
    fn test_boxed_store_delegates() -> Result<()> {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        store.set("a", "1")?;
        assert_eq!(store.get("a")?, Some("1".to_string()));
        store.remove("a")?;
        assert_eq!(store.get("a")?, None);
        Ok(())
    }
}
