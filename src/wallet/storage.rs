use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key under which the last-used provider id is persisted.
pub const LAST_WALLET_KEY: &str = "gorbagana_last_wallet";

const STORE_FILE: &str = "local_storage.json";

/// Durable string key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Key/value store persisted as a JSON object on disk
pub struct FileStore {
    file_path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (or lazily create) a store inside `storage_dir`
    pub fn new(storage_dir: impl AsRef<Path>) -> Result<Self> {
        let storage_path = storage_dir.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        if !storage_path.exists() {
            std::fs::create_dir_all(&storage_path)?;
        }

        Ok(Self {
            file_path: storage_path.join(STORE_FILE),
            lock: Mutex::new(()),
        })
    }

    /// Get default storage path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".gorbagana-wallet"))
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.file_path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read(&self.file_path)?;
        if content.is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_slice(&content)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_vec_pretty(entries)?;
        let tmp = self.file_path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(tmp, &self.file_path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("Storage lock poisoned"))?;
        let mut entries = self.read_all()?;
        apply(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("Storage lock poisoned"))?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// Process-local store
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| anyhow!("Storage lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("Storage lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("Storage lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();

        let store = FileStore::new(temp_dir.path()).unwrap();
        assert_eq!(store.get(LAST_WALLET_KEY).unwrap(), None);
        store.set(LAST_WALLET_KEY, "backpack").unwrap();

        let reopened = FileStore::new(temp_dir.path()).unwrap();
        assert_eq!(reopened.get(LAST_WALLET_KEY).unwrap(), Some("backpack".to_string()));

        reopened.remove(LAST_WALLET_KEY).unwrap();
        assert_eq!(store.get(LAST_WALLET_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        let store = FileStore::new(&nested).unwrap();
        store.set("k", "v").unwrap();
        assert!(nested.join(STORE_FILE).exists());
    }

    #[test]
    fn test_corrupted_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(STORE_FILE), b"{not json").unwrap();

        let store = FileStore::new(temp_dir.path()).unwrap();
        assert!(store.get(LAST_WALLET_KEY).is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("2".to_string()));
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }
}
