use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;

use crate::error::{Error, Result};

pub const RULES_KEY: &str = "universal-theme-editor-rules";
pub const ORIGINAL_VALUES_KEY: &str = "universal-theme-editor-original";
pub const FORCE_IMPORTANT_KEY: &str = "ote-force-important";
pub const DEBUG_MODE_KEY: &str = "ote-debug-mode";

/// String key-value persistence, the equivalent of extension storage.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Keeps everything in memory. Used for ephemeral sessions and in tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: IndexMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores all keys in one JSON object file. The file and its parent directory are created on the
/// first write.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<IndexMap<String, String>> {
        if !self.path.exists() {
            return Ok(IndexMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(IndexMap::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            Error::Storage(format!(
                "{} is not a JSON object of strings: {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.shift_remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        debug!("wrote `{}` to {}", key, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("restyle-storage-test-{}-{}", std::process::id(), name))
            .join("nested")
            .join("storage.json")
    }

    #[test]
    fn memory_round_trip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v").unwrap();
        storage.set("k", "w").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("w".into()));
    }

    #[test]
    fn file_storage_creates_parent_directories() {
        let path = temp_path("create");
        let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());

        let mut storage = FileStorage::new(&path);
        assert_eq!(storage.get(RULES_KEY).unwrap(), None);
        storage.set(RULES_KEY, "{}").unwrap();
        storage.set(FORCE_IMPORTANT_KEY, "false").unwrap();
        assert!(path.exists());

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get(RULES_KEY).unwrap(), Some("{}".into()));
        assert_eq!(reopened.get(FORCE_IMPORTANT_KEY).unwrap(), Some("false".into()));

        fs::remove_dir_all(path.parent().unwrap().parent().unwrap()).unwrap();
    }

    #[test]
    fn file_storage_reports_malformed_files() {
        let path = temp_path("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[1, 2").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(storage.get(RULES_KEY), Err(Error::Storage(_))));

        fs::remove_dir_all(path.parent().unwrap().parent().unwrap()).unwrap();
    }
}
