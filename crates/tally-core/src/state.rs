//! Small key-value persistence for state that lives outside the relational
//! store, such as the throttle timestamp.

use crate::error::CoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_i64(&self, key: &str) -> Result<Option<i64>, CoreError>;
    async fn set_i64(&self, key: &str, value: i64) -> Result<(), CoreError>;
    async fn remove(&self, key: &str) -> Result<(), CoreError>;
}

/// A JSON object on disk, rewritten on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>, CoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes)? {
                Value::Object(map) => Ok(map),
                _ => Err(CoreError::CorruptRecord(format!(
                    "state file {} is not a JSON object",
                    self.path.display()
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, map: Map<String, Value>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&Value::Object(map))?;
        // Write then rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get_i64(&self, key: &str) -> Result<Option<i64>, CoreError> {
        let map = self.load().await?;
        Ok(map.get(key).and_then(Value::as_i64))
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<(), CoreError> {
        let mut map = self.load().await?;
        map.insert(key.to_string(), Value::from(value));
        self.save(map).await
    }

    async fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut map = self.load().await?;
        if map.remove(key).is_some() {
            self.save(map).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_i64(&self, key: &str) -> Result<Option<i64>, CoreError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).copied())
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<(), CoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("state.json"));

        assert_eq!(store.get_i64("last_check").await.unwrap(), None);
        store.set_i64("last_check", 1_700_000_000).await.unwrap();
        store.set_i64("other", 7).await.unwrap();
        assert_eq!(store.get_i64("last_check").await.unwrap(), Some(1_700_000_000));

        store.remove("last_check").await.unwrap();
        assert_eq!(store.get_i64("last_check").await.unwrap(), None);
        assert_eq!(store.get_i64("other").await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_json_file_store_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, b"[1, 2, 3]").await.unwrap();

        let store = JsonFileStore::new(&path);
        let result = store.get_i64("last_check").await;
        assert!(matches!(result, Err(CoreError::CorruptRecord(_))));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        store.set_i64("a", 1).await.unwrap();
        assert_eq!(store.get_i64("a").await.unwrap(), Some(1));
        store.remove("a").await.unwrap();
        assert_eq!(store.get_i64("a").await.unwrap(), None);
    }
}
