//! File-backed durable store
//!
//! Each key is persisted as one JSON file inside an XDG-compliant cache
//! directory (`~/.cache/nearby/` on Linux).

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use directories::ProjectDirs;
use tokio::fs;

use super::{DurableStore, StoreError};

/// Stores each key as a file in a cache directory
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where entry files are stored
    dir: PathBuf,
}

impl FileStore {
    /// Creates a FileStore rooted at the platform cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "nearby")?;
        Some(Self {
            dir: project_dirs.cache_dir().to_path_buf(),
        })
    }

    /// Creates a FileStore rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory this store writes into
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Maps a key to its file path
    ///
    /// Keys such as `cache/home_feed` contain separators, so anything outside
    /// `[A-Za-z0-9_-]` is replaced with `_` to keep every entry a direct child
    /// of the store directory.
    fn entry_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.entry_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;

        // Write to a sibling temp file first so a crash never leaves a
        // half-written entry behind
        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::with_dir(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_get_returns_none_for_missing_key() {
        let (store, _temp_dir) = create_test_store();

        let value = store.get("missing").await.expect("get should succeed");

        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_set_then_get_returns_value() {
        let (store, _temp_dir) = create_test_store();

        store.set("cache/home_feed", "{\"a\":1}").await.expect("set should succeed");
        let value = store.get("cache/home_feed").await.expect("get should succeed");

        assert_eq!(value.as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_keys_with_separators_stay_in_store_dir() {
        let (store, temp_dir) = create_test_store();

        store.set("cache/user_profile", "x").await.expect("set should succeed");

        let expected = temp_dir.path().join("cache_user_profile.json");
        assert!(expected.exists(), "entry file should be a direct child");
    }

    #[tokio::test]
    async fn test_set_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("nested").join("store");
        let store = FileStore::with_dir(nested.clone());

        store.set("k", "v").await.expect("set should succeed");

        assert!(nested.join("k.json").exists());
    }

    #[tokio::test]
    async fn test_set_overwrites_and_leaves_no_temp_file() {
        let (store, temp_dir) = create_test_store();

        store.set("k", "first").await.expect("first set should succeed");
        store.set("k", "second").await.expect("second set should succeed");

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
        assert!(!temp_dir.path().join("k.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let (store, _temp_dir) = create_test_store();

        store.delete("never-written").await.expect("delete should succeed");
    }

    #[tokio::test]
    async fn test_delete_many_removes_all_keys() {
        let (store, _temp_dir) = create_test_store();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();

        store.delete_many(&["a", "b", "c"]).await.expect("delete_many should succeed");

        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("b").await.unwrap().is_none());
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(store) = FileStore::new() {
            let path_str = store.dir().to_string_lossy();
            assert!(path_str.contains("nearby"), "Store path should contain project name");
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }
}
