//! Durable key-value storage for persisted cache entries
//!
//! The cache only needs string keys mapped to string values. `DurableStore`
//! is the seam; `FileStore` persists to the per-user cache directory and
//! `MemoryStore` keeps everything in process (tests, `--ephemeral` runs).

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem operation failed
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Backend cannot serve requests right now
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string key-value store
///
/// Deleting a key that does not exist is not an error.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Removes every key in `keys`, stopping at the first failure
    async fn delete_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }
}
