//! Content-addressed block store interface and in-memory implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::types::Hash;

/// Storage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of blocks in store
    pub count: u64,
    /// Total bytes stored
    pub bytes: u64,
}

/// Content-addressed block store
///
/// `put` must be idempotent: storing the same hash twice is not an error.
#[async_trait]
pub trait Store: Send + Sync {
    /// Store data by its hash
    /// Returns true if newly stored, false if already existed
    async fn put(&self, hash: Hash, data: Vec<u8>) -> Result<bool, StoreError>;

    /// Retrieve data by hash
    async fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StoreError>;

    /// Check if hash exists
    async fn has(&self, hash: &Hash) -> Result<bool, StoreError>;

    /// Delete by hash
    /// Returns true if deleted, false if didn't exist
    async fn delete(&self, hash: &Hash) -> Result<bool, StoreError>;

    /// Get storage statistics
    async fn stats(&self) -> StoreStats {
        StoreStats::default()
    }
}

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store error: {0}")]
    Other(String),
}

/// In-memory content-addressed store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<Hash, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of stored blocks
    pub fn size(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Get total bytes stored
    pub fn total_bytes(&self) -> usize {
        self.inner.read().unwrap().values().map(|d| d.len()).sum()
    }

    /// Clear all data
    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }

    /// List all hashes
    pub fn keys(&self) -> Vec<Hash> {
        self.inner.read().unwrap().keys().copied().collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put(&self, hash: Hash, data: Vec<u8>) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().unwrap();
        if inner.contains_key(&hash) {
            return Ok(false);
        }
        inner.insert(hash, data);
        Ok(true)
    }

    async fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.read().unwrap().get(hash).cloned())
    }

    async fn has(&self, hash: &Hash) -> Result<bool, StoreError> {
        Ok(self.inner.read().unwrap().contains_key(hash))
    }

    async fn delete(&self, hash: &Hash) -> Result<bool, StoreError> {
        Ok(self.inner.write().unwrap().remove(hash).is_some())
    }

    async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().unwrap();
        StoreStats {
            count: inner.len() as u64,
            bytes: inner.values().map(|d| d.len() as u64).sum(),
        }
    }
}
