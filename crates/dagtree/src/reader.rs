//! DAG reader and traversal utilities
//!
//! Reassemble file content from a root hash, walk the tree, verify that
//! every referenced block is present and intact.

use std::collections::HashSet;
use std::sync::Arc;

use crate::codec::{decode_node, verify};
use crate::store::Store;
use crate::types::{to_hex, DagNode, Hash};

/// Walk entry for tree traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub hash: Hash,
    /// Distance from the root (root = 0)
    pub depth: usize,
    /// Number of links on this node
    pub links: usize,
    /// Payload bytes carried by this node
    pub data_len: usize,
}

impl WalkEntry {
    pub fn is_leaf(&self) -> bool {
        self.links == 0
    }
}

/// DagReader - reads and traverses DAGs built by the importer
pub struct DagReader<S: Store> {
    store: Arc<S>,
}

impl<S: Store> DagReader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch, check and decode a node
    pub async fn get_node(&self, hash: &Hash) -> Result<DagNode, ReaderError> {
        let data = self
            .store
            .get(hash)
            .await
            .map_err(|e| ReaderError::Store(e.to_string()))?
            .ok_or_else(|| ReaderError::MissingBlock(to_hex(hash)))?;

        if !verify(hash, &data) {
            return Err(ReaderError::HashMismatch(to_hex(hash)));
        }
        Ok(decode_node(&data)?)
    }

    /// Concatenate leaf payloads in link order
    pub async fn read_file(&self, hash: &Hash) -> Result<Vec<u8>, ReaderError> {
        let mut out = Vec::new();
        let mut stack = vec![*hash];

        while let Some(hash) = stack.pop() {
            let node = self.get_node(&hash).await?;
            out.extend_from_slice(&node.data);
            // reversed so the first link is popped first
            stack.extend(node.links.iter().rev().map(|l| l.hash));
        }

        Ok(out)
    }

    /// Depth-first, pre-order walk of every node under `hash`
    pub async fn walk(&self, hash: &Hash) -> Result<Vec<WalkEntry>, ReaderError> {
        let mut entries = Vec::new();
        let mut stack = vec![(*hash, 0usize)];

        while let Some((hash, depth)) = stack.pop() {
            let node = self.get_node(&hash).await?;
            entries.push(WalkEntry {
                hash,
                depth,
                links: node.links.len(),
                data_len: node.data.len(),
            });
            stack.extend(node.links.iter().rev().map(|l| (l.hash, depth + 1)));
        }

        Ok(entries)
    }

    /// Leaves in stream order
    pub async fn leaves(&self, hash: &Hash) -> Result<Vec<WalkEntry>, ReaderError> {
        Ok(self
            .walk(hash)
            .await?
            .into_iter()
            .filter(WalkEntry::is_leaf)
            .collect())
    }
}

/// Check that every block reachable from `root_hash` is present and
/// matches its hash
pub async fn verify_tree<S: Store>(store: Arc<S>, root_hash: &Hash) -> Result<VerifyResult, ReaderError> {
    let mut missing = Vec::new();
    let mut corrupt = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![*root_hash];

    while let Some(hash) = stack.pop() {
        if !visited.insert(hash) {
            continue;
        }

        let data = match store.get(&hash).await.map_err(|e| ReaderError::Store(e.to_string()))? {
            Some(d) => d,
            None => {
                missing.push(hash);
                continue;
            }
        };

        if !verify(&hash, &data) {
            corrupt.push(hash);
            continue;
        }

        let node = decode_node(&data)?;
        stack.extend(node.links.iter().map(|l| l.hash));
    }

    Ok(VerifyResult {
        valid: missing.is_empty() && corrupt.is_empty(),
        missing,
        corrupt,
    })
}

/// Result of tree verification
#[derive(Debug, Clone)]
pub struct VerifyResult {
    pub valid: bool,
    pub missing: Vec<Hash>,
    pub corrupt: Vec<Hash>,
}

/// Reader error type
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("Store error: {0}")]
    Store(String),
    #[error("Codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),
    #[error("Missing block: {0}")]
    MissingBlock(String),
    #[error("Hash mismatch: {0}")]
    HashMismatch(String),
}
