//! DAG builder helper shared by the layouts
//!
//! - Pulls chunks from a [`ChunkSource`] and wraps each into a leaf node
//! - Assembles internal nodes, enforcing the layout's fan-out bound
//! - Persists every node to the store before handing it back, so parents
//!   are always built from children whose hashes are known

use std::sync::Arc;

use futures::StreamExt;
use tracing::trace;

use crate::chunk::{ChunkError, ChunkSource};
use crate::codec::encode_and_hash;
use crate::store::Store;
use crate::types::{to_hex, DagNode, StoredNode};

/// Default chunk size: 256KB
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Default max links per internal node (fanout)
pub const DEFAULT_MAX_LINKS: usize = 174;

/// Default number of subtrees per depth in the trickle layout
pub const DEFAULT_LAYER_REPEAT: usize = 4;

/// Builder parameters
#[derive(Clone)]
pub struct DagBuilderParams<S: Store> {
    pub store: Arc<S>,
    pub max_links: usize,
    pub layer_repeat: usize,
}

impl<S: Store> DagBuilderParams<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_links: DEFAULT_MAX_LINKS,
            layer_repeat: DEFAULT_LAYER_REPEAT,
        }
    }

    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    pub fn with_layer_repeat(mut self, layer_repeat: usize) -> Self {
        self.layer_repeat = layer_repeat;
        self
    }

    /// Create a helper that consumes `source`
    pub fn new_helper<C: ChunkSource>(&self, source: C) -> DagBuilderHelper<S, C> {
        DagBuilderHelper {
            store: self.store.clone(),
            source,
            max_links: self.max_links,
            layer_repeat: self.layer_repeat,
            pending: None,
            exhausted: false,
            stats: BuildStats::default(),
        }
    }
}

/// Counters for one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub leaves: usize,
    pub internal_nodes: usize,
    pub bytes: u64,
}

/// Cursor over the chunk source, used by exactly one layout per ingest
pub struct DagBuilderHelper<S: Store, C: ChunkSource> {
    store: Arc<S>,
    source: C,
    max_links: usize,
    layer_repeat: usize,

    // Next chunk, read ahead by done()
    pending: Option<Vec<u8>>,
    exhausted: bool,

    stats: BuildStats,
}

impl<S: Store, C: ChunkSource> DagBuilderHelper<S, C> {
    pub fn max_links(&self) -> usize {
        self.max_links
    }

    pub fn layer_repeat(&self) -> usize {
        self.layer_repeat
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Read ahead one chunk unless one is already pending
    async fn prepare_next(&mut self) -> Result<(), BuilderError> {
        while self.pending.is_none() && !self.exhausted {
            match self.source.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => self.pending = Some(chunk),
                Some(Err(e)) => {
                    // Nothing is read past the first error
                    self.exhausted = true;
                    return Err(BuilderError::ChunkSource(e));
                }
                None => self.exhausted = true,
            }
        }
        Ok(())
    }

    /// True once the source is exhausted and no chunk is pending
    pub async fn done(&mut self) -> Result<bool, BuilderError> {
        self.prepare_next().await?;
        Ok(self.pending.is_none())
    }

    /// Wrap the next chunk into a leaf and persist it
    pub async fn next_leaf(&mut self) -> Result<StoredNode, BuilderError> {
        self.prepare_next().await?;
        let data = self.pending.take().ok_or(BuilderError::NoMoreChunks)?;

        self.stats.leaves += 1;
        self.stats.bytes += data.len() as u64;
        self.persist(DagNode::leaf(data)).await
    }

    /// Append leaves until `children` holds `max_links` entries or the source is done
    pub async fn fill_leaf_layer(&mut self, children: &mut Vec<StoredNode>) -> Result<(), BuilderError> {
        while children.len() < self.max_links && !self.done().await? {
            children.push(self.next_leaf().await?);
        }
        Ok(())
    }

    /// Build and persist an internal node linking `children` in order
    ///
    /// `limit` is the fan-out bound the calling layout guarantees for this
    /// node. Exceeding it is a bug in the layout, not a recoverable condition.
    pub async fn new_internal_node(
        &mut self,
        children: Vec<StoredNode>,
        limit: usize,
    ) -> Result<StoredNode, BuilderError> {
        if children.is_empty() {
            return Err(BuilderError::EmptyNode);
        }
        if children.len() > limit {
            return Err(BuilderError::InvariantViolation {
                links: children.len(),
                limit,
            });
        }

        let links = children.iter().map(StoredNode::to_link).collect();
        self.stats.internal_nodes += 1;
        self.persist(DagNode::internal(links)).await
    }

    /// Persist the root of an empty stream: no data, no links
    pub async fn empty_root(&mut self) -> Result<StoredNode, BuilderError> {
        self.persist(DagNode::default()).await
    }

    /// Encode, hash and store a node
    pub async fn persist(&mut self, node: DagNode) -> Result<StoredNode, BuilderError> {
        let (data, hash) = encode_and_hash(&node)?;
        let size = data.len() as u64 + node.links.iter().map(|l| l.size).sum::<u64>();

        self.store
            .put(hash, data)
            .await
            .map_err(|e| BuilderError::Persistence(e.to_string()))?;

        trace!(hash = %to_hex(&hash), size, links = node.links.len(), "persisted node");
        Ok(StoredNode { node, hash, size })
    }
}

/// Builder error type
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error("Chunk source error: {0}")]
    ChunkSource(#[from] ChunkError),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),
    #[error("Fan-out exceeded: {links} links, limit {limit}")]
    InvariantViolation { links: usize, limit: usize },
    #[error("Fanout must be at least 2, got {0}")]
    FanoutTooSmall(usize),
    #[error("Layer repeat must be at least 1")]
    InvalidLayerRepeat,
    #[error("No more chunks")]
    NoMoreChunks,
    #[error("Internal node without children")]
    EmptyNode,
}
