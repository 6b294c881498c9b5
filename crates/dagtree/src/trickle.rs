//! Trickle layout
//!
//! Optimized for sequential reads: the root starts with a layer of leaves,
//! then takes `layer_repeat` subtrees of depth 1, `layer_repeat` of depth 2,
//! and so on. Every subtree is built the same way. The beginning of the
//! stream sits close to the root while later data sits deeper.

use tracing::debug;

use crate::chunk::ChunkSource;
use crate::helpers::{BuilderError, DagBuilderHelper};
use crate::store::Store;
use crate::types::StoredNode;

/// Fan-out bound of a trickle node holding subtrees of `levels` depths:
/// a full leaf layer plus `layer_repeat` subtrees per depth. Saturates
/// at `usize::MAX`.
pub fn trickle_fanout(max_links: usize, layer_repeat: usize, levels: usize) -> usize {
    max_links.saturating_add(layer_repeat.saturating_mul(levels))
}

/// Build a trickle tree from every chunk in the helper's source
///
/// A single chunk yields that leaf as the root; an empty source yields the
/// empty root.
pub async fn trickle_layout<S: Store, C: ChunkSource>(
    db: &mut DagBuilderHelper<S, C>,
) -> Result<StoredNode, BuilderError> {
    if db.max_links() == 0 {
        return Err(BuilderError::FanoutTooSmall(0));
    }
    if db.layer_repeat() == 0 {
        return Err(BuilderError::InvalidLayerRepeat);
    }
    if db.done().await? {
        return db.empty_root().await;
    }

    let mut children = Vec::new();
    db.fill_leaf_layer(&mut children).await?;

    if children.len() == 1 && db.done().await? {
        if let Some(leaf) = children.pop() {
            return Ok(leaf);
        }
    }

    let mut levels = 0;
    while !db.done().await? {
        levels += 1;
        for _ in 0..db.layer_repeat() {
            if db.done().await? {
                break;
            }
            children.push(fill_trickle_rec(db, levels).await?);
        }
        debug!(levels, "trickle root widened");
    }

    let limit = trickle_fanout(db.max_links(), db.layer_repeat(), levels);
    db.new_internal_node(children, limit).await
}

/// Build one subtree: a leaf layer, then `layer_repeat` subtrees of each
/// depth below `depth`
async fn fill_trickle_rec<S: Store, C: ChunkSource>(
    db: &mut DagBuilderHelper<S, C>,
    depth: usize,
) -> Result<StoredNode, BuilderError> {
    let mut children = Vec::new();
    db.fill_leaf_layer(&mut children).await?;

    'levels: for level in 1..depth {
        for _ in 0..db.layer_repeat() {
            if db.done().await? {
                break 'levels;
            }
            children.push(Box::pin(fill_trickle_rec(db, level)).await?);
        }
    }

    let limit = trickle_fanout(db.max_links(), db.layer_repeat(), depth - 1);
    db.new_internal_node(children, limit).await
}
