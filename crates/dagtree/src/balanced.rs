//! Balanced layout
//!
//! Grows the tree one level at a time: the previous root becomes the first
//! child of a new root, which is then filled with complete subtrees of the
//! same depth until it is full or the chunks run out. Every leaf ends up at
//! the same depth, `ceil(log_k(leaves))` for fanout `k`.

use tracing::debug;

use crate::chunk::ChunkSource;
use crate::helpers::{BuilderError, DagBuilderHelper};
use crate::store::Store;
use crate::types::StoredNode;

/// Build a balanced tree from every chunk in the helper's source
///
/// A single chunk yields that leaf as the root; an empty source yields the
/// empty root.
pub async fn balanced_layout<S: Store, C: ChunkSource>(
    db: &mut DagBuilderHelper<S, C>,
) -> Result<StoredNode, BuilderError> {
    if db.max_links() < 2 {
        return Err(BuilderError::FanoutTooSmall(db.max_links()));
    }
    if db.done().await? {
        return db.empty_root().await;
    }

    let mut root = db.next_leaf().await?;
    let mut depth = 0;

    while !db.done().await? {
        let mut children = vec![root];
        fill_node_rec(db, &mut children, depth).await?;
        root = db.new_internal_node(children, db.max_links()).await?;
        depth += 1;
        debug!(depth, "balanced layout grew a level");
    }

    Ok(root)
}

/// Append subtrees of `child_depth` to `children` (leaves at depth 0) while
/// there is room and chunks remain
async fn fill_node_rec<S: Store, C: ChunkSource>(
    db: &mut DagBuilderHelper<S, C>,
    children: &mut Vec<StoredNode>,
    child_depth: usize,
) -> Result<(), BuilderError> {
    if child_depth == 0 {
        return db.fill_leaf_layer(children).await;
    }

    while children.len() < db.max_links() && !db.done().await? {
        let mut grandchildren = Vec::new();
        Box::pin(fill_node_rec(db, &mut grandchildren, child_depth - 1)).await?;
        children.push(db.new_internal_node(grandchildren, db.max_links()).await?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkStream;
    use crate::helpers::DagBuilderParams;
    use crate::reader::DagReader;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    async fn build(n: usize, max_links: usize) -> (Arc<MemoryStore>, StoredNode) {
        let store = Arc::new(MemoryStore::new());
        let params = DagBuilderParams::new(store.clone()).with_max_links(max_links);
        let source = ChunkStream::from_chunks((0..n).map(|i| Ok(vec![i as u8, (i >> 8) as u8])));
        let mut db = params.new_helper(source);
        let root = balanced_layout(&mut db).await.unwrap();
        (store, root)
    }

    fn expected_depth(n: usize, k: usize) -> usize {
        let mut depth = 0;
        let mut reach = 1;
        while reach < n {
            reach *= k;
            depth += 1;
        }
        depth
    }

    #[tokio::test]
    async fn test_single_chunk_is_root() {
        let (_, root) = build(1, 4).await;
        assert!(root.node.is_leaf());
        assert_eq!(root.node.data, vec![0u8, 0]);
    }

    #[tokio::test]
    async fn test_empty_source() {
        let (store, root) = build(0, 4).await;
        assert!(root.node.is_empty());
        assert_eq!(store.size(), 1);
    }

    #[tokio::test]
    async fn test_uniform_depth() {
        for (n, k) in [(2, 2), (3, 2), (4, 2), (5, 2), (9, 3), (10, 3), (16, 4), (17, 4), (65, 4)] {
            let (store, root) = build(n, k).await;
            let reader = DagReader::new(store);
            let leaves = reader.leaves(&root.hash).await.unwrap();

            assert_eq!(leaves.len(), n, "n={n} k={k}");
            let depth = expected_depth(n, k);
            assert!(leaves.iter().all(|l| l.depth == depth), "n={n} k={k}");
        }
    }

    #[tokio::test]
    async fn test_fanout_bound_and_left_fill() {
        let (store, root) = build(23, 3).await;
        let reader = DagReader::new(store);
        let nodes = reader.walk(&root.hash).await.unwrap();

        assert!(nodes.iter().all(|n| n.links <= 3));
        // 23 leaves, k=3: root holds three subtrees, only the last is partial
        assert_eq!(nodes[0].links, 3);
        let full_internal = nodes.iter().filter(|n| n.links == 3).count();
        let partial_internal = nodes.iter().filter(|n| n.links > 0 && n.links < 3).count();
        assert_eq!(partial_internal, 2);
        assert!(full_internal >= 9);
    }

    #[tokio::test]
    async fn test_exact_power_has_no_partial_nodes() {
        let (store, root) = build(27, 3).await;
        let reader = DagReader::new(store);
        let nodes = reader.walk(&root.hash).await.unwrap();
        assert!(nodes.iter().filter(|n| !n.is_leaf()).all(|n| n.links == 3));
    }

    #[tokio::test]
    async fn test_rejects_fanout_of_one() {
        let store = Arc::new(MemoryStore::new());
        let params = DagBuilderParams::new(store).with_max_links(1);
        let mut db = params.new_helper(ChunkStream::from_chunks(vec![Ok(vec![1u8]), Ok(vec![2u8])]));
        assert!(matches!(
            balanced_layout(&mut db).await,
            Err(BuilderError::FanoutTooSmall(1))
        ));
    }
}
