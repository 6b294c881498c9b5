//! Build entry points
//!
//! Turn a chunk source, a reader or a file into a DAG in a store and return
//! its root.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, warn};

use crate::chunk::{ChunkSource, ChunkStream};
use crate::config::ImporterConfig;
use crate::helpers::{BuilderError, DagBuilderParams};
use crate::layout::Layout;
use crate::store::Store;
use crate::types::{to_hex, StoredNode};

/// Import error type
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("`{0}` is a directory")]
    PathIsDirectory(PathBuf),
    #[error("Failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Build(#[from] BuilderError),
}

/// Build a balanced DAG with default fanout
pub async fn build_dag_from_reader<S: Store, C: ChunkSource>(
    store: Arc<S>,
    source: C,
) -> Result<StoredNode, ImportError> {
    build_with_layout(&DagBuilderParams::new(store), source, Layout::Balanced).await
}

/// Build a trickle DAG with default fanout
pub async fn build_trickle_dag_from_reader<S: Store, C: ChunkSource>(
    store: Arc<S>,
    source: C,
) -> Result<StoredNode, ImportError> {
    build_with_layout(&DagBuilderParams::new(store), source, Layout::Trickle).await
}

/// Build a balanced DAG from a file with default chunk size and fanout
pub async fn build_dag_from_file<S: Store>(
    path: impl AsRef<Path>,
    store: Arc<S>,
) -> Result<StoredNode, ImportError> {
    Importer::new(ImporterConfig::default(), store)?
        .import_file(path)
        .await
}

/// Build a trickle DAG from a file with default chunk size and fanout
pub async fn build_trickle_dag_from_file<S: Store>(
    path: impl AsRef<Path>,
    store: Arc<S>,
) -> Result<StoredNode, ImportError> {
    Importer::new(ImporterConfig::default().with_layout(Layout::Trickle), store)?
        .import_file(path)
        .await
}

async fn build_with_layout<S: Store, C: ChunkSource>(
    params: &DagBuilderParams<S>,
    source: C,
    layout: Layout,
) -> Result<StoredNode, ImportError> {
    debug!(%layout, max_links = params.max_links, "building dag");
    let mut db = params.new_helper(source);

    match layout.build(&mut db).await {
        Ok(root) => {
            let stats = db.stats();
            debug!(
                %layout,
                root = %to_hex(&root.hash),
                leaves = stats.leaves,
                internal_nodes = stats.internal_nodes,
                bytes = stats.bytes,
                "built dag"
            );
            Ok(root)
        }
        Err(e) => {
            // Nodes persisted so far stay in the store
            warn!(%layout, error = %e, leaves = db.stats().leaves, "dag build aborted");
            Err(e.into())
        }
    }
}

/// Importer with explicit chunking and layout settings
pub struct Importer<S: Store> {
    store: Arc<S>,
    config: ImporterConfig,
}

impl<S: Store> Importer<S> {
    pub fn new(config: ImporterConfig, store: Arc<S>) -> Result<Self, ImportError> {
        config
            .validate()
            .with_context(|| format!("{} importer", config.layout))
            .map_err(|e| ImportError::InvalidConfig(format!("{e:#}")))?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    fn params(&self) -> DagBuilderParams<S> {
        DagBuilderParams::new(self.store.clone())
            .with_max_links(self.config.max_links)
            .with_layer_repeat(self.config.layer_repeat)
    }

    /// Build from an existing chunk source
    pub async fn import_source<C: ChunkSource>(&self, source: C) -> Result<StoredNode, ImportError> {
        build_with_layout(&self.params(), source, self.config.layout).await
    }

    /// Chunk `reader` on a blocking worker and build from it
    pub async fn import_reader<R: Read + Send + 'static>(&self, reader: R) -> Result<StoredNode, ImportError> {
        let source = ChunkStream::from_reader(reader, self.config.chunk_size);
        self.import_source(source).await
    }

    pub async fn import_bytes(&self, data: &[u8]) -> Result<StoredNode, ImportError> {
        self.import_reader(Cursor::new(data.to_vec())).await
    }

    /// Build from a regular file. Directories are rejected.
    pub async fn import_file(&self, path: impl AsRef<Path>) -> Result<StoredNode, ImportError> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path).await.map_err(|source| ImportError::Stat {
            path: path.to_path_buf(),
            source,
        })?;

        if meta.is_dir() {
            return Err(ImportError::PathIsDirectory(path.to_path_buf()));
        }

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| ImportError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .into_std()
            .await;

        debug!(path = %path.display(), size = meta.len(), "importing file");
        self.import_reader(file).await
    }
}
