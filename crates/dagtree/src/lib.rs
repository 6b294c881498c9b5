//! dagtree - Chunked content-addressed merkle DAG importer
//!
//! Splits a byte stream into chunks and arranges them into a merkle DAG:
//! SHA256(msgpack(node)) -> msgpack(node)
//!
//! # Overview
//!
//! A chunk source cuts the input into chunks on its own blocking task. The
//! builder helper wraps each chunk into a leaf, persists it, and hands it to
//! one of two layouts:
//!
//! - **Balanced**: uniform depth, nodes filled left to right
//! - **Trickle**: shallow start for sequential reads, deeper subtrees later
//!
//! Every node is written to the [`Store`] before its parent is built, so the
//! returned root is fully resolved.
//!
//! # Example
//!
//! ```rust
//! use dagtree::{build_dag_from_reader, ChunkStream, DagReader, MemoryStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let data = vec![7u8; 1_000_000];
//!
//!     let source = ChunkStream::from_reader(std::io::Cursor::new(data.clone()), 64 * 1024);
//!     let root = build_dag_from_reader(store.clone(), source).await?;
//!
//!     let bytes = DagReader::new(store).read_file(&root.hash).await?;
//!     assert_eq!(bytes, data);
//!     Ok(())
//! }
//! ```

pub mod balanced;
pub mod chunk;
pub mod codec;
pub mod config;
pub mod helpers;
pub mod importer;
pub mod layout;
pub mod reader;
pub mod store;
pub mod trickle;
pub mod types;

// Entry points
pub use importer::{
    build_dag_from_file, build_dag_from_reader, build_trickle_dag_from_file,
    build_trickle_dag_from_reader, ImportError, Importer,
};

// Constants
pub use helpers::{DEFAULT_CHUNK_SIZE, DEFAULT_LAYER_REPEAT, DEFAULT_MAX_LINKS};

// Builder internals shared by the layouts
pub use balanced::balanced_layout;
pub use helpers::{BuildStats, BuilderError, DagBuilderHelper, DagBuilderParams};
pub use layout::{Layout, UnknownLayout};
pub use trickle::{trickle_fanout, trickle_layout};

pub use chunk::{ChunkError, ChunkSource, ChunkStream, SizeSplitter, Splitter, CHUNK_CHANNEL_CAPACITY};
pub use codec::{decode_node, encode_and_hash, encode_node, sha256, verify, CodecError};
pub use config::ImporterConfig;
pub use reader::{verify_tree, DagReader, ReaderError, VerifyResult, WalkEntry};
pub use store::{MemoryStore, Store, StoreError, StoreStats};
pub use types::{from_hex, to_hex, DagNode, Hash, Link, StoredNode};
