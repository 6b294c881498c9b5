//! MessagePack encoding/decoding for DAG nodes
//!
//! Every block, leaf or internal, is a MessagePack-encoded node.
//!
//! **Determinism:** MessagePack has no built-in canonical form. Output is
//! deterministic because struct fields are serialized in declaration order,
//! which is kept alphabetical, and nodes contain no hash maps.
//!
//! Format uses short keys for compact encoding:
//! - d: data (binary, empty for internal nodes)
//! - l: links array
//! - h: hash (in link, 32 bytes)
//! - n: name (in link)
//! - s: cumulative size (in link)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{DagNode, Hash, Link};

/// Error type for codec operations
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("MessagePack encoding error: {0}")]
    MsgpackEncode(String),
    #[error("MessagePack decoding error: {0}")]
    MsgpackDecode(String),
    #[error("Invalid hash length: expected 32, got {0}")]
    InvalidHashLength(usize),
}

/// Wire format for a link. Fields ordered alphabetically: h, n, s
#[derive(Serialize, Deserialize)]
struct WireLink {
    #[serde(with = "serde_bytes")]
    h: Vec<u8>,
    #[serde(default)]
    n: String,
    s: u64,
}

/// Wire format for a node. Fields ordered alphabetically: d, l
#[derive(Serialize, Deserialize)]
struct WireNode {
    #[serde(with = "serde_bytes", default)]
    d: Vec<u8>,
    #[serde(default)]
    l: Vec<WireLink>,
}

/// Encode a node to MessagePack
pub fn encode_node(node: &DagNode) -> Result<Vec<u8>, CodecError> {
    let wire = WireNode {
        d: node.data.clone(),
        l: node
            .links
            .iter()
            .map(|link| WireLink {
                h: link.hash.to_vec(),
                n: link.name.clone(),
                s: link.size,
            })
            .collect(),
    };

    rmp_serde::to_vec_named(&wire).map_err(|e| CodecError::MsgpackEncode(e.to_string()))
}

/// Decode MessagePack to a node
pub fn decode_node(data: &[u8]) -> Result<DagNode, CodecError> {
    let wire: WireNode =
        rmp_serde::from_slice(data).map_err(|e| CodecError::MsgpackDecode(e.to_string()))?;

    let mut links = Vec::with_capacity(wire.l.len());
    for wl in wire.l {
        if wl.h.len() != 32 {
            return Err(CodecError::InvalidHashLength(wl.h.len()));
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&wl.h);
        links.push(Link {
            name: wl.n,
            hash,
            size: wl.s,
        });
    }

    Ok(DagNode {
        data: wire.d,
        links,
    })
}

/// Content identifier of an encoded block
pub fn sha256(block: &[u8]) -> Hash {
    Sha256::digest(block).into()
}

/// True if `block` is the content addressed by `hash`
pub fn verify(hash: &Hash, block: &[u8]) -> bool {
    sha256(block) == *hash
}

/// Encode a node and compute its content identifier
pub fn encode_and_hash(node: &DagNode) -> Result<(Vec<u8>, Hash), CodecError> {
    let data = encode_node(node)?;
    let hash = sha256(&data);
    Ok((data, hash))
}
