//! DAG node types
//!
//! Core principle: every block is stored by SHA256(msgpack(node)) -> msgpack(node).
//! Leaves carry chunk bytes, internal nodes carry ordered links.

/// 32-byte SHA256 hash used as content identifier
pub type Hash = [u8; 32];

/// Convert hash to hex string
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Convert hex string to hash
pub fn from_hex(hex_str: &str) -> Result<Hash, hex::FromHexError> {
    let bytes = hex::decode(hex_str)?;
    if bytes.len() != 32 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

/// A link to a child block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Link name. Empty for file chunk links.
    pub name: String,
    /// Content identifier of the child block
    pub hash: Hash,
    /// Cumulative size: encoded child block plus everything below it
    pub size: u64,
}

impl Link {
    pub fn new(hash: Hash) -> Self {
        Self {
            name: String::new(),
            hash,
            size: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }
}

/// In-memory merkle DAG node
///
/// Leaves hold raw chunk data and no links. Internal nodes hold no data
/// and link to their children in stream order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DagNode {
    pub data: Vec<u8>,
    pub links: Vec<Link>,
}

impl DagNode {
    /// Leaf node wrapping a chunk
    pub fn leaf(data: Vec<u8>) -> Self {
        Self {
            data,
            links: Vec::new(),
        }
    }

    /// Internal node linking to children
    pub fn internal(links: Vec<Link>) -> Self {
        Self {
            data: Vec::new(),
            links,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.links.is_empty()
    }

    /// Empty payload and no links (root of an empty stream)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.links.is_empty()
    }
}

/// A node that has been persisted to the store
///
/// Immutable once created: the hash was computed from the node's
/// encoding and the block is already in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNode {
    pub node: DagNode,
    pub hash: Hash,
    /// Cumulative size of the subtree rooted here
    pub size: u64,
}

impl StoredNode {
    /// Link a parent uses to reference this node
    pub fn to_link(&self) -> Link {
        Link::new(self.hash).with_size(self.size)
    }

    /// Payload bytes carried by this node itself
    pub fn data_len(&self) -> usize {
        self.node.data.len()
    }
}
