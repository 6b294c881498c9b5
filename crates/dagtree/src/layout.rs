//! Layout selection
//!
//! Both layouts consume the same [`DagBuilderHelper`] cursor, so the chunk
//! source and helper are shared whichever one is picked.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::balanced::balanced_layout;
use crate::chunk::ChunkSource;
use crate::helpers::{BuilderError, DagBuilderHelper};
use crate::store::Store;
use crate::trickle::trickle_layout;
use crate::types::StoredNode;

/// Tree layout strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Uniform depth, every node filled before the next one starts
    #[default]
    Balanced,
    /// Shallow start, deeper subtrees further into the stream
    Trickle,
}

impl Layout {
    /// Arrange every chunk of the helper's source into a tree
    pub async fn build<S: Store, C: ChunkSource>(
        self,
        db: &mut DagBuilderHelper<S, C>,
    ) -> Result<StoredNode, BuilderError> {
        match self {
            Layout::Balanced => balanced_layout(db).await,
            Layout::Trickle => trickle_layout(db).await,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Balanced => "balanced",
            Layout::Trickle => "trickle",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a layout name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown layout: {0}")]
pub struct UnknownLayout(pub String);

impl FromStr for Layout {
    type Err = UnknownLayout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "balanced" => Ok(Layout::Balanced),
            "trickle" => Ok(Layout::Trickle),
            _ => Err(UnknownLayout(s.to_string())),
        }
    }
}
