//! Importer configuration
//!
//! Read from a TOML file, every key optional:
//!
//! ```toml
//! chunk_size = 262144
//! max_links = 174
//! layer_repeat = 4
//! layout = "trickle"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::helpers::{DEFAULT_CHUNK_SIZE, DEFAULT_LAYER_REPEAT, DEFAULT_MAX_LINKS};
use crate::layout::Layout;

/// Chunking and layout settings for one importer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterConfig {
    /// Bytes per chunk (the last chunk of a stream may be shorter)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Maximum links per internal node
    #[serde(default = "default_max_links")]
    pub max_links: usize,
    /// Subtrees per depth in the trickle layout
    #[serde(default = "default_layer_repeat")]
    pub layer_repeat: usize,
    #[serde(default)]
    pub layout: Layout,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_links: default_max_links(),
            layer_repeat: default_layer_repeat(),
            layout: Layout::default(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_links() -> usize {
    DEFAULT_MAX_LINKS
}

fn default_layer_repeat() -> usize {
    DEFAULT_LAYER_REPEAT
}

impl ImporterConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    pub fn with_layer_repeat(mut self, layer_repeat: usize) -> Self {
        self.layer_repeat = layer_repeat;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Check that every tunable is usable
    ///
    /// `max_links` has no upper bound. Nodes only grow as links are added,
    /// so a fanout larger than the input puts every leaf under the root.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.chunk_size > 0, "chunk_size must be positive");
        ensure!(
            self.max_links >= 2,
            "max_links must be at least 2, got {}",
            self.max_links
        );
        ensure!(self.layer_repeat > 0, "layer_repeat must be positive");
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse importer config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize importer config")
    }
}
