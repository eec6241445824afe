//! Build configuration loaded from TOML.

use crate::analysis::{TextEncoding, TokenizerOptions};
use crate::error::Result;
use crate::spimi::DEFAULT_BLOCK_TERM_LIMIT;
use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Everything a build needs besides the documents.
///
/// Every field has a default, so an empty file is a valid configuration:
///
/// ```toml
/// block_term_limit = 4000
/// blocks_dir = "~/spimi/blocks"
/// index_path = "~/spimi/index.json"
/// ingest_concurrency = 4
/// encoding = "latin1"
///
/// [tokenizer]
/// case_fold = true
/// stopwords = "small"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Distinct terms per block before it is flushed.
    pub block_term_limit: usize,
    /// Directory holding block files.
    pub blocks_dir: PathBuf,
    /// Where the merged index is saved.
    pub index_path: PathBuf,
    /// Stop after this many documents have been admitted, counting ones later skipped
    /// for yielding no tokens.
    pub max_documents: Option<usize>,
    /// Documents tokenized and ingested concurrently by the async builder.
    pub ingest_concurrency: usize,
    /// Encoding of raw document bytes.
    pub encoding: TextEncoding,
    pub tokenizer: TokenizerOptions,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            block_term_limit: DEFAULT_BLOCK_TERM_LIMIT,
            blocks_dir: PathBuf::from("blocks"),
            index_path: PathBuf::from("index.json"),
            max_documents: None,
            ingest_concurrency: std::thread::available_parallelism().map_or(4, NonZeroUsize::get),
            encoding: TextEncoding::default(),
            tokenizer: TokenizerOptions::default(),
        }
    }
}

impl IndexConfig {
    /// Read and validate a TOML config file. `~` in paths is expanded.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.blocks_dir = expand_tilde(&config.blocks_dir);
        config.index_path = expand_tilde(&config.index_path);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.block_term_limit > 0, "block_term_limit must be at least 1");
        ensure!(self.ingest_concurrency > 0, "ingest_concurrency must be at least 1");
        ensure!(self.max_documents != Some(0), "max_documents must be at least 1 when set");
        Ok(())
    }
}

/// Expands a leading `~` to the home directory. Other paths are returned unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    path.to_path_buf()
}
