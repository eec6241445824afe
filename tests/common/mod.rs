//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Every build writes block files, so each test gets its own [`TempWorkspace`] with a
//! private `blocks/` directory and index path. Tests can run in parallel.
//!
//! # Available Fixtures
//!
//! - `workspace`: an empty temp workspace
//! - `scenario_docs`: the two-document corpus `{1: "Cat Dog", 2: "Dog Bird 123"}`
//! - `reuters_like_docs`: a larger synthetic corpus with mixed case, numbers and stopwords

use rstest::fixture;
use spimi_index::{DocMetadata, Document, IndexConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary workspace directory for test isolation.
///
/// Cleaned up when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.root.join("blocks")
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
        full_path
    }

    /// A config whose block and index paths live inside this workspace.
    pub fn config(&self, block_term_limit: usize) -> IndexConfig {
        IndexConfig {
            block_term_limit,
            blocks_dir: self.blocks_dir(),
            index_path: self.root.join("index.json"),
            ingest_concurrency: 2,
            ..IndexConfig::default()
        }
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

#[fixture]
pub fn workspace() -> TempWorkspace {
    TempWorkspace::new()
}

#[fixture]
pub fn scenario_docs() -> Vec<Document> {
    vec![
        Document::new(1, "Cat Dog"),
        Document::new(2, "Dog Bird 123"),
    ]
}

/// Deterministic corpus large enough to span several blocks at small thresholds.
#[fixture]
pub fn reuters_like_docs() -> Vec<Document> {
    const WORDS: &[&str] = &[
        "copper", "Chrysler", "Bundesbank", "the", "and", "which", "prices", "Prices",
        "running", "runs", "ran", "shares", "1987", "tonnes", "abc123", "BANK", "bank",
        "market", "said", "of", "rates", "Rate", "dollar", "were", "profit", "oil",
    ];

    const MUL: u64 = 6_364_136_223_846_793_005;
    const INC: u64 = 1_442_695_040_888_963_407;

    (1..=60u32)
        .map(|doc_id| {
            let mut state = u64::from(doc_id).wrapping_mul(MUL).wrapping_add(INC);
            let len = 4 + (state >> 40) as usize % 11;
            let text = (0..len)
                .map(|_| {
                    state = state.wrapping_mul(MUL).wrapping_add(INC);
                    WORDS[(state >> 33) as usize % WORDS.len()]
                })
                .collect::<Vec<_>>()
                .join(if doc_id % 2 == 0 { " " } else { ", " });
            Document::new(doc_id, text).with_metadata(DocMetadata::new(
                format!("https://example.org/reuters/{doc_id}"),
                format!("Story {doc_id}"),
            ))
        })
        .collect()
}
