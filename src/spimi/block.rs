//! Block files: one sealed block per file, written atomically.
//!
//! Layout: `[magic "SPB1"][postcard payload][xxh3-64 checksum LE]`. The payload is the
//! block's term-sorted `(term, postings)` entries.

use super::accumulator::SealedBlock;
use crate::error::BlockError;
use crate::index::{Index, PostingsList};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

const BLOCK_MAGIC: &[u8; 4] = b"SPB1";
const CHECKSUM_SIZE: usize = 8;
const BLOCK_PREFIX: &str = "block_";
const BLOCK_EXTENSION: &str = "blk";

/// Where a written block lives and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u32,
    pub term_count: usize,
    pub posting_count: usize,
    pub path: PathBuf,
}

/// Directory of numbered block files.
#[derive(Debug, Clone)]
pub struct BlockStore {
    dir: PathBuf,
}

impl BlockStore {
    /// Open (creating if needed) a block directory.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of block `number`, whether or not it exists.
    pub fn path_for(&self, number: u32) -> PathBuf {
        self.dir
            .join(format!("{BLOCK_PREFIX}{number}.{BLOCK_EXTENSION}"))
    }

    /// Remove block files left over from a previous build. Returns how many were removed.
    pub fn clear(&self) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(BLOCK_PREFIX)
                && (name.ends_with(".blk") || name.ends_with(".blk.tmp"))
            {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(
                "Removed {} stale block files from {}",
                removed,
                self.dir.display()
            );
        }
        Ok(removed)
    }

    /// Write a sealed block.
    ///
    /// The bytes go to a temporary file that is renamed into place, so a block file is
    /// either absent or complete.
    pub fn write(&self, block: &SealedBlock) -> Result<BlockInfo, BlockError> {
        let number = block.number;
        let payload = postcard::to_stdvec(&block.entries)
            .map_err(|source| BlockError::Encode { number, source })?;
        let checksum = xxh3_64(&payload);

        let mut output = Vec::with_capacity(BLOCK_MAGIC.len() + payload.len() + CHECKSUM_SIZE);
        output.extend_from_slice(BLOCK_MAGIC);
        output.extend_from_slice(&payload);
        output.extend_from_slice(&checksum.to_le_bytes());

        let path = self.path_for(number);
        let tmp_path = path.with_extension("blk.tmp");
        let io_err = |source| BlockError::Io { number, source };
        fs::write(&tmp_path, &output).map_err(io_err)?;
        fs::rename(&tmp_path, &path).map_err(io_err)?;

        tracing::info!(
            "Flushed block #{} to {} ({} terms, {} bytes)",
            number,
            path.display(),
            block.term_count(),
            output.len()
        );

        Ok(BlockInfo {
            number,
            term_count: block.term_count(),
            posting_count: block.posting_count(),
            path,
        })
    }

    /// Read the entries of block `number`, verifying magic and checksum.
    pub fn read(&self, number: u32) -> Result<Vec<(String, PostingsList)>, BlockError> {
        let path = self.path_for(number);
        let raw = fs::read(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                BlockError::NotFound {
                    number,
                    path: path.clone(),
                }
            } else {
                BlockError::Io { number, source }
            }
        })?;

        let corrupt = |reason: String| BlockError::Corrupt { number, reason };
        if raw.len() < BLOCK_MAGIC.len() + CHECKSUM_SIZE {
            return Err(corrupt(format!("file too short ({} bytes)", raw.len())));
        }
        if &raw[..BLOCK_MAGIC.len()] != BLOCK_MAGIC {
            return Err(corrupt("bad magic".to_string()));
        }

        let (body, footer) = raw.split_at(raw.len() - CHECKSUM_SIZE);
        let payload = &body[BLOCK_MAGIC.len()..];
        let mut stored = [0u8; CHECKSUM_SIZE];
        stored.copy_from_slice(footer);
        let stored = u64::from_le_bytes(stored);
        let computed = xxh3_64(payload);
        if stored != computed {
            return Err(corrupt(format!(
                "checksum mismatch: expected {:016x}, got {:016x}",
                stored, computed
            )));
        }

        postcard::from_bytes(payload).map_err(|e| corrupt(e.to_string()))
    }

    /// Read block `number` back as an [`Index`].
    pub fn read_index(&self, number: u32, case_folded: bool) -> Result<Index, BlockError> {
        let entries = self.read(number)?;
        let mut index = Index::with_capacity(case_folded, entries.len());
        index.extend(entries);
        Ok(index)
    }
}
