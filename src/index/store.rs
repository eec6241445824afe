//! Final index persistence as JSON.

use super::Index;
use crate::error::Result;
use anyhow::Context;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

impl Index {
    /// Write the index to `path` as JSON.
    ///
    /// The file is written next to its destination and renamed into place, so readers
    /// never observe a partial index.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("json.tmp");
        let file = File::create(&tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).context("Failed to serialize index")?;
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        drop(writer);

        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move index into place at {}", path.display()))?;

        tracing::debug!(
            "Saved index to {} ({} terms)",
            path.display(),
            self.term_count()
        );
        Ok(())
    }

    /// Load an index previously written by [`Index::save`].
    ///
    /// Postings lists are normalized on load so the sorted/unique invariant holds even
    /// for hand-edited or externally produced files.
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open index {}", path.display()))?;
        let mut index: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse index {}", path.display()))?;

        let dropped = index.normalize();
        if dropped > 0 {
            tracing::warn!(
                "Dropped {} duplicate postings while loading {}",
                dropped,
                path.display()
            );
        }
        Ok(index)
    }
}
