//! Build orchestration: documents → blocks → merged index.

use crate::analysis::Tokenizer;
use crate::config::IndexConfig;
use crate::error::{IngestError, Result};
use crate::index::{Index, IndexStats};
use crate::source::DocumentStream;
use crate::spimi::{
    BlockAccumulator, BlockInfo, BlockMerger, BlockStore, MergeReport, SealedBlock,
    SharedAccumulator,
};
use crate::types::Document;
use anyhow::Context;
use futures::{StreamExt, TryStreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Result of a completed build.
#[derive(Debug)]
pub struct BuildOutcome {
    pub index: Index,
    /// Blocks written, in block-number order.
    pub blocks: Vec<BlockInfo>,
    pub merge: MergeReport,
    pub documents_indexed: usize,
    pub documents_skipped: usize,
    /// Set when cancellation or the document quota ended the build before the source did.
    pub stopped_early: bool,
}

impl BuildOutcome {
    pub fn stats(&self) -> IndexStats {
        self.index.stats("SPIMI index")
    }
}

enum Ingested {
    Skipped,
    Open,
    Sealed(SealedBlock),
}

/// Builds a final index from documents with bounded memory.
///
/// Each build clears stale block files from the blocks directory and numbers its blocks
/// from 1.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    config: IndexConfig,
    tokenizer: Tokenizer,
}

impl IndexBuilder {
    pub fn new(config: IndexConfig) -> Self {
        let tokenizer = Tokenizer::new(config.tokenizer);
        Self { config, tokenizer }
    }

    /// Replace the tokenizer derived from the config, e.g. to inject a custom stemmer.
    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub const fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub const fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    fn prepare(&self) -> Result<(BlockStore, SharedAccumulator)> {
        self.config.validate()?;
        let store = BlockStore::open(&self.config.blocks_dir).with_context(|| {
            format!(
                "Failed to open blocks directory {}",
                self.config.blocks_dir.display()
            )
        })?;
        store.clear().context("Failed to remove stale block files")?;
        let accumulator =
            SharedAccumulator::new(BlockAccumulator::new(self.config.block_term_limit));
        Ok((store, accumulator))
    }

    /// Tokenize one document and add it to the open block.
    fn ingest(&self, accumulator: &SharedAccumulator, doc: &Document) -> Ingested {
        let tokens = self.tokenizer.tokenize(&doc.text);
        if tokens.is_empty() {
            tracing::warn!("Skipping document {}: no tokens", doc.doc_id);
            return Ingested::Skipped;
        }
        match accumulator.ingest(doc.doc_id, &tokens, doc.posting_metadata()) {
            Ok(Some(block)) => Ingested::Sealed(block),
            Ok(None) => Ingested::Open,
            Err(e @ IngestError::DuplicateDocument(_)) => {
                tracing::warn!("Skipping document: {}", e);
                Ingested::Skipped
            }
            Err(e @ IngestError::AlreadyFinalized) => {
                tracing::error!("Ingest after finalize: {}", e);
                Ingested::Skipped
            }
        }
    }

    /// Build synchronously from in-memory documents.
    ///
    /// `max_documents` counts every document handed to the tokenizer, including ones
    /// skipped for yielding no tokens, the same way [`IndexBuilder::build_stream`] does.
    pub fn build<'a, I>(&self, documents: I) -> Result<BuildOutcome>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let start = Instant::now();
        let (store, accumulator) = self.prepare()?;
        let mut blocks = Vec::new();
        let mut admitted = 0;
        let mut indexed = 0;
        let mut skipped = 0;
        let mut stopped_early = false;

        for doc in documents {
            if self.config.max_documents.is_some_and(|max| admitted >= max) {
                tracing::info!("Reached document limit of {}", admitted);
                stopped_early = true;
                break;
            }
            admitted += 1;
            match self.ingest(&accumulator, doc) {
                Ingested::Skipped => skipped += 1,
                Ingested::Open => indexed += 1,
                Ingested::Sealed(block) => {
                    indexed += 1;
                    blocks.push(store.write(&block)?);
                }
            }
        }

        if let Some(block) = accumulator.finalize()? {
            blocks.push(store.write(&block)?);
        }

        let (index, merge) =
            BlockMerger::new(store).merge(&blocks, self.tokenizer.options().case_fold);
        log_finished(start, indexed, skipped, blocks.len(), &index);

        Ok(BuildOutcome {
            index,
            blocks,
            merge,
            documents_indexed: indexed,
            documents_skipped: skipped,
            stopped_early,
        })
    }

    /// Build from a document stream, ingesting up to `ingest_concurrency` documents at once.
    ///
    /// Cancelling `cancel` or reaching `max_documents` stops pulling documents; what was
    /// already ingested is flushed and merged into a valid index. A fatal source error
    /// aborts the build.
    pub async fn build_stream(
        &self,
        documents: DocumentStream,
        cancel: CancellationToken,
    ) -> Result<BuildOutcome> {
        let start = Instant::now();
        let (store, accumulator) = self.prepare()?;
        let stop = cancel.child_token();
        let blocks = Mutex::new(Vec::new());
        let admitted = AtomicUsize::new(0);
        let indexed = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let quota_reached = AtomicBool::new(false);

        documents
            .take_until(stop.clone().cancelled_owned())
            .map(Ok::<_, anyhow::Error>)
            .try_for_each_concurrent(self.config.ingest_concurrency, |item| {
                let store = store.clone();
                let accumulator = &accumulator;
                let (stop, blocks) = (&stop, &blocks);
                let (admitted, indexed, skipped) = (&admitted, &indexed, &skipped);
                let quota_reached = &quota_reached;
                async move {
                    let doc = match item {
                        Ok(doc) => doc,
                        Err(e) if e.is_fatal() => return Err(anyhow::Error::from(e)),
                        Err(e) => {
                            tracing::warn!("Skipping document: {}", e);
                            skipped.fetch_add(1, Ordering::Relaxed);
                            return Ok(());
                        }
                    };
                    if stop.is_cancelled() {
                        return Ok(());
                    }
                    // The stream is only stopped once a document past the limit shows up, so
                    // a corpus that exactly fills the quota still ends with the source.
                    if let Some(max) = self.config.max_documents {
                        let slot = admitted.fetch_add(1, Ordering::SeqCst);
                        if slot >= max {
                            if !quota_reached.swap(true, Ordering::SeqCst) {
                                tracing::info!("Reached document limit of {}", max);
                            }
                            stop.cancel();
                            return Ok(());
                        }
                    }

                    match self.ingest(accumulator, &doc) {
                        Ingested::Skipped => {
                            skipped.fetch_add(1, Ordering::Relaxed);
                        }
                        Ingested::Open => {
                            indexed.fetch_add(1, Ordering::Relaxed);
                        }
                        Ingested::Sealed(block) => {
                            indexed.fetch_add(1, Ordering::Relaxed);
                            let info = write_block(store, block).await?;
                            blocks.lock().unwrap_or_else(PoisonError::into_inner).push(info);
                        }
                    }
                    Ok::<(), anyhow::Error>(())
                }
            })
            .await?;

        let stopped_early = cancel.is_cancelled() || quota_reached.into_inner();
        if stopped_early {
            tracing::info!("Build stopped early; finalizing ingested documents");
        }

        if let Some(block) = accumulator.finalize()? {
            let info = write_block(store.clone(), block).await?;
            blocks.lock().unwrap_or_else(PoisonError::into_inner).push(info);
        }

        let mut blocks = blocks.into_inner().unwrap_or_else(PoisonError::into_inner);
        blocks.sort_by_key(|info| info.number);

        let case_folded = self.tokenizer.options().case_fold;
        let merger = BlockMerger::new(store);
        let (index, merge, blocks) = tokio::task::spawn_blocking(move || {
            let (index, merge) = merger.merge(&blocks, case_folded);
            (index, merge, blocks)
        })
        .await
        .context("Block merge task panicked")?;

        let indexed = indexed.into_inner();
        let skipped = skipped.into_inner();
        log_finished(start, indexed, skipped, blocks.len(), &index);

        Ok(BuildOutcome {
            index,
            blocks,
            merge,
            documents_indexed: indexed,
            documents_skipped: skipped,
            stopped_early,
        })
    }
}

/// Write a sealed block off the async runtime.
async fn write_block(store: BlockStore, block: SealedBlock) -> Result<BlockInfo> {
    let number = block.number;
    let info = tokio::task::spawn_blocking(move || store.write(&block))
        .await
        .context("Block writer task panicked")?
        .with_context(|| format!("Failed to write block #{number}"))?;
    Ok(info)
}

fn log_finished(start: Instant, indexed: usize, skipped: usize, blocks: usize, index: &Index) {
    tracing::info!(
        "Indexed {} documents ({} skipped) into {} blocks, {} terms in {:?}",
        indexed,
        skipped,
        blocks,
        index.term_count(),
        start.elapsed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::from_documents;
    use assert2::check;
    use tempfile::TempDir;

    fn config(dir: &TempDir, limit: usize) -> IndexConfig {
        IndexConfig {
            block_term_limit: limit,
            blocks_dir: dir.path().join("blocks"),
            index_path: dir.path().join("index.json"),
            ingest_concurrency: 1,
            ..IndexConfig::default()
        }
    }

    fn scenario() -> Vec<Document> {
        vec![Document::new(1, "Cat Dog"), Document::new(2, "Dog Bird 123")]
    }

    #[test]
    fn test_build_scenario() {
        let dir = TempDir::new().unwrap();
        let outcome = IndexBuilder::new(config(&dir, 4000)).build(&scenario()).unwrap();

        check!(outcome.blocks.len() == 1);
        check!(outcome.documents_indexed == 2);
        check!(!outcome.stopped_early);
        check!(outcome.index.get("dog").unwrap().doc_ids() == [1, 2]);
        check!(outcome.index.get("123").unwrap().doc_ids() == [2]);
        check!(outcome.stats().unique_terms == 4);
    }

    #[test]
    fn test_small_threshold_writes_many_blocks() {
        let dir = TempDir::new().unwrap();
        let outcome = IndexBuilder::new(config(&dir, 2)).build(&scenario()).unwrap();
        check!(outcome.blocks.len() == 2);
        check!(outcome.blocks.iter().map(|b| b.number).collect::<Vec<_>>() == [1, 2]);
        check!(outcome.merge.is_complete());
        check!(outcome.index.get("dog").unwrap().doc_ids() == [1, 2]);
    }

    #[test]
    fn test_empty_documents_skipped() {
        let dir = TempDir::new().unwrap();
        let docs = [Document::new(1, "  "), Document::new(2, "dog")];
        let outcome = IndexBuilder::new(config(&dir, 10)).build(&docs).unwrap();
        check!(outcome.documents_skipped == 1);
        check!(outcome.documents_indexed == 1);
    }

    #[test]
    fn test_no_documents_no_blocks() {
        let dir = TempDir::new().unwrap();
        let outcome = IndexBuilder::new(config(&dir, 10))
            .build(&Vec::<Document>::new())
            .unwrap();
        check!(outcome.blocks.is_empty());
        check!(outcome.index.is_empty());
    }

    #[tokio::test]
    async fn test_build_stream_matches_sync_build() {
        let dir = TempDir::new().unwrap();
        let builder = IndexBuilder::new(config(&dir, 3));
        let sync = builder.build(&scenario()).unwrap();
        let streamed = builder
            .build_stream(from_documents(scenario()), CancellationToken::new())
            .await
            .unwrap();
        check!(streamed.index.doc_id_map() == sync.index.doc_id_map());
        check!(streamed.documents_indexed == 2);
    }

    #[tokio::test]
    async fn test_quota_stops_stream() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, 10);
        cfg.max_documents = Some(1);
        let outcome = IndexBuilder::new(cfg)
            .build_stream(from_documents(scenario()), CancellationToken::new())
            .await
            .unwrap();

        check!(outcome.stopped_early);
        check!(outcome.documents_indexed == 1);
        check!(outcome.index.get("dog").unwrap().doc_ids() == [1]);
        check!(!outcome.index.contains("bird"));
    }

    #[tokio::test]
    async fn test_quota_counts_skipped_documents_in_both_builds() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, 10);
        cfg.max_documents = Some(2);
        let docs = vec![
            Document::new(1, "  ...  "),
            Document::new(2, "alpha"),
            Document::new(3, "beta"),
        ];
        let builder = IndexBuilder::new(cfg);

        let sync = builder.build(&docs).unwrap();
        let streamed = builder
            .build_stream(from_documents(docs), CancellationToken::new())
            .await
            .unwrap();

        check!(sync.index.doc_id_map() == streamed.index.doc_id_map());
        check!(sync.documents_indexed == 1);
        check!(streamed.documents_indexed == 1);
        check!(sync.documents_skipped == streamed.documents_skipped);
        check!(!sync.index.contains("beta"));
        check!(sync.stopped_early);
        check!(streamed.stopped_early);
    }

    #[tokio::test]
    async fn test_quota_equal_to_corpus_is_not_an_early_stop() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, 10);
        cfg.max_documents = Some(2);
        let builder = IndexBuilder::new(cfg);

        let sync = builder.build(&scenario()).unwrap();
        let streamed = builder
            .build_stream(from_documents(scenario()), CancellationToken::new())
            .await
            .unwrap();

        check!(!sync.stopped_early);
        check!(!streamed.stopped_early);
        check!(streamed.documents_indexed == 2);
        check!(streamed.index.doc_id_map() == sync.index.doc_id_map());
    }
}
