//! Bounded in-memory block accumulation.

use crate::error::IngestError;
use crate::index::{Index, PostingsList};
use crate::types::{DocId, DocMetadata, Posting};
use ahash::{AHashMap, AHashSet};
use std::sync::{Arc, Mutex, PoisonError};

/// Reference distinct-term threshold at which a block is flushed.
pub const DEFAULT_BLOCK_TERM_LIMIT: usize = 4000;

/// A block taken out of the accumulator, numbered and ready to be written.
///
/// Entries are sorted by term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlock {
    pub number: u32,
    pub entries: Vec<(String, PostingsList)>,
}

impl SealedBlock {
    pub fn term_count(&self) -> usize {
        self.entries.len()
    }

    pub fn posting_count(&self) -> usize {
        self.entries.iter().map(|(_, postings)| postings.len()).sum()
    }
}

/// Accumulates postings for the open block and seals it once it holds
/// `threshold` distinct terms.
///
/// One accumulator serves one build; block numbers start at 1.
#[derive(Debug)]
pub struct BlockAccumulator {
    terms: Index,
    doc_ids: AHashSet<DocId>,
    threshold: usize,
    blocks_sealed: u32,
    finalized: bool,
}

impl Default for BlockAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_TERM_LIMIT)
    }
}

impl BlockAccumulator {
    /// Create an accumulator. A zero threshold is treated as 1.
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            terms: Index::with_capacity(false, threshold),
            doc_ids: AHashSet::new(),
            threshold,
            blocks_sealed: 0,
            finalized: false,
        }
    }

    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Distinct terms in the open block.
    pub fn term_count(&self) -> usize {
        self.terms.term_count()
    }

    /// Number of blocks sealed so far, which is also the number of the last one.
    pub const fn blocks_sealed(&self) -> u32 {
        self.blocks_sealed
    }

    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Add one document's tokens to the open block.
    ///
    /// Each distinct token gets one posting carrying its in-document frequency. When the
    /// open block reaches the threshold it is sealed and returned; the caller writes it.
    /// A doc id already present in the open block is rejected without touching the block.
    pub fn ingest<S: AsRef<str>>(
        &mut self,
        doc_id: DocId,
        tokens: &[S],
        metadata: Option<DocMetadata>,
    ) -> Result<Option<SealedBlock>, IngestError> {
        if self.finalized {
            return Err(IngestError::AlreadyFinalized);
        }
        if self.doc_ids.contains(&doc_id) {
            return Err(IngestError::DuplicateDocument(doc_id));
        }

        let mut counts: AHashMap<&str, u32> = AHashMap::with_capacity(tokens.len());
        for token in tokens {
            *counts.entry(token.as_ref()).or_insert(0) += 1;
        }

        for (term, frequency) in counts {
            self.terms
                .get_or_insert(term)
                .push(Posting::new(doc_id, frequency).with_metadata(metadata.clone()));
        }
        self.doc_ids.insert(doc_id);

        if self.terms.term_count() >= self.threshold {
            return Ok(Some(self.seal()));
        }
        Ok(None)
    }

    /// Seal whatever remains in the open block. Callable once; an empty remainder
    /// produces no block.
    pub fn finalize(&mut self) -> Result<Option<SealedBlock>, IngestError> {
        if self.finalized {
            return Err(IngestError::AlreadyFinalized);
        }
        self.finalized = true;

        if self.terms.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.seal()))
    }

    fn seal(&mut self) -> SealedBlock {
        self.blocks_sealed += 1;
        let terms = std::mem::replace(&mut self.terms, Index::with_capacity(false, self.threshold));
        self.doc_ids.clear();

        let mut entries: Vec<(String, PostingsList)> = terms.into_iter().collect();
        entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

        tracing::debug!(
            "Sealed block #{} ({} terms)",
            self.blocks_sealed,
            entries.len()
        );

        SealedBlock {
            number: self.blocks_sealed,
            entries,
        }
    }
}

/// A [`BlockAccumulator`] shared between concurrent producers.
///
/// The lock covers only the in-memory insert, the threshold check and block sealing.
/// Sealed blocks are moved out, so callers write them after the lock is released.
#[derive(Debug, Clone)]
pub struct SharedAccumulator {
    inner: Arc<Mutex<BlockAccumulator>>,
}

impl SharedAccumulator {
    pub fn new(accumulator: BlockAccumulator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(accumulator)),
        }
    }

    pub fn ingest<S: AsRef<str>>(
        &self,
        doc_id: DocId,
        tokens: &[S],
        metadata: Option<DocMetadata>,
    ) -> Result<Option<SealedBlock>, IngestError> {
        self.lock().ingest(doc_id, tokens, metadata)
    }

    pub fn finalize(&self) -> Result<Option<SealedBlock>, IngestError> {
        self.lock().finalize()
    }

    pub fn term_count(&self) -> usize {
        self.lock().term_count()
    }

    pub fn blocks_sealed(&self) -> u32 {
        self.lock().blocks_sealed()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BlockAccumulator> {
        // Every critical section leaves the accumulator consistent, so a poisoned lock
        // still guards valid state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
