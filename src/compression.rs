//! Lossy dictionary compression: an ordered chain of `Index → Index` transforms.
//!
//! Every stage returns a new index and leaves its input untouched, so callers can keep
//! the uncompressed index around for comparison.

use crate::analysis::stopwords::lowercase;
use crate::analysis::{PorterStemmer, Stemmer, StopwordList, is_numeric_term};
use crate::index::{Index, IndexStats};
use std::borrow::Cow;
use std::sync::Arc;

/// Merge terms that differ only by case. The result is flagged case-folded.
pub fn case_fold(index: &Index) -> Index {
    merge_terms(index, true, lowercase)
}

/// Drop terms made only of ASCII digits. Mixed terms such as `abc123` survive.
pub fn remove_numeric(index: &Index) -> Index {
    retain_terms(index, |term| !is_numeric_term(term))
}

/// Drop terms found in `list`, compared case-insensitively.
pub fn remove_stopwords(index: &Index, list: StopwordList) -> Index {
    retain_terms(index, |term| !list.contains(term))
}

pub fn remove_stopwords_small(index: &Index) -> Index {
    remove_stopwords(index, StopwordList::Small)
}

pub fn remove_stopwords_large(index: &Index) -> Index {
    remove_stopwords(index, StopwordList::Large)
}

/// Map every term to its stem and union the postings of terms sharing a root.
pub fn stem_terms(index: &Index, stemmer: &dyn Stemmer) -> Index {
    merge_terms(index, index.is_case_folded(), |term| stemmer.stem(term))
}

fn retain_terms(index: &Index, keep: impl Fn(&str) -> bool) -> Index {
    let mut out = Index::with_capacity(index.is_case_folded(), index.term_count());
    for (term, postings) in index.iter().filter(|(term, _)| keep(term.as_str())) {
        out.insert(term.clone(), postings.clone());
    }
    out
}

/// Rekey every term through `key`, unioning postings that land on the same key.
///
/// Terms are visited in sorted order so the surviving metadata is deterministic.
fn merge_terms<F>(index: &Index, case_folded: bool, key: F) -> Index
where
    F: for<'a> Fn(&'a str) -> Cow<'a, str>,
{
    let mut out = Index::with_capacity(case_folded, index.term_count());
    for (term, postings) in index.sorted_entries() {
        out.get_or_insert(&key(term)).union(postings.clone());
    }
    out
}

/// One step of the pipeline. Stages always run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CaseFold,
    NoNumeric,
    Stopwords30,
    Stopwords150,
    Stem,
}

impl Stage {
    pub const ALL: [Self; 5] = [
        Self::CaseFold,
        Self::NoNumeric,
        Self::Stopwords30,
        Self::Stopwords150,
        Self::Stem,
    ];

    /// Row label used in stats tables.
    pub const fn label(self) -> &'static str {
        match self {
            Self::CaseFold => "Case folded",
            Self::NoNumeric => "No numeric terms",
            Self::Stopwords30 => "30 stopwords removed",
            Self::Stopwords150 => "150 stopwords removed",
            Self::Stem => "Stemmed",
        }
    }

    pub fn apply(self, index: &Index, stemmer: &dyn Stemmer) -> Index {
        match self {
            Self::CaseFold => case_fold(index),
            Self::NoNumeric => remove_numeric(index),
            Self::Stopwords30 => remove_stopwords_small(index),
            Self::Stopwords150 => remove_stopwords_large(index),
            Self::Stem => stem_terms(index, stemmer),
        }
    }
}

/// Label of the stats row describing the pipeline's input.
pub const UNCOMPRESSED_LABEL: &str = "Uncompressed";

/// Runs every [`Stage`] in order over an index.
#[derive(Clone)]
pub struct CompressionPipeline {
    stemmer: Arc<dyn Stemmer>,
}

impl std::fmt::Debug for CompressionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionPipeline").finish_non_exhaustive()
    }
}

impl Default for CompressionPipeline {
    fn default() -> Self {
        Self::new(Arc::new(PorterStemmer::default()))
    }
}

impl CompressionPipeline {
    pub fn new(stemmer: Arc<dyn Stemmer>) -> Self {
        Self { stemmer }
    }

    pub fn stemmer(&self) -> Arc<dyn Stemmer> {
        Arc::clone(&self.stemmer)
    }

    /// Compress `index`, returning the final index and one stats row for the input
    /// followed by one per stage.
    pub fn run(&self, index: &Index) -> (Index, Vec<IndexStats>) {
        let mut stats = Vec::with_capacity(Stage::ALL.len() + 1);
        stats.push(index.stats(UNCOMPRESSED_LABEL));

        let mut current = index.clone();
        for stage in Stage::ALL {
            current = stage.apply(&current, self.stemmer.as_ref());
            let row = current.stats(stage.label());
            tracing::debug!(
                "{}: {} terms, {} postings",
                row.label,
                row.unique_terms,
                row.non_positional_postings
            );
            stats.push(row);
        }

        tracing::info!(
            "Compressed {} terms down to {}",
            index.term_count(),
            current.term_count()
        );
        (current, stats)
    }
}
