//! Postings lists and the term dictionary.

use crate::index::IndexStats;
use crate::types::{DocId, Posting};
use ahash::AHashMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// All postings recorded for one term.
///
/// Lists are append-only while a block is open. [`PostingsList::normalize`] and
/// [`PostingsList::union`] restore the merged-index invariant: unique by doc id,
/// ascending numeric order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingsList {
    postings: Vec<Posting>,
}

impl PostingsList {
    pub const fn new() -> Self {
        Self {
            postings: Vec::new(),
        }
    }

    pub fn push(&mut self, posting: Posting) {
        self.postings.push(posting);
    }

    /// Append every posting of `other` without reordering or deduplicating.
    pub fn append(&mut self, other: Self) {
        self.postings.extend(other.postings);
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    pub fn as_slice(&self) -> &[Posting] {
        &self.postings
    }

    /// Doc ids in list order.
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.postings.iter().map(|p| p.doc_id).collect()
    }

    pub fn contains_doc(&self, doc_id: DocId) -> bool {
        self.postings.iter().any(|p| p.doc_id == doc_id)
    }

    /// Number of distinct doc ids, regardless of list order.
    pub fn distinct_docs(&self) -> usize {
        if self.is_sorted_unique() {
            return self.postings.len();
        }
        let mut ids = self.doc_ids();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Whether the list is strictly ascending by doc id.
    pub fn is_sorted_unique(&self) -> bool {
        self.postings.windows(2).all(|w| w[0].doc_id < w[1].doc_id)
    }

    /// Sort ascending by doc id and drop repeated doc ids, keeping the first-seen posting.
    ///
    /// Returns the number of postings dropped.
    pub fn normalize(&mut self) -> usize {
        let before = self.postings.len();
        // Stable sort keeps first-seen order among equal doc ids.
        self.postings.sort_by_key(|p| p.doc_id);
        self.postings.dedup_by_key(|p| p.doc_id);
        before - self.postings.len()
    }

    /// Merge the postings of another term into this one.
    ///
    /// Used when distinct terms collapse into one key (case folding, stemming): postings
    /// for the same doc id are combined into one whose frequency is the sum and whose
    /// metadata is the first one present.
    pub fn union(&mut self, other: Self) {
        self.postings.extend(other.postings);
        self.postings.sort_by_key(|p| p.doc_id);

        let mut merged: Vec<Posting> = Vec::with_capacity(self.postings.len());
        for posting in self.postings.drain(..) {
            match merged.last_mut() {
                Some(last) if last.doc_id == posting.doc_id => {
                    last.frequency = last.frequency.saturating_add(posting.frequency);
                    if last.metadata.is_none() {
                        last.metadata = posting.metadata;
                    }
                }
                _ => merged.push(posting),
            }
        }
        self.postings = merged;
    }
}

impl FromIterator<Posting> for PostingsList {
    fn from_iter<I: IntoIterator<Item = Posting>>(iter: I) -> Self {
        Self {
            postings: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PostingsList {
    type Item = Posting;
    type IntoIter = std::vec::IntoIter<Posting>;

    fn into_iter(self) -> Self::IntoIter {
        self.postings.into_iter()
    }
}

impl<'a> IntoIterator for &'a PostingsList {
    type Item = &'a Posting;
    type IntoIter = std::slice::Iter<'a, Posting>;

    fn into_iter(self) -> Self::IntoIter {
        self.postings.iter()
    }
}

/// Term dictionary: term → postings list.
///
/// The `case_folded` flag records whether keys were produced under case folding, which
/// decides whether query terms are lowercased before lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    case_folded: bool,
    #[serde(serialize_with = "serialize_sorted")]
    terms: AHashMap<String, PostingsList>,
}

impl Index {
    pub fn new(case_folded: bool) -> Self {
        Self {
            case_folded,
            terms: AHashMap::new(),
        }
    }

    pub fn with_capacity(case_folded: bool, capacity: usize) -> Self {
        Self {
            case_folded,
            terms: AHashMap::with_capacity(capacity),
        }
    }

    pub const fn is_case_folded(&self) -> bool {
        self.case_folded
    }

    pub fn get(&self, term: &str) -> Option<&PostingsList> {
        self.terms.get(term)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// Postings list for `term`, created empty when missing.
    pub fn get_or_insert(&mut self, term: &str) -> &mut PostingsList {
        self.terms.entry(term.to_owned()).or_default()
    }

    /// Replace the postings list for `term`, returning the previous one.
    pub fn insert(&mut self, term: impl Into<String>, postings: PostingsList) -> Option<PostingsList> {
        self.terms.insert(term.into(), postings)
    }

    pub fn remove(&mut self, term: &str) -> Option<PostingsList> {
        self.terms.remove(term)
    }

    /// Number of unique terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PostingsList)> {
        self.terms.iter()
    }

    /// Entries sorted by term.
    pub fn sorted_entries(&self) -> Vec<(&str, &PostingsList)> {
        let mut entries: Vec<_> = self.terms.iter().map(|(t, p)| (t.as_str(), p)).collect();
        entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }

    /// Total postings stored, counting repeated doc ids.
    pub fn posting_count(&self) -> usize {
        self.terms.values().map(PostingsList::len).sum()
    }

    /// Sum over all terms of the number of distinct doc ids.
    pub fn non_positional_postings(&self) -> usize {
        self.terms.values().map(PostingsList::distinct_docs).sum()
    }

    pub fn stats(&self, label: impl Into<String>) -> IndexStats {
        IndexStats {
            label: label.into(),
            unique_terms: self.term_count(),
            non_positional_postings: self.non_positional_postings(),
        }
    }

    /// Normalize every postings list (sort by doc id, first-seen dedup).
    ///
    /// Returns the number of duplicate postings dropped.
    pub fn normalize(&mut self) -> usize {
        self.terms.values_mut().map(PostingsList::normalize).sum()
    }

    /// Doc ids per term, sorted by term. Used to compare indexes built different ways.
    pub fn doc_id_map(&self) -> BTreeMap<String, Vec<DocId>> {
        self.terms
            .iter()
            .map(|(term, postings)| {
                let mut ids = postings.doc_ids();
                ids.sort_unstable();
                ids.dedup();
                (term.clone(), ids)
            })
            .collect()
    }
}

impl IntoIterator for Index {
    type Item = (String, PostingsList);
    type IntoIter = <AHashMap<String, PostingsList> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.into_iter()
    }
}

impl Extend<(String, PostingsList)> for Index {
    /// Append postings term by term, creating missing terms.
    fn extend<I: IntoIterator<Item = (String, PostingsList)>>(&mut self, iter: I) {
        for (term, postings) in iter {
            self.terms.entry(term).or_default().append(postings);
        }
    }
}

/// Writes the term map with keys in sorted order so index files are deterministic.
fn serialize_sorted<S: Serializer>(
    terms: &AHashMap<String, PostingsList>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let sorted: BTreeMap<&String, &PostingsList> = terms.iter().collect();
    sorted.serialize(serializer)
}
