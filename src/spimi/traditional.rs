//! Sort-based reference build: collect every (term, doc id) pair, sort, group.
//!
//! Holds the whole pair list in memory. The SPIMI path must produce the same
//! term → doc id sets for any block threshold.

use crate::analysis::Tokenizer;
use crate::index::Index;
use crate::types::{DocId, DocMetadata, Document, Posting};
use ahash::AHashMap;

/// Build an index over `documents` without blocking.
///
/// Repeated (term, doc id) pairs collapse into one posting whose frequency is the number
/// of repeats.
pub fn build_traditional<'a, I>(documents: I, tokenizer: &Tokenizer) -> Index
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut pairs: Vec<(String, DocId)> = Vec::new();
    let mut metadata: AHashMap<DocId, DocMetadata> = AHashMap::new();

    for doc in documents {
        pairs.extend(
            tokenizer
                .tokenize(&doc.text)
                .into_iter()
                .map(|term| (term, doc.doc_id)),
        );
        if !doc.metadata.is_empty() {
            metadata.entry(doc.doc_id).or_insert_with(|| doc.metadata.clone());
        }
    }

    pairs.sort_unstable();

    let mut index = Index::new(tokenizer.options().case_fold);
    for run in pairs.chunk_by(|a, b| a == b) {
        let (term, doc_id) = &run[0];
        let posting = Posting::new(*doc_id, run.len() as u32)
            .with_metadata(metadata.get(doc_id).cloned());
        index.get_or_insert(term).push(posting);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn test_traditional_scenario() {
        let docs = [Document::new(1, "Cat Dog"), Document::new(2, "Dog Bird 123 dog")];
        let index = build_traditional(&docs, &Tokenizer::default());

        check!(index.term_count() == 4);
        check!(index.get("dog").unwrap().doc_ids() == [1, 2]);
        check!(index.get("dog").unwrap().as_slice()[1].frequency == 2);
        check!(index.get("123").unwrap().doc_ids() == [2]);
        check!(index.is_case_folded());
    }
}
