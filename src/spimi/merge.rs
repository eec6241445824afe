//! Merging block files into the final index.

use super::block::{BlockInfo, BlockStore};
use crate::index::Index;
use std::time::Instant;

/// A block the merger could not use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBlock {
    pub number: u32,
    /// Terms the block held when it was written.
    pub term_count: usize,
    pub reason: String,
}

/// Outcome of a merge beyond the index itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub blocks_merged: usize,
    pub skipped: Vec<SkippedBlock>,
    /// Sum of `term_count` over skipped blocks.
    pub omitted_terms: usize,
    /// Postings dropped because their doc id was already present for the term.
    pub duplicate_postings: usize,
}

impl MergeReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Combines numbered block files into one final index.
#[derive(Debug, Clone)]
pub struct BlockMerger {
    store: BlockStore,
}

impl BlockMerger {
    pub const fn new(store: BlockStore) -> Self {
        Self { store }
    }

    /// Merge the given blocks in block-number order.
    ///
    /// Postings are appended term by term; once every block is consumed each list is
    /// sorted by doc id and deduplicated, keeping the first-seen posting. Unreadable
    /// blocks are skipped and reported rather than failing the merge.
    pub fn merge(&self, blocks: &[BlockInfo], case_folded: bool) -> (Index, MergeReport) {
        let start = Instant::now();
        let mut ordered: Vec<&BlockInfo> = blocks.iter().collect();
        ordered.sort_by_key(|info| info.number);

        let mut index = Index::new(case_folded);
        let mut report = MergeReport::default();

        for info in ordered {
            match self.store.read(info.number) {
                Ok(entries) => {
                    tracing::debug!("Merging block #{} ({} terms)", info.number, entries.len());
                    index.extend(entries);
                    report.blocks_merged += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping block #{}: {} ({} terms omitted)",
                        info.number,
                        e,
                        info.term_count
                    );
                    report.omitted_terms += info.term_count;
                    report.skipped.push(SkippedBlock {
                        number: info.number,
                        term_count: info.term_count,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.duplicate_postings = index.normalize();
        if report.duplicate_postings > 0 {
            tracing::warn!(
                "Dropped {} duplicate postings while merging",
                report.duplicate_postings
            );
        }

        tracing::info!(
            "Merged {} blocks into {} terms in {:?} ({} skipped)",
            report.blocks_merged,
            index.term_count(),
            start.elapsed(),
            report.skipped.len()
        );

        (index, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::PostingsList;
    use crate::spimi::SealedBlock;
    use crate::types::Posting;
    use assert2::check;
    use tempfile::TempDir;

    fn block(number: u32, entries: &[(&str, &[u32])]) -> SealedBlock {
        SealedBlock {
            number,
            entries: entries
                .iter()
                .map(|(term, ids)| {
                    let postings: PostingsList = ids.iter().map(|&id| Posting::new(id, 1)).collect();
                    ((*term).to_string(), postings)
                })
                .collect(),
        }
    }

    #[test]
    fn test_merge_sorts_numerically_across_blocks() {
        let dir = TempDir::new().unwrap();
        let store = BlockStore::open(dir.path()).unwrap();
        let infos = vec![
            store.write(&block(1, &[("dog", &[10, 9])])).unwrap(),
            store.write(&block(2, &[("dog", &[100, 2]), ("cat", &[2])])).unwrap(),
        ];

        let (index, report) = BlockMerger::new(store).merge(&infos, true);
        check!(report.is_complete());
        check!(report.blocks_merged == 2);
        check!(index.get("dog").unwrap().doc_ids() == [2, 9, 10, 100]);
        check!(index.get("cat").unwrap().doc_ids() == [2]);
        check!(index.is_case_folded());
    }

    #[test]
    fn test_first_seen_wins_on_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = BlockStore::open(dir.path()).unwrap();
        let mut first = block(1, &[("dog", &[5])]);
        first.entries[0].1 = [Posting::new(5, 3)].into_iter().collect();
        let mut second = block(2, &[("dog", &[5])]);
        second.entries[0].1 = [Posting::new(5, 8)].into_iter().collect();
        let infos = vec![store.write(&first).unwrap(), store.write(&second).unwrap()];

        let (index, report) = BlockMerger::new(store).merge(&infos, true);
        check!(report.duplicate_postings == 1);
        check!(index.get("dog").unwrap().as_slice() == [Posting::new(5, 3)]);
    }

    #[test]
    fn test_missing_block_skipped_and_counted() {
        let dir = TempDir::new().unwrap();
        let store = BlockStore::open(dir.path()).unwrap();
        let infos = vec![
            store.write(&block(1, &[("dog", &[1])])).unwrap(),
            store.write(&block(2, &[("cat", &[2]), ("emu", &[2])])).unwrap(),
            store.write(&block(3, &[("fox", &[3])])).unwrap(),
        ];
        std::fs::remove_file(&infos[1].path).unwrap();

        let (index, report) = BlockMerger::new(store).merge(&infos, true);
        check!(report.blocks_merged == 2);
        check!(report.omitted_terms == 2);
        check!(report.skipped.len() == 1);
        check!(report.skipped[0].number == 2);
        check!(index.contains("dog"));
        check!(index.contains("fox"));
        check!(!index.contains("cat"));
    }
}
