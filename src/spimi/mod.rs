//! Single-pass in-memory indexing: bounded blocks, block files and the final merge.

pub(crate) mod accumulator;
pub(crate) mod block;
pub(crate) mod merge;
mod traditional;

pub use accumulator::{BlockAccumulator, DEFAULT_BLOCK_TERM_LIMIT, SealedBlock, SharedAccumulator};
pub use block::{BlockInfo, BlockStore};
pub use merge::{BlockMerger, MergeReport, SkippedBlock};
pub use traditional::build_traditional;
