//! The inverted index data model: postings, term dictionary, size stats and persistence.

pub(crate) mod postings;
pub(crate) mod stats;
mod store;

pub use postings::{Index, PostingsList};
pub use stats::{IndexStats, StatsTable};
