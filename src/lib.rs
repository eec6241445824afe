pub mod analysis;
pub mod builder;
pub mod cli;
pub mod compare;
pub mod compression;
pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod source;
pub mod spimi;
pub mod tracing;
pub mod types;

pub use analysis::{NoopStemmer, PorterStemmer, Stemmer, StopwordList, TextEncoding, Tokenizer, TokenizerOptions};
pub use builder::{BuildOutcome, IndexBuilder};
pub use compare::{Comparison, QueryCheck, compare};
pub use compression::{CompressionPipeline, Stage};
pub use config::IndexConfig;
pub use error::{BlockError, IngestError, Result, SourceError};
pub use index::{Index, IndexStats, PostingsList, StatsTable};
pub use query::{Query, QueryEngine, QueryResult, and_all, and_query, intersect, lookup};
pub use source::{DirectorySource, DocumentStream, JsonLinesSource, collect_documents};
pub use spimi::{BlockAccumulator, BlockInfo, BlockMerger, BlockStore, MergeReport, build_traditional};
pub use types::{DocId, DocMetadata, Document, Posting};
