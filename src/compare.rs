//! Sort-based and SPIMI builds of one corpus, timed and checked against each other.

use crate::builder::{BuildOutcome, IndexBuilder};
use crate::error::Result;
use crate::index::{Index, StatsTable};
use crate::query::{Query, QueryEngine};
use crate::spimi::build_traditional;
use crate::types::{DocId, Document};
use std::time::{Duration, Instant};

/// One query answered by both indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCheck {
    pub query: Query,
    pub traditional: Vec<DocId>,
    pub spimi: Vec<DocId>,
}

impl QueryCheck {
    pub fn agrees(&self) -> bool {
        self.traditional == self.spimi
    }
}

#[derive(Debug)]
pub struct Comparison {
    pub traditional: Index,
    pub traditional_time: Duration,
    pub spimi: BuildOutcome,
    pub spimi_time: Duration,
    pub queries: Vec<QueryCheck>,
}

impl Comparison {
    /// Whether both indexes map every term to the same doc ids.
    pub fn same_postings(&self) -> bool {
        self.traditional.doc_id_map() == self.spimi.index.doc_id_map()
    }

    pub fn is_consistent(&self) -> bool {
        self.same_postings() && self.queries.iter().all(QueryCheck::agrees)
    }

    /// Slower build time over faster build time; 1.0 when either is too short to measure.
    pub fn time_ratio(&self) -> f64 {
        let (a, b) = (
            self.traditional_time.as_secs_f64(),
            self.spimi_time.as_secs_f64(),
        );
        let fastest = a.min(b);
        if fastest > 0.0 { a.max(b) / fastest } else { 1.0 }
    }

    pub fn stats_table(&self) -> StatsTable {
        StatsTable::new(vec![
            self.traditional.stats("Traditional index"),
            self.spimi.stats(),
        ])
    }
}

/// Build `documents` both ways with the builder's tokenizer and run `queries` on each.
///
/// The builder's `max_documents` quota applies to both builds.
pub fn compare(builder: &IndexBuilder, documents: &[Document], queries: &[Query]) -> Result<Comparison> {
    let documents = match builder.config().max_documents {
        Some(max) => &documents[..max.min(documents.len())],
        None => documents,
    };

    let start = Instant::now();
    let traditional = build_traditional(documents, builder.tokenizer());
    let traditional_time = start.elapsed();
    tracing::info!(
        "Traditional index: {} terms in {:?}",
        traditional.term_count(),
        traditional_time
    );

    let start = Instant::now();
    let spimi = builder.build(documents)?;
    let spimi_time = start.elapsed();

    let queries = {
        let on_traditional = QueryEngine::new(&traditional);
        let on_spimi = QueryEngine::new(&spimi.index);
        queries
            .iter()
            .map(|query| QueryCheck {
                query: query.clone(),
                traditional: on_traditional.run(query).doc_ids,
                spimi: on_spimi.run(query).doc_ids,
            })
            .collect()
    };

    Ok(Comparison {
        traditional,
        traditional_time,
        spimi,
        spimi_time,
        queries,
    })
}
