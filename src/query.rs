//! Boolean term queries over a finalized index.
//!
//! Queries never mutate the index; an [`Index`] can be shared across threads and queried
//! concurrently.

use crate::analysis::Stemmer;
use crate::error::Result;
use crate::index::Index;
use crate::types::{DocId, Posting};
use anyhow::Context;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Normalize a query term the way the index keys were produced: trim, then lowercase
/// when the index is case-folded.
pub fn normalize_term<'a>(index: &Index, term: &'a str) -> Cow<'a, str> {
    let term = term.trim();
    if index.is_case_folded() {
        crate::analysis::stopwords::lowercase(term)
    } else {
        Cow::Borrowed(term)
    }
}

/// Doc ids of every document containing `term`, ascending. Empty when the term is absent.
pub fn lookup(index: &Index, term: &str) -> Vec<DocId> {
    index
        .get(&normalize_term(index, term))
        .map(|postings| postings.doc_ids())
        .unwrap_or_default()
}

/// Two-cursor intersection of doc id lists, compared numerically.
///
/// Inputs are expected ascending; an input that is not is sorted on a copy first. Output
/// is ascending without repeats.
pub fn intersect(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let a = sorted(a);
    let b = sorted(b);

    let mut answer = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                if answer.last() != Some(&a[i]) {
                    answer.push(a[i]);
                }
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    answer
}

fn sorted(ids: &[DocId]) -> Cow<'_, [DocId]> {
    if ids.is_sorted() {
        Cow::Borrowed(ids)
    } else {
        let mut owned = ids.to_vec();
        owned.sort_unstable();
        Cow::Owned(owned)
    }
}

/// Documents containing both `a` and `b`. Empty when either term is absent.
pub fn and_query(index: &Index, a: &str, b: &str) -> Vec<DocId> {
    let (Some(left), Some(right)) = (
        index.get(&normalize_term(index, a)),
        index.get(&normalize_term(index, b)),
    ) else {
        return Vec::new();
    };
    intersect(&left.doc_ids(), &right.doc_ids())
}

/// Documents containing every term, intersecting left to right.
///
/// Stops as soon as an intermediate result is empty. No terms means no documents.
pub fn and_all<S: AsRef<str>>(index: &Index, terms: &[S]) -> Vec<DocId> {
    let Some((first, rest)) = terms.split_first() else {
        return Vec::new();
    };
    let mut result = lookup(index, first.as_ref());
    for term in rest {
        if result.is_empty() {
            break;
        }
        result = intersect(&result, &lookup(index, term.as_ref()));
    }
    result
}

/// A boolean query over terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Term(String),
    And(Vec<String>),
}

impl Query {
    /// One term becomes a lookup, several an AND. Blank terms are ignored.
    pub fn from_terms<I, S>(terms: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut terms: Vec<String> = terms
            .into_iter()
            .map(Into::into)
            .filter(|term| !term.trim().is_empty())
            .collect();
        match terms.len() {
            0 => None,
            1 => terms.pop().map(Self::Term),
            _ => Some(Self::And(terms)),
        }
    }

    pub fn terms(&self) -> &[String] {
        match self {
            Self::Term(term) => std::slice::from_ref(term),
            Self::And(terms) => terms,
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.terms().join(" AND "))
    }
}

/// What a query matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    /// Query terms as given.
    pub terms: Vec<String>,
    /// Terms after normalization, as looked up in the index.
    pub normalized: Vec<String>,
    pub doc_ids: Vec<DocId>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }
}

/// Query front end bound to one index.
///
/// With a stemmer attached, query terms go through the same stemming as the index keys,
/// which makes queries against a stemmed index match their roots.
#[derive(Clone)]
pub struct QueryEngine<'a> {
    index: &'a Index,
    stemmer: Option<Arc<dyn Stemmer>>,
}

impl std::fmt::Debug for QueryEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("terms", &self.index.term_count())
            .field("stemmed", &self.stemmer.is_some())
            .finish()
    }
}

impl<'a> QueryEngine<'a> {
    pub const fn new(index: &'a Index) -> Self {
        Self {
            index,
            stemmer: None,
        }
    }

    pub fn with_stemmer(mut self, stemmer: Arc<dyn Stemmer>) -> Self {
        self.stemmer = Some(stemmer);
        self
    }

    pub const fn index(&self) -> &'a Index {
        self.index
    }

    /// The key a query term is looked up under.
    pub fn normalize(&self, term: &str) -> String {
        let term = normalize_term(self.index, term);
        match &self.stemmer {
            Some(stemmer) => stemmer.stem(&term).into_owned(),
            None => term.into_owned(),
        }
    }

    pub fn lookup(&self, term: &str) -> Vec<DocId> {
        lookup(self.index, &self.normalize(term))
    }

    pub fn and_query(&self, a: &str, b: &str) -> Vec<DocId> {
        and_query(self.index, &self.normalize(a), &self.normalize(b))
    }

    pub fn and_all<S: AsRef<str>>(&self, terms: &[S]) -> Vec<DocId> {
        let normalized: Vec<String> = terms.iter().map(|t| self.normalize(t.as_ref())).collect();
        and_all(self.index, &normalized)
    }

    pub fn run(&self, query: &Query) -> QueryResult {
        let normalized: Vec<String> = query.terms().iter().map(|t| self.normalize(t)).collect();
        let doc_ids = match query {
            Query::Term(_) => lookup(self.index, &normalized[0]),
            Query::And(_) => and_all(self.index, &normalized),
        };
        tracing::debug!("Query '{}' matched {} documents", query, doc_ids.len());
        QueryResult {
            terms: query.terms().to_vec(),
            normalized,
            doc_ids,
        }
    }

    /// Full postings for each query term, keyed by the term as given.
    pub fn export<S: AsRef<str>>(&self, terms: &[S]) -> BTreeMap<String, Vec<Posting>> {
        terms
            .iter()
            .map(|term| {
                let term = term.as_ref();
                let postings = self
                    .index
                    .get(&self.normalize(term))
                    .map(|list| list.as_slice().to_vec())
                    .unwrap_or_else(|| {
                        tracing::warn!("Term '{}' not found in index", term);
                        Vec::new()
                    });
                (term.trim().to_string(), postings)
            })
            .collect()
    }

    /// Write [`QueryEngine::export`] for `terms` as pretty JSON.
    pub fn write_export<S: AsRef<str>>(&self, terms: &[S], path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.export(terms))
            .context("Failed to serialize query export")?;
        writer.flush()?;
        tracing::info!("Saved query export to {}", path.display());
        Ok(())
    }
}
