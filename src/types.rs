//! Shared data types: documents and postings.

use serde::{Deserialize, Serialize};

/// Numeric document identifier, assigned by the document source before ingestion.
pub type DocId = u32;

/// Descriptive metadata carried alongside a document and its postings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMetadata {
    pub url: Option<String>,
    pub title: Option<String>,
}

impl DocMetadata {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: Some(title.into()),
        }
    }

    /// True when neither field is set.
    pub const fn is_empty(&self) -> bool {
        self.url.is_none() && self.title.is_none()
    }
}

/// An already-extracted document, consumed exactly once by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub doc_id: DocId,
    pub text: String,
    pub metadata: DocMetadata,
}

impl Document {
    pub fn new(doc_id: DocId, text: impl Into<String>) -> Self {
        Self {
            doc_id,
            text: text.into(),
            metadata: DocMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: DocMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Metadata as it is attached to postings: `None` when nothing is known.
    pub(crate) fn posting_metadata(&self) -> Option<DocMetadata> {
        (!self.metadata.is_empty()).then(|| self.metadata.clone())
    }
}

/// One term occurrence record for one document.
///
/// Absent metadata serializes as `null` rather than an omitted key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
    pub metadata: Option<DocMetadata>,
}

impl Posting {
    pub const fn new(doc_id: DocId, frequency: u32) -> Self {
        Self {
            doc_id,
            frequency,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Option<DocMetadata>) -> Self {
        self.metadata = metadata;
        self
    }
}
