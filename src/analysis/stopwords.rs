//! Fixed English stopword lists.
//!
//! The large list is a strict superset of the small one, so filtering with it is always
//! at least as aggressive.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::LazyLock;

/// The 30 most common English function words.
pub const STOPWORDS_SMALL: &[&str] = &[
    "the", "a", "and", "or", "is", "in", "of", "to", "that", "this", "it", "be", "for", "with",
    "on", "as", "by", "at", "from", "are", "was", "were", "been", "have", "has", "do", "does",
    "did", "an", "but",
];

/// Words added on top of [`STOPWORDS_SMALL`] to form the large list.
const STOPWORDS_LARGE_EXTRA: &[&str] = &[
    "about", "after", "all", "between", "can", "could", "each", "few", "had", "he", "her",
    "him", "his", "how", "if", "its", "just", "no", "not", "now", "only", "other", "our",
    "out", "over", "same", "so", "some", "such", "than", "then", "there", "these", "they",
    "those", "too", "under", "very", "what", "when", "where", "which", "who", "why", "will",
    "you", "your", "would", "should", "may", "might", "must", "shall", "into", "through",
    "during", "before", "above", "below", "up", "down", "off", "again", "further", "once",
    "here", "both", "more", "most", "nor", "own", "am", "being", "having", "doing", "me",
    "us", "them", "my", "their", "whom", "whose", "i",
];

static SMALL: LazyLock<AHashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS_SMALL.iter().copied().collect());

static LARGE: LazyLock<AHashSet<&'static str>> = LazyLock::new(|| {
    STOPWORDS_SMALL
        .iter()
        .chain(STOPWORDS_LARGE_EXTRA)
        .copied()
        .collect()
});

/// Which stopword list a filter uses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwordList {
    #[default]
    None,
    Small,
    Large,
}

impl StopwordList {
    /// Whether `term` is a stopword under this list. Comparison is case-insensitive.
    pub fn contains(self, term: &str) -> bool {
        let set: &AHashSet<&'static str> = match self {
            Self::None => return false,
            Self::Small => &SMALL,
            Self::Large => &LARGE,
        };
        set.contains(lowercase(term).as_ref())
    }

    /// Number of distinct words in the list.
    pub fn len(self) -> usize {
        match self {
            Self::None => 0,
            Self::Small => SMALL.len(),
            Self::Large => LARGE.len(),
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Lowercases only when needed. Titlecase letters such as `ǅ` count as needing it.
pub(crate) fn lowercase(term: &str) -> Cow<'_, str> {
    if term.chars().any(|c| c.to_lowercase().ne(std::iter::once(c))) {
        Cow::Owned(term.to_lowercase())
    } else {
        Cow::Borrowed(term)
    }
}
