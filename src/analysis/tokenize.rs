//! Text tokenization for indexing.

use super::stemmer::{PorterStemmer, Stemmer};
use super::stopwords::StopwordList;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

static NUMERIC_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("numeric term pattern is valid"));

/// True when the whole term is ASCII digits. Mixed terms like `abc123` are not numeric.
pub fn is_numeric_term(term: &str) -> bool {
    NUMERIC_TERM.is_match(term)
}

/// Which normalization steps the tokenizer applies, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    /// Lowercase text before splitting.
    pub case_fold: bool,
    /// Drop tokens made only of digits.
    pub drop_numeric: bool,
    /// Drop tokens found in this stopword list.
    pub stopwords: StopwordList,
    /// Map surviving tokens through the stemmer.
    pub stem: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            case_fold: true,
            drop_numeric: false,
            stopwords: StopwordList::None,
            stem: false,
        }
    }
}

/// Turns a document's text into normalized tokens.
///
/// Steps, always in this order:
/// 1. case fold (optional)
/// 2. split on runs of non-alphanumeric characters, dropping empty fragments
/// 3. drop all-digit tokens (optional)
/// 4. drop stopwords (optional)
/// 5. stem (optional)
#[derive(Clone)]
pub struct Tokenizer {
    options: TokenizerOptions,
    stemmer: Arc<dyn Stemmer>,
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerOptions::default())
    }
}

impl Tokenizer {
    /// Tokenizer using the English stemmer when stemming is enabled.
    pub fn new(options: TokenizerOptions) -> Self {
        Self {
            options,
            stemmer: Arc::new(PorterStemmer::default()),
        }
    }

    /// Replace the stemmer used when `options.stem` is set.
    pub fn with_stemmer(mut self, stemmer: Arc<dyn Stemmer>) -> Self {
        self.stemmer = stemmer;
        self
    }

    pub const fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    /// Tokenize `text`. Empty or whitespace-only text yields no tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let folded;
        let text = if self.options.case_fold {
            folded = text.to_lowercase();
            folded.as_str()
        } else {
            text
        };

        text.split(|c: char| !c.is_alphanumeric())
            .filter(|fragment| !fragment.is_empty())
            .filter(|token| !(self.options.drop_numeric && is_numeric_term(token)))
            .filter(|token| !self.options.stopwords.contains(token))
            .map(|token| {
                if self.options.stem {
                    self.stemmer.stem(token).into_owned()
                } else {
                    token.to_owned()
                }
            })
            .collect()
    }
}
