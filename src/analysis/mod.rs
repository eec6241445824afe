//! Text analysis: decoding, tokenization, stopword lists and stemming.

pub(crate) mod encoding;
pub(crate) mod stemmer;
pub(crate) mod stopwords;
pub(crate) mod tokenize;

pub use encoding::TextEncoding;
pub use stemmer::{NoopStemmer, PorterStemmer, Stemmer};
pub use stopwords::{STOPWORDS_SMALL, StopwordList};
pub use tokenize::{Tokenizer, TokenizerOptions, is_numeric_term};
