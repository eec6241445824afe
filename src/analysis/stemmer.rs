//! Stemming capability injected into the tokenizer and the compression pipeline.

use rust_stemmers::Algorithm;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Maps a token to its root form. Must be a pure function of its input.
pub trait Stemmer: Send + Sync {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str>;
}

impl<S: Stemmer + ?Sized> Stemmer for &S {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str> {
        (**self).stem(token)
    }
}

impl<S: Stemmer + ?Sized> Stemmer for Arc<S> {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str> {
        (**self).stem(token)
    }
}

/// English Snowball (Porter2) stemmer backed by `rust-stemmers`.
pub struct PorterStemmer {
    inner: rust_stemmers::Stemmer,
}

impl Default for PorterStemmer {
    fn default() -> Self {
        Self {
            inner: rust_stemmers::Stemmer::create(Algorithm::English),
        }
    }
}

impl fmt::Debug for PorterStemmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PorterStemmer").finish_non_exhaustive()
    }
}

impl Stemmer for PorterStemmer {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str> {
        self.inner.stem(token)
    }
}

/// Returns every token unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStemmer;

impl Stemmer for NoopStemmer {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("running", "run")]
    #[case("runs", "run")]
    #[case("plurals", "plural")]
    #[case("copper", "copper")]
    fn test_porter(#[case] input: &str, #[case] expected: &str) {
        check!(PorterStemmer::default().stem(input) == expected);
    }

    #[test]
    fn test_noop_borrows() {
        check!(matches!(NoopStemmer.stem("running"), Cow::Borrowed("running")));
    }

    #[test]
    fn test_shared_stemmer() {
        let shared: Arc<dyn Stemmer> = Arc::new(PorterStemmer::default());
        check!(shared.stem("parsing") == "pars");
    }
}
