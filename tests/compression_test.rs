mod common;

use assert2::check;
use common::{TempWorkspace, reuters_like_docs, scenario_docs, workspace};
use rstest::rstest;
use spimi_index::compression::{
    case_fold, remove_numeric, remove_stopwords_large, remove_stopwords_small, stem_terms,
};
use spimi_index::{
    CompressionPipeline, Document, Index, NoopStemmer, PorterStemmer, Tokenizer, TokenizerOptions,
    build_traditional,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Index built without case folding, the pipeline's natural input.
fn raw_index(docs: &[Document]) -> Index {
    let tokenizer = Tokenizer::new(TokenizerOptions {
        case_fold: false,
        ..TokenizerOptions::default()
    });
    build_traditional(docs, &tokenizer)
}

fn terms(index: &Index) -> BTreeSet<String> {
    index.iter().map(|(term, _)| term.clone()).collect()
}

#[rstest]
fn scenario_numeric_filter(scenario_docs: Vec<Document>) {
    let index = build_traditional(&scenario_docs, &Tokenizer::default());
    let filtered = remove_numeric(&index);
    check!(terms(&filtered) == BTreeSet::from(["bird", "cat", "dog"].map(String::from)));
}

#[rstest]
fn case_fold_is_monotone(reuters_like_docs: Vec<Document>) {
    let raw = raw_index(&reuters_like_docs);
    let folded = case_fold(&raw);

    check!(folded.term_count() <= raw.term_count());
    check!(folded.non_positional_postings() <= raw.non_positional_postings());
    for (term, postings) in raw.iter() {
        let merged = folded.get(&term.to_lowercase()).unwrap();
        for id in postings.doc_ids() {
            check!(merged.contains_doc(id));
        }
    }
    for (_, postings) in folded.iter() {
        check!(postings.is_sorted_unique());
    }
}

#[rstest]
fn stopword_filters_nest(reuters_like_docs: Vec<Document>) {
    let base = remove_numeric(&case_fold(&raw_index(&reuters_like_docs)));
    let s30 = remove_stopwords_small(&base);
    let s150 = remove_stopwords_large(&s30);
    let s150_direct = remove_stopwords_large(&base);

    check!(s150.term_count() <= s30.term_count());
    check!(s30.term_count() <= base.term_count());
    check!(terms(&s150) == terms(&s150_direct));

    let removed_30: BTreeSet<_> = terms(&base).difference(&terms(&s30)).cloned().collect();
    let removed_150: BTreeSet<_> = terms(&base).difference(&terms(&s150_direct)).cloned().collect();
    check!(removed_30.is_subset(&removed_150));
    check!(removed_30.contains("the"));
    check!(removed_150.contains("which"));
}

#[rstest]
fn stemming_is_monotone(reuters_like_docs: Vec<Document>) {
    let base = case_fold(&raw_index(&reuters_like_docs));
    let stemmed = stem_terms(&base, &PorterStemmer::default());

    check!(stemmed.term_count() <= base.term_count());
    check!(stemmed.contains("run"));
    check!(stemmed.get("run").unwrap().distinct_docs() >= base.get("runs").unwrap().distinct_docs());

    let identity = stem_terms(&base, &NoopStemmer);
    check!(identity.doc_id_map() == base.doc_id_map());
}

#[rstest]
fn pipeline_reports_every_stage(reuters_like_docs: Vec<Document>) {
    let raw = raw_index(&reuters_like_docs);
    let (compressed, stats) = CompressionPipeline::default().run(&raw);

    check!(stats.len() == 6);
    check!(stats[0].label == "Uncompressed");
    check!(stats[0].unique_terms == raw.term_count());
    check!(stats[5].unique_terms == compressed.term_count());
    for pair in stats.windows(2) {
        check!(pair[1].unique_terms <= pair[0].unique_terms, "{} grew", pair[1].label);
        check!(pair[1].non_positional_postings <= pair[0].non_positional_postings);
    }
    check!(compressed.is_case_folded());
    check!(!raw.is_case_folded());
}

#[rstest]
fn pipeline_with_custom_stemmer(scenario_docs: Vec<Document>) {
    let raw = raw_index(&scenario_docs);
    let (compressed, _) = CompressionPipeline::new(Arc::new(NoopStemmer)).run(&raw);
    check!(terms(&compressed) == BTreeSet::from(["bird", "cat", "dog"].map(String::from)));
}

#[rstest]
fn compressed_index_persists(workspace: TempWorkspace, reuters_like_docs: Vec<Document>) {
    let (compressed, _) = CompressionPipeline::default().run(&raw_index(&reuters_like_docs));
    let path = workspace.path().join("compressed.json");
    compressed.save(&path).unwrap();

    let loaded = Index::load(&path).unwrap();
    check!(loaded.doc_id_map() == compressed.doc_id_map());
    check!(loaded.is_case_folded());
}
