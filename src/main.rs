use anyhow::Context;
use clap::Parser;
use spimi_index::cli::{Cli, Commands, TokenizerArgs};
use spimi_index::{
    Comparison, CompressionPipeline, DirectorySource, DocumentStream, Index, IndexBuilder,
    IndexConfig, JsonLinesSource, PorterStemmer, Query, QueryEngine, StatsTable,
    collect_documents,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    spimi_index::tracing::init(cli.verbose, cli.log_format);

    let config = match &cli.config {
        Some(path) => IndexConfig::load(path)?,
        None => IndexConfig::default(),
    };

    match cli.command {
        Commands::Build {
            source,
            output,
            blocks_dir,
            block_term_limit,
            max_documents,
            tokenizer,
        } => {
            let mut config = config;
            if let Some(output) = output {
                config.index_path = output;
            }
            if let Some(dir) = blocks_dir {
                config.blocks_dir = dir;
            }
            if let Some(limit) = block_term_limit {
                config.block_term_limit = limit;
            }
            if max_documents.is_some() {
                config.max_documents = max_documents;
            }
            apply_tokenizer_args(&mut config, &tokenizer);
            config.validate()?;
            run_build(config, &source).await
        }
        Commands::Compare {
            source,
            blocks_dir,
            block_term_limit,
            queries,
            tokenizer,
        } => {
            let mut config = config;
            if let Some(dir) = blocks_dir {
                config.blocks_dir = dir;
            }
            if let Some(limit) = block_term_limit {
                config.block_term_limit = limit;
            }
            apply_tokenizer_args(&mut config, &tokenizer);
            config.validate()?;
            run_compare(config, &source, &queries).await
        }
        Commands::Compress { index, output } => run_compress(&index, output),
        Commands::Query {
            index,
            terms,
            stem,
            export,
        } => run_query(&index, terms, stem, export.as_deref()),
    }
}

fn apply_tokenizer_args(config: &mut IndexConfig, args: &TokenizerArgs) {
    let options = &mut config.tokenizer;
    if args.no_case_fold {
        options.case_fold = false;
    }
    options.drop_numeric |= args.drop_numeric;
    options.stem |= args.stem;
    if let Some(list) = args.stopwords {
        options.stopwords = list;
    }
}

fn open_source(config: &IndexConfig, source: &Path) -> DocumentStream {
    if source.is_dir() {
        DirectorySource::new(source)
            .with_encoding(config.encoding)
            .into_stream()
    } else {
        JsonLinesSource::new(source)
            .with_encoding(config.encoding)
            .into_stream()
    }
}

async fn run_build(config: IndexConfig, source: &Path) -> anyhow::Result<()> {
    let documents = open_source(&config, source);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; finishing the current blocks");
            on_signal.cancel();
        }
    });

    let index_path = config.index_path.clone();
    let outcome = IndexBuilder::new(config)
        .build_stream(documents, cancel)
        .await
        .with_context(|| format!("Failed to build index from {}", source.display()))?;

    for skipped in &outcome.merge.skipped {
        eprintln!("warning: block #{} skipped: {}", skipped.number, skipped.reason);
    }
    if outcome.merge.omitted_terms > 0 {
        eprintln!(
            "warning: {} block terms missing from the index",
            outcome.merge.omitted_terms
        );
    }

    outcome.index.save(&index_path)?;
    println!(
        "Indexed {} documents ({} skipped) into {} blocks{}",
        outcome.documents_indexed,
        outcome.documents_skipped,
        outcome.blocks.len(),
        if outcome.stopped_early { ", stopped early" } else { "" }
    );
    print!("{}", StatsTable::new(vec![outcome.stats()]));
    println!("Saved index to {}", index_path.display());
    Ok(())
}

async fn run_compare(config: IndexConfig, source: &Path, queries: &[String]) -> anyhow::Result<()> {
    let documents = collect_documents(open_source(&config, source))
        .await
        .with_context(|| format!("Failed to read documents from {}", source.display()))?;
    let queries: Vec<Query> = queries
        .iter()
        .filter_map(|q| Query::from_terms(q.split_whitespace()))
        .collect();

    let builder = IndexBuilder::new(config);
    let comparison = tokio::task::spawn_blocking(move || {
        spimi_index::compare(&builder, &documents, &queries)
    })
    .await
    .context("Comparison task panicked")??;

    print_comparison(&comparison);
    anyhow::ensure!(
        comparison.is_consistent(),
        "Traditional and SPIMI indexes disagree"
    );
    Ok(())
}

fn print_comparison(comparison: &Comparison) {
    let traditional = comparison.traditional_time.as_secs_f64();
    let spimi = comparison.spimi_time.as_secs_f64();
    println!("Traditional index built in {:.3} s", traditional);
    println!(
        "SPIMI index built in {:.3} s ({} blocks)",
        spimi,
        comparison.spimi.blocks.len()
    );
    println!(
        "Difference: {:.3} s, ratio {:.2}x",
        (traditional - spimi).abs(),
        comparison.time_ratio()
    );
    println!(
        "Term dictionaries {}",
        if comparison.same_postings() { "match" } else { "DIFFER" }
    );
    for check in &comparison.queries {
        println!(
            "Query: {} -> Traditional: {:?} SPIMI: {:?}{}",
            check.query,
            check.traditional,
            check.spimi,
            if check.agrees() { "" } else { " (mismatch)" }
        );
    }
    print!("{}", comparison.stats_table());
}

fn run_compress(path: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let index = Index::load(path)?;
    let (compressed, stats) = CompressionPipeline::default().run(&index);
    print!("{}", StatsTable::new(stats));

    let output = output.unwrap_or_else(|| path.with_extension("compressed.json"));
    compressed.save(&output)?;
    println!("Saved compressed index to {}", output.display());
    Ok(())
}

fn run_query(path: &Path, terms: Vec<String>, stem: bool, export: Option<&Path>) -> anyhow::Result<()> {
    let index = Index::load(path)?;
    let mut engine = QueryEngine::new(&index);
    if stem {
        engine = engine.with_stemmer(Arc::new(PorterStemmer::default()));
    }

    let query = Query::from_terms(terms).context("No query terms given")?;
    let result = engine.run(&query);
    println!("Query: {} -> Documents: {:?}", query, result.doc_ids);

    if let Some(export) = export {
        engine.write_export(query.terms(), export)?;
    }
    Ok(())
}
