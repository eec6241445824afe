use crate::analysis::StopwordList;
use crate::tracing::LogFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spimi")]
#[command(about = "Build and query SPIMI inverted indexes", long_about = None)]
pub struct Cli {
    /// TOML config file; flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a directory of text files or a JSON-lines file
    Build {
        /// Directory (one document per file) or `.jsonl` file
        source: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        blocks_dir: Option<PathBuf>,
        #[arg(short = 't', long)]
        block_term_limit: Option<usize>,
        #[arg(short = 'n', long)]
        max_documents: Option<usize>,
        #[command(flatten)]
        tokenizer: TokenizerArgs,
    },
    /// Build the sort-based and SPIMI indexes over one corpus and compare them
    Compare {
        /// Directory (one document per file) or `.jsonl` file
        source: PathBuf,
        #[arg(long)]
        blocks_dir: Option<PathBuf>,
        #[arg(short = 't', long)]
        block_term_limit: Option<usize>,
        /// Whitespace-separated terms run against both indexes; repeatable
        #[arg(short, long = "query")]
        queries: Vec<String>,
        #[command(flatten)]
        tokenizer: TokenizerArgs,
    },
    /// Run the compression pipeline over a saved index and print per-stage sizes
    Compress {
        index: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// One term looks it up; several are intersected
    Query {
        index: PathBuf,
        #[arg(required = true)]
        terms: Vec<String>,
        /// Stem query terms (for indexes produced by `compress`)
        #[arg(long)]
        stem: bool,
        /// Write full postings per term as JSON
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct TokenizerArgs {
    /// Keep original case
    #[arg(long)]
    pub no_case_fold: bool,
    #[arg(long)]
    pub drop_numeric: bool,
    #[arg(long, value_parser = parse_stopwords)]
    pub stopwords: Option<StopwordList>,
    #[arg(long)]
    pub stem: bool,
}

fn parse_stopwords(value: &str) -> Result<StopwordList, String> {
    match value {
        "none" => Ok(StopwordList::None),
        "small" | "30" => Ok(StopwordList::Small),
        "large" | "150" => Ok(StopwordList::Large),
        other => Err(format!("unknown stopword list '{other}' (none, small, large)")),
    }
}
