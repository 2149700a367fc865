use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lda_core::lda::LdaConfig;
use lda_core::logging::{LogConfig, LogSink};
use lda_core::source::{parse_query, MongoConfig, ReaderConfig, SourceSpec};
use lda_core::tokenizer::{Normalization, Preprocessor, PreprocessorConfig};
use lda_core::topics::DumpFormat;
use lda_core::vocabulary::FrequencyFilter;
use lda_modeller::{BuilderConfig, ModelBuilder};
use tracing::dispatcher;

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lda-modeller")]
#[command(about = "Build an LDA model file from a document collection", long_about = None)]
struct Args {
    /// Output model file
    #[arg(long, default_value = "./lda.model")]
    model: PathBuf,
    /// MongoDB database name
    #[arg(long, default_value = "bow")]
    db: String,
    /// MongoDB collection name
    #[arg(long, default_value = "training")]
    coll: String,
    /// MongoDB URI for different servers/ports
    #[arg(long, default_value = "mongodb://localhost:27017")]
    mongo_uri: String,
    /// Read records from a JSON/JSONL file or directory instead of MongoDB
    #[arg(long)]
    input: Option<PathBuf>,
    /// JSON query used to filter records (default: all)
    #[arg(long, default_value = "{}")]
    query: String,
    /// Maximum number of records to read
    #[arg(long)]
    limit: Option<usize>,
    /// Field holding the record label
    #[arg(long, default_value = "components")]
    label_field: String,
    /// Text field to read (repeatable)
    #[arg(long = "text-field", default_values_t = ["title".to_string(), "question".to_string(), "answers".to_string()])]
    text_fields: Vec<String>,
    /// Number of topics to generate
    #[arg(long, default_value_t = 20)]
    num_topics: usize,
    /// Passes over the corpus
    #[arg(long, default_value_t = 10)]
    passes: usize,
    /// Gibbs sweeps per pass
    #[arg(long, default_value_t = 50)]
    iterations: usize,
    /// Ignore tokens found in fewer documents than this
    #[arg(long, default_value_t = 5)]
    min_docs: u32,
    /// Ignore tokens found in more than this fraction of documents
    #[arg(long, default_value_t = 0.5)]
    max_doc_fraction: f64,
    /// Keep at most this many of the most frequent tokens
    #[arg(long)]
    keep_n: Option<usize>,
    /// Document-topic prior (default: 1 / num_topics)
    #[arg(long)]
    alpha: Option<f64>,
    /// Topic-word prior
    #[arg(long, default_value_t = 0.01)]
    eta: f64,
    /// Sampler seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Tokens listed per topic in the dump
    #[arg(long, default_value_t = 15)]
    topic_words: usize,
    /// File to print topics to
    #[arg(long)]
    dump_topics: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    dump_format: FormatArg,
    /// Skip building a model (dump an existing one)
    #[arg(long)]
    no_build: bool,
    #[arg(long, value_enum, default_value_t = NormalizationArg::LemmaStem)]
    normalization: NormalizationArg,
    /// Stopword to keep (repeatable)
    #[arg(long = "keep-word")]
    keep_words: Vec<String>,
    /// Keep purely numeric tokens
    #[arg(long)]
    keep_numeric: bool,
    /// Log filter, e.g. `debug` or `lda_core=debug` (default: RUST_LOG, then info)
    #[arg(long)]
    log_level: Option<String>,
    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg { Text, Json }

#[derive(Clone, Copy, ValueEnum)]
enum NormalizationArg { None, Stem, LemmaStem }

impl From<NormalizationArg> for Normalization {
    fn from(arg: NormalizationArg) -> Self {
        match arg {
            NormalizationArg::None => Normalization::None,
            NormalizationArg::Stem => Normalization::Stem,
            NormalizationArg::LemmaStem => Normalization::LemmatizeThenStem,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log = LogConfig { level: args.log_level.clone(), sink: args.log_file.clone().map_or(LogSink::Stderr, LogSink::File) };
    let dispatch = log.dispatch()?;
    dispatcher::with_default(&dispatch, || run(args, dispatch.clone()))
}

fn run(args: Args, dispatch: tracing::Dispatch) -> Result<()> {
    let config = BuilderConfig {
        output: args.model.clone(),
        lda: LdaConfig {
            num_topics: args.num_topics,
            passes: args.passes,
            iterations: args.iterations,
            alpha: args.alpha,
            eta: args.eta,
            seed: args.seed,
        },
        filter: FrequencyFilter { no_below: args.min_docs, no_above: args.max_doc_fraction, keep_n: args.keep_n },
        preprocessing: PreprocessorConfig {
            normalization: args.normalization.into(),
            drop_numeric: !args.keep_numeric,
            keep_words: args.keep_words.clone(),
        },
        topic_words: args.topic_words,
        dump_format: match args.dump_format {
            FormatArg::Text => DumpFormat::Text,
            FormatArg::Json => DumpFormat::Json,
        },
    };
    let mut builder = ModelBuilder::new(config, dispatch);

    if !args.no_build {
        let reader = ReaderConfig {
            label_field: args.label_field.clone(),
            text_fields: args.text_fields.clone(),
            query: parse_query(&args.query).context("parsing --query")?,
            limit: args.limit,
        };
        let preprocessor = Preprocessor::new(builder.config().preprocessing.clone());
        let spec = match &args.input {
            Some(path) => SourceSpec::Json(path.clone()),
            None => SourceSpec::Mongo(MongoConfig { uri: args.mongo_uri.clone(), database: args.db.clone(), collection: args.coll.clone() }),
        };
        let source = spec.open(reader, preprocessor).context("opening document source")?;
        builder.build(&*source).context("building model")?;
    }

    match &args.dump_topics {
        Some(path) => {
            builder.dump_topics(path, Some(args.model.as_path())).with_context(|| format!("dumping topics to {}", path.display()))?;
        }
        None if args.no_build => tracing::warn!("--no-build without --dump-topics, nothing to do"),
        None => {}
    }
    Ok(())
}
