use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lda_analyser::ModelAnalyser;
use lda_core::logging::{LogConfig, LogSink};
use lda_core::source::{parse_query, MongoConfig, ReaderConfig, SourceSpec};
use lda_core::tokenizer::{Normalization, PreprocessorConfig};
use lda_core::topics::TopicLookup;
use tracing::dispatcher;

use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lda-analyser")]
#[command(about = "Report the most related topic of each document", long_about = None)]
struct Args {
    /// Model file produced by lda-modeller
    #[arg(long, default_value = "./lda.model")]
    model: PathBuf,
    /// MongoDB database name
    #[arg(long, default_value = "bow")]
    db: String,
    /// MongoDB collection name
    #[arg(long, default_value = "data")]
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
    /// Maximum number of records to analyse (0 reads every record)
    #[arg(long, default_value_t = 5)]
    limit: usize,
    #[arg(long, default_value = "components")]
    label_field: String,
    /// Text field to read (repeatable)
    #[arg(long = "text-field", default_values_t = ["title".to_string(), "question".to_string(), "answers".to_string()])]
    text_fields: Vec<String>,
    /// JSON topic lookup mapping topic ids to labels
    #[arg(long)]
    topics: Option<PathBuf>,
    /// Must match the model's training run (default: as recorded in the model)
    #[arg(long, value_enum)]
    normalization: Option<NormalizationArg>,
    /// Stopword to keep (repeatable)
    #[arg(long = "keep-word")]
    keep_words: Vec<String>,
    #[arg(long)]
    keep_numeric: bool,
    /// Log filter (default: RUST_LOG, then info)
    #[arg(long)]
    log_level: Option<String>,
    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

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
    let analyser = ModelAnalyser::load(&args.model, dispatch)
        .with_context(|| format!("loading model {}", args.model.display()))?;
    let lookup = args
        .topics
        .as_deref()
        .map(TopicLookup::load)
        .transpose()
        .context("loading topic lookup")?;

    let reader = ReaderConfig {
        label_field: args.label_field,
        text_fields: args.text_fields,
        query: parse_query(&args.query).context("parsing --query")?,
        limit: Some(args.limit),
    };
    let requested = requested_preprocessing(analyser.preprocessing(), args.normalization, args.keep_words, args.keep_numeric);
    let preprocessor = analyser.preprocessor(requested.as_ref()).context("choosing preprocessing")?;
    let spec = match args.input {
        Some(path) => SourceSpec::Json(path),
        None => SourceSpec::Mongo(MongoConfig { uri: args.mongo_uri, database: args.db, collection: args.coll }),
    };
    let source = spec.open(reader, preprocessor).context("opening document source")?;
    let matches = analyser.analyse(&*source, lookup.as_ref()).context("analysing documents")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for m in &matches {
        writeln!(out, "{}", serde_json::to_string(m)?)?;
    }
    Ok(())
}

/// Settings given on the command line layered over the model's, or `None` when no flag was given.
fn requested_preprocessing(
    trained: &PreprocessorConfig,
    normalization: Option<NormalizationArg>,
    keep_words: Vec<String>,
    keep_numeric: bool,
) -> Option<PreprocessorConfig> {
    if normalization.is_none() && keep_words.is_empty() && !keep_numeric {
        return None;
    }
    let mut requested = trained.clone();
    if let Some(arg) = normalization {
        requested.normalization = arg.into();
    }
    if !keep_words.is_empty() {
        requested.keep_words = keep_words;
    }
    if keep_numeric {
        requested.drop_numeric = false;
    }
    Some(requested)
}
