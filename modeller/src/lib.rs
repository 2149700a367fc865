use lda_core::corpus::BowCorpus;
use lda_core::lda::{LdaConfig, TopicModel};
use lda_core::persist::{load_model, save_model, ModelHeader};
use lda_core::source::DocumentSource;
use lda_core::tokenizer::PreprocessorConfig;
use lda_core::topics::{DumpFormat, TopicDump};
use lda_core::vocabulary::{FrequencyFilter, Vocabulary};
use lda_core::{BagOfWords, Error, Result};
use tracing::{dispatcher, Dispatch};

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Where the trained model is written.
    pub output: PathBuf,
    pub lda: LdaConfig,
    pub filter: FrequencyFilter,
    /// Recorded in the model header; must be what the source's preprocessor uses.
    pub preprocessing: PreprocessorConfig,
    /// Tokens listed per topic in a dump.
    pub topic_words: usize,
    pub dump_format: DumpFormat,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("./lda.model"),
            lda: LdaConfig::default(),
            filter: FrequencyFilter::default(),
            preprocessing: PreprocessorConfig::default(),
            topic_words: 15,
            dump_format: DumpFormat::default(),
        }
    }
}

/// Trains, persists and summarizes a topic model.
pub struct ModelBuilder {
    config: BuilderConfig,
    dispatch: Dispatch,
    model: Option<TopicModel>,
    labels: Vec<String>,
}

impl ModelBuilder {
    pub fn new(config: BuilderConfig, dispatch: Dispatch) -> Self {
        Self { config, dispatch, model: None, labels: Vec::new() }
    }

    pub fn config(&self) -> &BuilderConfig { &self.config }
    pub fn model(&self) -> Option<&TopicModel> { self.model.as_ref() }

    /// Labels of the documents the last model was trained on, in source order.
    pub fn labels(&self) -> &[String] { &self.labels }

    /// Build the vocabulary, train over the source and save the model to `config.output`.
    pub fn build<S: DocumentSource + ?Sized>(&mut self, source: &S) -> Result<&TopicModel> {
        let dispatch = self.dispatch.clone();
        dispatcher::with_default(&dispatch, || self.train(source))?;
        self.model.as_ref().ok_or(Error::NoModel)
    }

    fn train<S: DocumentSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        self.config.filter.validate()?;
        self.config.lda.validate()?;

        let mut vocabulary = Vocabulary::new();
        for doc in source.documents()? {
            vocabulary.add_document(&doc?.tokens);
        }
        tracing::info!(num_docs = vocabulary.num_docs(), num_terms = vocabulary.len(), "built vocabulary");
        vocabulary.filter_extremes(&self.config.filter);

        let (corpus, labels) = {
            let mut corpus = BowCorpus::new(source, &vocabulary);
            let bows: Vec<BagOfWords> = corpus.iter()?.collect::<Result<_>>()?;
            (bows, corpus.labels().to_vec())
        };

        let model = TopicModel::train(&corpus, vocabulary, &self.config.lda)?;
        let header = ModelHeader::new(corpus.len() as u32, self.config.lda.clone(), self.config.preprocessing.clone());
        save_model(&self.config.output, &header, &model)?;
        tracing::info!(output = %self.config.output.display(), num_topics = model.num_topics(), "model build complete");

        self.labels = labels;
        self.model = Some(model);
        Ok(())
    }

    /// Write the top tokens of every topic to `path`.
    ///
    /// When `model` is given it is loaded first and replaces the model in hand.
    pub fn dump_topics(&mut self, path: &Path, model: Option<&Path>) -> Result<()> {
        let dispatch = self.dispatch.clone();
        dispatcher::with_default(&dispatch, || {
            if let Some(model_path) = model {
                let (_, loaded) = load_model(model_path)?;
                self.model = Some(loaded);
            }
            let model = self.model.as_ref().ok_or(Error::NoModel)?;
            TopicDump::from_model(model, self.config.topic_words).write_to_path(path, self.config.dump_format)
        })
    }
}
