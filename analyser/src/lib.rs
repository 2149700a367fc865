use lda_core::lda::{most_related, TopicModel, MINIMUM_PROBABILITY};
use lda_core::persist::load_model;
use lda_core::source::DocumentSource;
use lda_core::tokenizer::{Preprocessor, PreprocessorConfig};
use lda_core::topics::TopicLookup;
use lda_core::vocabulary::Vocabulary;
use lda_core::{Error, Result, TopicId};
use serde::Serialize;
use tracing::{dispatcher, Dispatch};

use std::path::Path;

/// Best-matching topic of one analysed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicMatch {
    pub label: String,
    pub topic_id: TopicId,
    pub probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_label: Option<String>,
}

pub struct ModelAnalyser {
    model: TopicModel,
    vocabulary: Vocabulary,
    preprocessing: PreprocessorConfig,
    dispatch: Dispatch,
}

impl ModelAnalyser {
    pub fn load(model_path: &Path, dispatch: Dispatch) -> Result<Self> {
        let (header, model) = dispatcher::with_default(&dispatch, || load_model(model_path))?;
        let vocabulary = inference_vocabulary(model.vocabulary())?;
        dispatcher::with_default(&dispatch, || {
            tracing::debug!(trained_on = header.num_docs, num_terms = vocabulary.len(), "inference vocabulary ready");
        });
        Ok(Self { model, vocabulary, preprocessing: header.preprocessing, dispatch })
    }

    /// Wrap a model already in memory, trained on documents prepared with `preprocessing`.
    pub fn from_model(model: TopicModel, preprocessing: PreprocessorConfig, dispatch: Dispatch) -> Result<Self> {
        let vocabulary = inference_vocabulary(model.vocabulary())?;
        Ok(Self { model, vocabulary, preprocessing, dispatch })
    }

    pub fn model(&self) -> &TopicModel { &self.model }
    pub fn preprocessing(&self) -> &PreprocessorConfig { &self.preprocessing }

    /// The preprocessor documents must go through before [`analyse`](Self::analyse).
    ///
    /// Without `requested` the settings recorded in the model are used; a
    /// request that differs from them is an error.
    pub fn preprocessor(&self, requested: Option<&PreprocessorConfig>) -> Result<Preprocessor> {
        match requested {
            Some(requested) if *requested != self.preprocessing => Err(Error::PreprocessingMismatch {
                trained: format!("{:?}", self.preprocessing),
                requested: format!("{requested:?}"),
            }),
            _ => Ok(Preprocessor::new(self.preprocessing.clone())),
        }
    }

    /// Report the most related topic of every document in `source`.
    ///
    /// Documents whose topics all fall below [`MINIMUM_PROBABILITY`] are logged
    /// and skipped. A topic id missing from `lookup` aborts the run.
    pub fn analyse<S: DocumentSource + ?Sized>(&self, source: &S, lookup: Option<&TopicLookup>) -> Result<Vec<TopicMatch>> {
        dispatcher::with_default(&self.dispatch, || {
            let mut matches = Vec::new();
            for doc in source.documents()? {
                let doc = doc?;
                let bow = self.vocabulary.doc2bow(&doc.tokens);
                let topics = self.model.document_topics(&bow, MINIMUM_PROBABILITY);
                let Some((topic_id, probability)) = most_related(&topics) else {
                    tracing::warn!(label = %doc.label, "no topic above minimum probability");
                    continue;
                };
                tracing::info!("Most related ({topic_id}, {probability})");

                let topic_label = match lookup {
                    Some(lookup) => {
                        let name = lookup.label(topic_id)?;
                        tracing::info!("{name}");
                        Some(name.to_string())
                    }
                    None => None,
                };
                matches.push(TopicMatch { label: doc.label, topic_id, probability, topic_label });
            }
            tracing::debug!(analysed = matches.len(), "analysis complete");
            Ok(matches)
        })
    }
}

/// Merge the model's tokens into an empty vocabulary; ids must come out unchanged.
fn inference_vocabulary(model_vocabulary: &Vocabulary) -> Result<Vocabulary> {
    let mut vocabulary = Vocabulary::default();
    let translation = vocabulary.merge_with(model_vocabulary);
    for (expected, &found) in translation.iter().enumerate() {
        if expected as u32 != found {
            let token = model_vocabulary.token(expected as u32).unwrap_or_default().to_string();
            return Err(Error::VocabularyMismatch { token, expected: expected as u32, found });
        }
    }
    Ok(vocabulary)
}
