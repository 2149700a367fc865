use std::io;

use thiserror::Error;

use crate::TopicId;

/// Errors raised while reading, modelling or analysing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// A record could not be turned into a token sequence.
    #[error("failed to prepare words for record {label:?}: {reason}")]
    Preprocess { label: String, reason: String },

    /// Topics were requested before a model was built or loaded.
    #[error("there is no model set to output topics, run build() first")]
    NoModel,

    #[error("topic {0} has no entry in the topic lookup")]
    TopicLookup(TopicId),

    #[error("vocabulary is not aligned with the model: token {token:?} maps to {found} instead of {expected}")]
    VocabularyMismatch { token: String, expected: u32, found: u32 },

    /// Analysis would tokenize differently from the model's training run.
    #[error("model was trained with preprocessing {trained}, analysis requested {requested}")]
    PreprocessingMismatch { trained: String, requested: String },

    #[error("unsupported model file: {0}")]
    ModelFormat(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("corpus is empty after filtering, nothing to train on")]
    EmptyCorpus,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("invalid query: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    pub fn preprocess(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Preprocess { label: label.into(), reason: reason.into() }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
