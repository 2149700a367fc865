use serde::{Deserialize, Serialize};

pub mod corpus;
pub mod error;
pub mod lda;
pub mod lemma;
pub mod logging;
pub mod persist;
pub mod source;
pub mod tokenizer;
pub mod topics;
pub mod vocabulary;

pub use error::{Error, Result};

pub type TokenId = u32;
pub type TopicId = usize;

/// Sparse bag-of-words vector: `(token id, count)` pairs sorted by id.
pub type BagOfWords = Vec<(TokenId, u32)>;

/// One record read from a document source: its label and normalized tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledTokens {
    pub label: String,
    pub tokens: Vec<String>,
}

impl LabeledTokens {
    pub fn new(label: impl Into<String>, tokens: Vec<String>) -> Self {
        Self { label: label.into(), tokens }
    }
}
