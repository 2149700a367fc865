use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::{BagOfWords, Error, Result, TokenId};

/// Bidirectional token <-> id mapping with document frequencies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    token_to_id: HashMap<String, TokenId>,
    id_to_token: Vec<String>,
    doc_freq: Vec<u32>,
    num_docs: u32,
}

/// Extreme-frequency filter applied before a vocabulary is frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyFilter {
    /// Minimum number of documents a token must appear in.
    pub no_below: u32,
    /// Maximum fraction (0.0..=1.0) of documents a token may appear in.
    pub no_above: f64,
    /// Keep only this many of the most frequent tokens.
    pub keep_n: Option<usize>,
}

impl Default for FrequencyFilter {
    fn default() -> Self { Self { no_below: 5, no_above: 0.5, keep_n: Some(100_000) } }
}

impl FrequencyFilter {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.no_above) {
            return Err(Error::invalid_config(format!("max document fraction must be within 0..=1, got {}", self.no_above)));
        }
        Ok(())
    }
}

impl Vocabulary {
    pub fn new() -> Self { Self::default() }

    pub fn from_documents<I, D>(docs: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[String]>,
    {
        let mut vocab = Self::new();
        for doc in docs {
            vocab.add_document(doc.as_ref());
        }
        vocab
    }

    pub fn add_document(&mut self, tokens: &[String]) {
        self.num_docs += 1;
        let mut seen_in_doc: HashSet<TokenId> = HashSet::new();
        for token in tokens {
            let id = self.insert(token);
            if seen_in_doc.insert(id) {
                self.doc_freq[id as usize] += 1;
            }
        }
    }

    fn insert(&mut self, token: &str) -> TokenId {
        if let Some(&id) = self.token_to_id.get(token) {
            return id;
        }
        let id = self.id_to_token.len() as TokenId;
        self.token_to_id.insert(token.to_string(), id);
        self.id_to_token.push(token.to_string());
        self.doc_freq.push(0);
        id
    }

    /// Count known tokens; unknown tokens are dropped.
    pub fn doc2bow(&self, tokens: &[String]) -> BagOfWords {
        let mut counts: HashMap<TokenId, u32> = HashMap::new();
        for token in tokens {
            if let Some(&id) = self.token_to_id.get(token) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        let mut bow: BagOfWords = counts.into_iter().collect();
        bow.sort_unstable_by_key(|&(id, _)| id);
        bow
    }

    /// Drop tokens outside the document-frequency window and compact ids.
    pub fn filter_extremes(&mut self, filter: &FrequencyFilter) {
        let no_above_abs = (filter.no_above * self.num_docs as f64) as u32;
        let mut keep: Vec<TokenId> = (0..self.len() as TokenId)
            .filter(|&id| {
                let df = self.doc_freq[id as usize];
                df >= filter.no_below && df <= no_above_abs
            })
            .collect();
        if let Some(keep_n) = filter.keep_n {
            keep.sort_by(|a, b| self.doc_freq[*b as usize].cmp(&self.doc_freq[*a as usize]));
            keep.truncate(keep_n);
            keep.sort_unstable();
        }
        let before = self.len();
        let mut filtered = Vocabulary { num_docs: self.num_docs, ..Default::default() };
        for id in keep {
            let new_id = filtered.insert(&self.id_to_token[id as usize]);
            filtered.doc_freq[new_id as usize] = self.doc_freq[id as usize];
        }
        *self = filtered;
        tracing::info!(before, after = self.len(), no_below = filter.no_below, no_above = filter.no_above, "filtered vocabulary");
    }

    /// Add `other`'s tokens; returns the translation from `other` ids to ids in `self`.
    pub fn merge_with(&mut self, other: &Vocabulary) -> Vec<TokenId> {
        let mut translation = Vec::with_capacity(other.len());
        for (other_id, token) in other.id_to_token.iter().enumerate() {
            let id = self.insert(token);
            self.doc_freq[id as usize] += other.doc_freq[other_id];
            translation.push(id);
        }
        self.num_docs += other.num_docs;
        translation
    }

    pub fn id(&self, token: &str) -> Option<TokenId> { self.token_to_id.get(token).copied() }
    pub fn token(&self, id: TokenId) -> Option<&str> { self.id_to_token.get(id as usize).map(String::as_str) }
    pub fn doc_freq(&self, id: TokenId) -> Option<u32> { self.doc_freq.get(id as usize).copied() }
    pub fn tokens(&self) -> &[String] { &self.id_to_token }
    pub fn num_docs(&self) -> u32 { self.num_docs }
    pub fn len(&self) -> usize { self.id_to_token.len() }
    pub fn is_empty(&self) -> bool { self.id_to_token.is_empty() }
}
