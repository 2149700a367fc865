use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

use crate::lemma::lemmatize;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\w+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "i","me","my","myself","we","our","ours","ourselves","you","you're","you've","you'll","you'd","your","yours","yourself","yourselves",
            "he","him","his","himself","she","she's","her","hers","herself","it","it's","its","itself",
            "they","them","their","theirs","themselves","what","which","who","whom","this","that","that'll","these","those",
            "am","is","are","was","were","be","been","being","have","has","had","having","do","does","did","doing",
            "a","an","the","and","but","if","or","because","as","until","while","of","at","by","for","with","about","against",
            "between","into","through","during","before","after","above","below","to","from","up","down","in","out","on","off",
            "over","under","again","further","then","once","here","there","when","where","why","how","all","any","both","each",
            "few","more","most","other","some","such","no","nor","not","only","own","same","so","than","too","very",
            "s","t","can","will","just","don","don't","should","should've","now","d","ll","m","o","re","ve","y",
            "ain","aren","aren't","couldn","couldn't","didn","didn't","doesn","doesn't","hadn","hadn't","hasn","hasn't",
            "haven","haven't","isn","isn't","ma","mightn","mightn't","mustn","mustn't","needn","needn't",
            "shan","shan't","shouldn","shouldn't","wasn","wasn't","weren","weren't","won","won't","wouldn","wouldn't"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// How surviving tokens are reduced to a base form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    None,
    Stem,
    #[default]
    LemmatizeThenStem,
}

/// Preprocessing settings; stored with a model so analysis tokenizes the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    pub normalization: Normalization,
    /// Drop tokens made only of digits.
    pub drop_numeric: bool,
    /// Stopwords that are kept anyway.
    pub keep_words: Vec<String>,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self { normalization: Normalization::default(), drop_numeric: true, keep_words: Vec::new() }
    }
}

/// Turns raw text into the token sequence used for vocabulary building and inference.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    normalization: Normalization,
    drop_numeric: bool,
    keep_words: HashSet<String>,
}

impl Default for Preprocessor {
    fn default() -> Self { Self::new(PreprocessorConfig::default()) }
}

impl Preprocessor {
    pub fn new(config: PreprocessorConfig) -> Self {
        let keep_words = config.keep_words.iter().map(|w| w.to_lowercase()).collect();
        Self { normalization: config.normalization, drop_numeric: config.drop_numeric, keep_words }
    }

    pub fn normalization(&self) -> Normalization { self.normalization }

    /// Lowercase, split on word characters, drop numbers and stopwords, then lemmatize/stem.
    pub fn prepare(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        for mat in RE.find_iter(&normalized) {
            let token = mat.as_str();
            if self.drop_numeric && token.chars().all(char::is_numeric) { continue; }
            if self.is_stopword(token) { continue; }
            let base = self.normalize(token);
            // stemming can land on a stopword ("dos" -> "do")
            if self.is_stopword(&base) { continue; }
            tokens.push(base);
        }
        tokens
    }

    fn is_stopword(&self, token: &str) -> bool {
        is_stopword(token) && !self.keep_words.contains(token)
    }

    fn normalize(&self, token: &str) -> String {
        match self.normalization {
            Normalization::None => token.to_string(),
            Normalization::Stem => STEMMER.stem(token).into_owned(),
            Normalization::LemmatizeThenStem => STEMMER.stem(&lemmatize(token)).into_owned(),
        }
    }
}
