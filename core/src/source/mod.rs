//! Document sources: anything that can stream `(label, tokens)` records.
//!
//! Every call to [`DocumentSource::documents`] starts a new pass over the
//! underlying store, so a source must return the same records for the same
//! configuration on repeated calls within one run.

use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::tokenizer::Preprocessor;
use crate::{Error, LabeledTokens, Result};

pub mod json;
pub mod mongo;

pub use json::JsonSource;
pub use mongo::{MongoConfig, MongoSource};

pub type Documents<'a> = Box<dyn Iterator<Item = Result<LabeledTokens>> + 'a>;

pub trait DocumentSource {
    /// Start a lazy, finite pass over the matching records.
    fn documents(&self) -> Result<Documents<'_>>;
}

impl<S: DocumentSource + ?Sized> DocumentSource for &S {
    fn documents(&self) -> Result<Documents<'_>> { (**self).documents() }
}

/// Which records to read and which of their fields matter.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub label_field: String,
    /// Fields concatenated (space separated) into the text to tokenize.
    pub text_fields: Vec<String>,
    pub query: Map<String, Value>,
    /// Maximum number of records; `Some(0)` means no limit, as in MongoDB.
    pub limit: Option<usize>,
}

impl ReaderConfig {
    /// The limit to apply, if any.
    pub fn row_limit(&self) -> Option<usize> { self.limit.filter(|&n| n > 0) }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            label_field: "components".to_string(),
            text_fields: vec!["title".to_string(), "question".to_string(), "answers".to_string()],
            query: Map::new(),
            limit: None,
        }
    }
}

/// Where records come from, as chosen on the command line.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    Mongo(MongoConfig),
    /// A `.json` / `.jsonl` file or a directory of them.
    Json(PathBuf),
}

impl SourceSpec {
    pub fn open(&self, config: ReaderConfig, preprocessor: Preprocessor) -> Result<Box<dyn DocumentSource>> {
        let source: Box<dyn DocumentSource> = match self {
            SourceSpec::Mongo(mongo) => Box::new(MongoSource::connect(mongo, config, preprocessor)?),
            SourceSpec::Json(path) => Box::new(JsonSource::new(path, config, preprocessor)),
        };
        Ok(source)
    }
}

/// Parse a `--query` argument; it must be a JSON object.
pub fn parse_query(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::invalid_config(format!("query must be a JSON object, got {other}"))),
    }
}

/// Turn one record into its label and tokens.
pub fn record_to_tokens(record: &Value, config: &ReaderConfig, preprocessor: &Preprocessor) -> Result<LabeledTokens> {
    let label = record.get(&config.label_field).map(label_text).unwrap_or_default();
    let mut parts = Vec::with_capacity(config.text_fields.len());
    for field in &config.text_fields {
        let Some(value) = record.get(field) else { continue };
        let text = field_text(value).map_err(|reason| Error::preprocess(&label, format!("field {field:?} {reason}")))?;
        parts.push(text);
    }
    let tokens = preprocessor.prepare(&parts.join(" "));
    Ok(LabeledTokens { label, tokens })
}

/// Query matching for sources without a query engine: top-level equality on every key.
pub(crate) fn matches_query(record: &Value, query: &Map<String, Value>) -> bool {
    query.iter().all(|(k, v)| record.get(k) == Some(v))
}

/// Sources without a query engine only support equality; operators such as `$in` are refused.
pub(crate) fn check_equality_query(query: &Map<String, Value>) -> Result<()> {
    fn has_operator(value: &Value) -> bool {
        match value {
            Value::Object(map) => map.iter().any(|(k, v)| k.starts_with('$') || has_operator(v)),
            Value::Array(items) => items.iter().any(has_operator),
            _ => false,
        }
    }
    match query.iter().find(|(k, v)| k.starts_with('$') || has_operator(v)) {
        Some((key, _)) => Err(Error::invalid_config(format!("query operators are not supported for file sources (key {key:?})"))),
        None => Ok(()),
    }
}

fn field_text(value: &Value) -> std::result::Result<String, String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(items) => {
            let parts = items.iter().map(field_text).collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(parts.join(" "))
        }
        Value::Object(_) => Err("holds a nested document".to_string()),
    }
}

fn label_text(value: &Value) -> String {
    match value {
        Value::Object(_) => value.to_string(),
        Value::Array(items) => items.iter().map(label_text).collect::<Vec<_>>().join(" "),
        other => field_text(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{Normalization, PreprocessorConfig};
    use serde_json::json;

    fn plain() -> Preprocessor {
        Preprocessor::new(PreprocessorConfig { normalization: Normalization::None, ..Default::default() })
    }

    #[test]
    fn joins_list_fields_and_stringifies_scalars() {
        let record = json!({
            "components": "battery",
            "title": "Phone",
            "question": "battery drains overnight",
            "answers": ["replace battery", "disable sync", 42],
        });
        let config = ReaderConfig::default();
        let pre = Preprocessor::new(PreprocessorConfig { normalization: Normalization::None, drop_numeric: false, ..Default::default() });
        let doc = record_to_tokens(&record, &config, &pre).unwrap();
        assert_eq!(doc.label, "battery");
        assert_eq!(doc.tokens, vec!["phone", "battery", "drains", "overnight", "replace", "battery", "disable", "sync", "42"]);
    }

    #[test]
    fn missing_and_empty_fields_yield_empty_tokens() {
        let record = json!({ "components": ["a", "b"], "title": "", "question": null });
        let doc = record_to_tokens(&record, &ReaderConfig::default(), &plain()).unwrap();
        assert_eq!(doc.label, "a b");
        assert!(doc.tokens.is_empty());
    }

    #[test]
    fn nested_document_is_a_preprocessing_error() {
        let record = json!({ "components": "x", "question": { "text": "hidden" } });
        let err = record_to_tokens(&record, &ReaderConfig::default(), &plain()).unwrap_err();
        assert!(matches!(err, Error::Preprocess { ref label, .. } if label == "x"));
    }

    #[test]
    fn query_must_be_an_object() {
        assert!(parse_query("{}").unwrap().is_empty());
        assert_eq!(parse_query(r#"{"lang": "en"}"#).unwrap()["lang"], "en");
        assert!(parse_query("[1, 2]").is_err());
    }

    #[test]
    fn equality_query_matching() {
        let query = parse_query(r#"{"lang": "en"}"#).unwrap();
        assert!(matches_query(&json!({ "lang": "en", "x": 1 }), &query));
        assert!(!matches_query(&json!({ "lang": "fr" }), &query));
        assert!(matches_query(&json!({ "lang": "fr" }), &Map::new()));
    }

    #[test]
    fn operator_queries_are_refused_for_file_sources() {
        assert!(check_equality_query(&parse_query(r#"{"lang": "en", "tags": ["a"]}"#).unwrap()).is_ok());
        let err = check_equality_query(&parse_query(r#"{"components": {"$in": ["power", "display"]}}"#).unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(check_equality_query(&parse_query(r#"{"$or": [{"lang": "en"}]}"#).unwrap()).is_err());
    }

    #[test]
    fn zero_limit_means_unbounded() {
        let mut config = ReaderConfig::default();
        assert_eq!(config.row_limit(), None);
        config.limit = Some(0);
        assert_eq!(config.row_limit(), None);
        config.limit = Some(3);
        assert_eq!(config.row_limit(), Some(3));
    }
}
