use mongodb::bson::{self, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::sync::{Client, Collection};

use super::{record_to_tokens, DocumentSource, Documents, ReaderConfig};
use crate::tokenizer::Preprocessor;
use crate::{LabeledTokens, Result};

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "bow".to_string(),
            collection: "training".to_string(),
        }
    }
}

/// Streams records from a MongoDB collection through a blocking cursor.
pub struct MongoSource {
    collection: Collection<Document>,
    config: ReaderConfig,
    preprocessor: Preprocessor,
}

impl MongoSource {
    pub fn connect(mongo: &MongoConfig, config: ReaderConfig, preprocessor: Preprocessor) -> Result<Self> {
        let client = Client::with_uri_str(&mongo.uri)?;
        let collection = client.database(&mongo.database).collection::<Document>(&mongo.collection);
        tracing::info!(uri = %mongo.uri, database = %mongo.database, collection = %mongo.collection, "mongo source ready");
        Ok(Self { collection, config, preprocessor })
    }

    pub fn config(&self) -> &ReaderConfig { &self.config }
}

/// Projection on the label and text fields, plus the row limit.
fn find_options(config: &ReaderConfig) -> FindOptions {
    let mut projection = Document::new();
    projection.insert(config.label_field.clone(), 1);
    for field in &config.text_fields {
        projection.insert(field.clone(), 1);
    }
    let mut options = FindOptions::default();
    options.projection = Some(projection);
    options.limit = config.row_limit().map(|n| n as i64);
    options
}

impl DocumentSource for MongoSource {
    fn documents(&self) -> Result<Documents<'_>> {
        // a fresh filter per pass; the configured query is never mutated
        let filter = bson::to_document(&self.config.query)?;
        let cursor = self.collection.find(filter, find_options(&self.config))?;
        Ok(Box::new(cursor.map(move |doc| document_to_tokens(doc?, &self.config, &self.preprocessor))))
    }
}

/// Mongo documents go through relaxed extended JSON so both backends share field extraction.
pub fn document_to_tokens(doc: Document, config: &ReaderConfig, preprocessor: &Preprocessor) -> Result<LabeledTokens> {
    let record = Bson::Document(doc).into_relaxed_extjson();
    record_to_tokens(&record, config, preprocessor)
}
