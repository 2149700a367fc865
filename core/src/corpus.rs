use crate::source::DocumentSource;
use crate::vocabulary::Vocabulary;
use crate::{BagOfWords, Result};

/// Restartable bag-of-words view over a document source.
///
/// Each call to [`BowCorpus::iter`] re-invokes the source, so the corpus can be
/// walked any number of times without buffering documents. Labels of the
/// latest pass are kept in source order.
pub struct BowCorpus<'a, S: DocumentSource + ?Sized> {
    source: &'a S,
    vocabulary: &'a Vocabulary,
    labels: Vec<String>,
}

impl<'a, S: DocumentSource + ?Sized> BowCorpus<'a, S> {
    pub fn new(source: &'a S, vocabulary: &'a Vocabulary) -> Self {
        Self { source, vocabulary, labels: Vec::new() }
    }

    pub fn iter(&mut self) -> Result<impl Iterator<Item = Result<BagOfWords>> + '_> {
        self.labels.clear();
        let source = self.source;
        let vocabulary = self.vocabulary;
        let labels = &mut self.labels;
        let docs = source.documents()?;
        Ok(docs.map(move |doc| -> Result<BagOfWords> {
            let doc = doc?;
            labels.push(doc.label);
            Ok(vocabulary.doc2bow(&doc.tokens))
        }))
    }

    pub fn labels(&self) -> &[String] { &self.labels }

    pub fn vocabulary(&self) -> &Vocabulary { self.vocabulary }
}
