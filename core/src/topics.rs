//! Topic dumps and the topic lookup table.
//!
//! A JSON dump is shaped like a lookup table with a placeholder label, so a
//! dump whose `"topic"` fields were filled in by hand can be fed straight back
//! to the analyser.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::lda::TopicModel;
use crate::{Error, Result, TopicId};

const UNLABELED: &str = "??";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DumpFormat {
    /// One indented block per topic.
    Text,
    #[default]
    Json,
}

impl FromStr for DumpFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(DumpFormat::Text),
            "json" => Ok(DumpFormat::Json),
            other => Err(Error::invalid_config(format!("unknown dump format {other:?}"))),
        }
    }
}

/// Top tokens per topic, ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicDump {
    topics: Vec<(TopicId, Vec<(String, f64)>)>,
}

impl TopicDump {
    pub fn from_model(model: &TopicModel, topic_words: usize) -> Self {
        Self { topics: model.show_topics(topic_words) }
    }

    pub fn topics(&self) -> &[(TopicId, Vec<(String, f64)>)] { &self.topics }

    pub fn write<W: Write>(&self, out: &mut W, format: DumpFormat) -> Result<()> {
        match format {
            DumpFormat::Text => self.write_text(out),
            DumpFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, self)?;
                out.write_all(b"\n")?;
                Ok(())
            }
        }
    }

    pub fn write_to_path(&self, path: &Path, format: DumpFormat) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out, format)?;
        out.flush()?;
        tracing::info!(path = %path.display(), topics = self.topics.len(), ?format, "wrote topic dump");
        Ok(())
    }

    fn write_text<W: Write>(&self, out: &mut W) -> Result<()> {
        for (topic, words) in &self.topics {
            writeln!(out, "TopicId [{topic}]: {UNLABELED} ")?;
            for (token, weight) in words {
                writeln!(out, "\t{weight:.3}*\"{token}\"")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl Serialize for TopicDump {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.topics.len()))?;
        for (topic, words) in &self.topics {
            map.serialize_entry(&topic.to_string(), &DumpEntry { topic: UNLABELED, stats: Stats(words) })?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct DumpEntry<'a> {
    topic: &'a str,
    stats: Stats<'a>,
}

/// `{"<weight>": "<token>"}` in descending weight order.
///
/// Keys are unique: among tokens whose weights format the same, only the first is written.
struct Stats<'a>(&'a [(String, f64)]);

impl Serialize for Stats<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seen = HashSet::new();
        let entries: Vec<(String, &String)> = self
            .0
            .iter()
            .map(|(token, weight)| (format!("{weight:.6}"), token))
            .filter(|(key, _)| seen.insert(key.clone()))
            .collect();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, token) in &entries {
            map.serialize_entry(key, token)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicEntry {
    pub topic: String,
}

/// Human labels for topic ids, keyed by the id's decimal string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TopicLookup(HashMap<String, TopicEntry>);

impl TopicLookup {
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let lookup: TopicLookup = serde_json::from_reader(reader)?;
        tracing::info!(path = %path.display(), topics = lookup.0.len(), "loaded topic lookup");
        Ok(lookup)
    }

    pub fn from_json(raw: &str) -> Result<Self> { Ok(serde_json::from_str(raw)?) }

    pub fn label(&self, topic: TopicId) -> Result<&str> {
        self.0
            .get(&topic.to_string())
            .map(|entry| entry.topic.as_str())
            .ok_or(Error::TopicLookup(topic))
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}
