use serde_json::Value;
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::{check_equality_query, matches_query, record_to_tokens, DocumentSource, Documents, ReaderConfig};
use crate::tokenizer::Preprocessor;
use crate::{Error, Result};

type Records = Box<dyn Iterator<Item = Result<Value>>>;

/// Reads records from a `.json` / `.jsonl` file or a directory of them.
pub struct JsonSource {
    path: PathBuf,
    config: ReaderConfig,
    preprocessor: Preprocessor,
}

impl JsonSource {
    pub fn new<P: AsRef<Path>>(path: P, config: ReaderConfig, preprocessor: Preprocessor) -> Self {
        Self { path: path.as_ref().to_path_buf(), config, preprocessor }
    }

    pub fn config(&self) -> &ReaderConfig { &self.config }

    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if self.path.is_dir() {
            for entry in WalkDir::new(&self.path).sort_by_file_name() {
                let entry = entry?;
                let p = entry.path();
                if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                    files.push(p.to_path_buf());
                }
            }
        } else {
            // surfaces the I/O error for a missing path
            File::open(&self.path)?;
            files.push(self.path.clone());
        }
        Ok(files)
    }
}

impl DocumentSource for JsonSource {
    fn documents(&self) -> Result<Documents<'_>> {
        check_equality_query(&self.config.query)?;
        let files = self.files()?;
        tracing::debug!(path = %self.path.display(), files = files.len(), "reading json source");
        let records = files.into_iter().flat_map(|file| match read_records(&file) {
            Ok(records) => records,
            Err(e) => Box::new(std::iter::once(Err::<Value, Error>(e))) as Records,
        });
        let docs = records
            .filter(|r| r.as_ref().map_or(true, |v| matches_query(v, &self.config.query)))
            .take(self.config.row_limit().unwrap_or(usize::MAX))
            .map(|r| r.and_then(|v| record_to_tokens(&v, &self.config, &self.preprocessor)));
        Ok(Box::new(docs))
    }
}

fn read_records(file: &Path) -> Result<Records> {
    let reader = BufReader::new(File::open(file)?);
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        let lines = reader
            .lines()
            .filter(|line| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .map(|line| -> Result<Value> { Ok(serde_json::from_str(&line?)?) });
        return Ok(Box::new(lines));
    }
    let json: Value = serde_json::from_reader(reader)?;
    let records: Records = match json {
        Value::Array(arr) => Box::new(arr.into_iter().map(Ok::<Value, Error>)),
        Value::Object(_) => Box::new(std::iter::once(Ok::<Value, Error>(json))),
        _ => Box::new(std::iter::empty()),
    };
    Ok(records)
}
