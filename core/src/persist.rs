use bincode;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::lda::{LdaConfig, TopicModel};
use crate::tokenizer::PreprocessorConfig;
use crate::{Error, Result};

pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHeader {
    pub format_version: u32,
    pub created_at: String,
    pub num_docs: u32,
    pub config: LdaConfig,
    /// How training documents were tokenized.
    pub preprocessing: PreprocessorConfig,
}

impl ModelHeader {
    pub fn new(num_docs: u32, config: LdaConfig, preprocessing: PreprocessorConfig) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
            num_docs,
            config,
            preprocessing,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    header: ModelHeader,
    model: TopicModel,
}

pub fn save_model(path: &Path, header: &ModelHeader, model: &TopicModel) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    let file = ModelFile { header: header.clone(), model: model.clone() };
    let bytes = bincode::serialize(&file)?;
    let mut f = File::create(path)?;
    f.write_all(&bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "saved model");
    Ok(())
}

pub fn load_model(path: &Path) -> Result<(ModelHeader, TopicModel)> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let file: ModelFile = bincode::deserialize(&buf)
        .map_err(|e| Error::ModelFormat(format!("{}: {e}", path.display())))?;
    if file.header.format_version != FORMAT_VERSION {
        return Err(Error::ModelFormat(format!(
            "{}: format version {} (expected {FORMAT_VERSION})",
            path.display(),
            file.header.format_version
        )));
    }
    if let Some(reason) = file.model.shape_error() {
        return Err(Error::ModelFormat(format!("{}: {reason}", path.display())));
    }
    tracing::info!(path = %path.display(), num_topics = file.model.num_topics(), created_at = %file.header.created_at, "loaded model");
    Ok((file.header, file.model))
}
