//! Logger configuration handed to components at construction.
//!
//! Nothing here installs a global subscriber: [`LogConfig::dispatch`] builds a
//! [`Dispatch`] that a component scopes its work with.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Dispatch;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogSink {
    #[default]
    Stderr,
    /// Append to a file.
    File(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Filter directives such as `info` or `lda_core=debug`; falls back to `RUST_LOG`, then `info`.
    pub level: Option<String>,
    pub sink: LogSink,
}

impl LogConfig {
    pub fn filter(&self) -> Result<EnvFilter> {
        match &self.level {
            Some(level) => EnvFilter::try_new(level).map_err(|e| Error::invalid_config(format!("log level {level:?}: {e}"))),
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
        }
    }

    pub fn dispatch(&self) -> Result<Dispatch> {
        let builder = fmt().with_env_filter(self.filter()?).with_target(false);
        let dispatch = match &self.sink {
            LogSink::Stderr => Dispatch::new(builder.with_writer(std::io::stderr).finish()),
            LogSink::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Dispatch::new(builder.with_ansi(false).with_writer(Mutex::new(file)).finish())
            }
        };
        Ok(dispatch)
    }
}
