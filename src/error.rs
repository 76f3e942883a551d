//! Crate error type
//!
//! Only file-backed configuration and the best-score store can fail; the
//! simulation itself never returns errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted while loading or saving tuning, settings or the best score.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON could not be parsed or produced.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A tuning value cannot be used even after sanitizing.
    #[error("invalid tuning: {0}")]
    InvalidTuning(&'static str),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
