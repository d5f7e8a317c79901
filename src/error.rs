use std::{collections::TryReserveError, io::ErrorKind, path::PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("out of memory while building corpus: {0}")]
    OutOfMemory(#[from] TryReserveError),

    #[error("no text could be extracted from {0}")]
    EmptyCorpus(PathBuf),

    #[error("source document not found: {0}")]
    MissingSource(PathBuf),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("data directory does not exist: {0}")]
    DataDir(PathBuf),

    #[error("knowledge base unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    /// Whether this error must abort extraction instead of being counted
    /// against the per-page failure budget.
    pub fn is_critical(&self) -> bool {
        match self {
            Error::OutOfMemory(_) => true,
            Error::Io(e) => matches!(
                e.kind(),
                ErrorKind::OutOfMemory | ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}
