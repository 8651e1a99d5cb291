//! Error types shared by the catalog library.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A required index file is absent; the engine refuses to start.
    #[error("missing index file: {}", path.display())]
    MissingIndexFile { path: PathBuf },
    /// A stored index file is present but unusable.
    #[error("corrupt index file {}: {detail}", path.display())]
    CorruptIndex { path: PathBuf, detail: String },
    #[error("invalid ranking weight `{name}`: {value}")]
    InvalidWeights { name: &'static str, value: f64 },
    #[error("unknown search mode `{0}` (expected any, all or exact)")]
    InvalidMode(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
