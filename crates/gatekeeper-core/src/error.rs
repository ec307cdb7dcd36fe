use std::path::PathBuf;

use thiserror::Error;

/// Failure of one pipeline stage. Each variant fails the whole invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Indexing failed: {0}")]
    Index(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation failed: {0}")]
    Generation(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Short machine-friendly name of the variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Io { .. } => "io",
            Self::Extraction(_) => "extraction",
            Self::Config(_) => "config",
            Self::Index(_) => "index",
            Self::Retrieval(_) => "retrieval",
            Self::Generation(_) => "generation",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
