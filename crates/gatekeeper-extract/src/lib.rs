//! gatekeeper-extract
//!
//! Turns an ingestion source into a [`Document`]. Files are dispatched by
//! extension (case-insensitive) to a registered [`TextExtractor`]; raw text
//! passes through unchanged.

pub mod markdown;
pub mod pdf;
pub mod plain;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use gatekeeper_core::types::{Document, IngestRequest, RAW_TEXT_SOURCE_ID};
use gatekeeper_core::{Error, Result};

pub use markdown::MarkdownExtractor;
pub use pdf::PdfExtractor;
pub use plain::PlainTextExtractor;

/// Decodes the raw bytes of one file format into plain text.
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// Extension-keyed set of extraction strategies. Keys are stored lowercase
/// without the leading dot.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    by_extension: HashMap<String, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the stock strategies: `.pdf`, `.md`/`.markdown`, `.txt`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("pdf", Arc::new(PdfExtractor));
        let markdown: Arc<dyn TextExtractor> = Arc::new(MarkdownExtractor);
        registry.register("md", markdown.clone());
        registry.register("markdown", markdown);
        registry.register("txt", Arc::new(PlainTextExtractor));
        registry
    }

    pub fn register(&mut self, extension: &str, extractor: Arc<dyn TextExtractor>) {
        let key = extension.trim_start_matches('.').to_ascii_lowercase();
        self.by_extension.insert(key, extractor);
    }

    /// Registered extensions, sorted, without the leading dot.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.strategy_for(path).is_ok()
    }

    pub fn strategy_for(&self, path: &Path) -> Result<Arc<dyn TextExtractor>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        self.by_extension.get(&ext).cloned().ok_or_else(|| {
            if ext.is_empty() {
                Error::UnsupportedFormat(format!("{} has no file extension", path.display()))
            } else {
                Error::UnsupportedFormat(format!(".{}", ext))
            }
        })
    }

    /// Resolve `path` to an absolute path, pick a strategy, read and decode it.
    pub async fn extract_file(&self, path: &Path) -> Result<Document> {
        // Taken literally: request paths never go through shell expansion.
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_err(|e| Error::io(path, e))?.join(path)
        };
        let extractor = self.strategy_for(&absolute)?;
        let bytes = tokio::fs::read(&absolute).await.map_err(|e| Error::io(&absolute, e))?;
        tracing::debug!(path = %absolute.display(), strategy = extractor.name(), bytes = bytes.len(), "extracting");
        let text = extractor.extract(&bytes)?;
        Ok(Document { text, source_id: absolute.to_string_lossy().into_owned() })
    }

    pub async fn extract(&self, request: &IngestRequest) -> Result<Document> {
        match request {
            IngestRequest::File { file_path } => self.extract_file(file_path).await,
            IngestRequest::Text { data } => Ok(Document { text: data.clone(), source_id: RAW_TEXT_SOURCE_ID.to_string() }),
        }
    }
}
