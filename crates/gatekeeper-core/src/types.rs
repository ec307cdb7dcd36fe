//! Domain types that flow through ingestion and query pipelines.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `source_id` given to documents ingested from raw text rather than a file.
pub const RAW_TEXT_SOURCE_ID: &str = "raw-text-input";

/// Plain text of one source artifact.
///
/// - `text`: extracted content, formatting already stripped
/// - `source_id`: absolute file path, or [`RAW_TEXT_SOURCE_ID`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub source_id: String,
}

/// A bounded, sentence-aligned slice of a [`Document`]; the unit of indexing
/// and retrieval. `index` is the zero-based position within its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub index: usize,
}

/// A chunk returned by similarity search. Higher `score` is more relevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Ordered hits for one query, descending by score, at most `k` long.
pub type RetrievalResult = Vec<ScoredChunk>;

/// Input of one ingestion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IngestRequest {
    File {
        #[serde(rename = "filePath")]
        file_path: PathBuf,
    },
    Text {
        data: String,
    },
}

impl IngestRequest {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { file_path: path.into() }
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self::Text { data: data.into() }
    }
}

/// Terminal record of one ingestion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub success: bool,
    pub documents_indexed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestOutcome {
    pub fn indexed(documents_indexed: usize) -> Self {
        Self { success: true, documents_indexed, error: None }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self { success: false, documents_indexed: 0, error: Some(error.to_string()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }
}

/// Terminal record of one query call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
}
