//! Narrow interfaces to the external collaborators. Every method is a
//! suspension point: the calling pipeline waits until the collaborator answers.

use async_trait::async_trait;

use crate::types::{Chunk, ScoredChunk};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `hash:d1024`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
    /// One L2-normalized vector per input text, in input order.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and persist `chunks` as one batch.
    async fn index_documents(&self, chunks: &[Chunk]) -> anyhow::Result<()>;
    /// Up to `k` stored chunks most similar to `query`, best first.
    async fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<ScoredChunk>>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`; `docs` are the grounding chunks the
    /// prompt was assembled from.
    async fn generate(&self, prompt: &str, docs: &[Chunk]) -> anyhow::Result<String>;
}
