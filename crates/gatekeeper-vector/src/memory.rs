use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use gatekeeper_core::traits::{Embedder, VectorStore};
use gatekeeper_core::types::{Chunk, ScoredChunk};

use crate::lance::chunk_id;

struct Entry {
    id: String,
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Brute-force cosine search over vectors held in process memory. Nothing
/// survives the process; useful for tests and throwaway sessions.
pub struct MemoryStore {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<Entry>>,
}

impl MemoryStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, entries: RwLock::new(Vec::new()) }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn index_documents(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            bail!("embedder returned {} vectors for {} chunks", vectors.len(), chunks.len());
        }
        let mut entries = self.entries.write().await;
        for (chunk, vector) in chunks.iter().zip(vectors) {
            let id = chunk_id(chunk);
            match entries.iter_mut().find(|e| e.id == id) {
                Some(existing) => existing.vector = vector,
                None => entries.push(Entry { id, chunk: chunk.clone(), vector }),
            }
        }
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 || self.is_empty().await {
            return Ok(Vec::new());
        }
        let mut vectors = self.embedder.embed_batch(&[query.to_string()]).await?;
        let Some(q) = vectors.pop() else {
            bail!("embedder returned no vector for the query");
        };
        // Writers are only held off for the scan, not the embedding call.
        let entries = self.entries.read().await;
        let mut hits: Vec<ScoredChunk> = entries
            .iter()
            .map(|e| ScoredChunk { chunk: e.chunk.clone(), score: cosine(&q, &e.vector) })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use gatekeeper_embed::HashEmbedder;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Hashing embedder that parks query embeddings until released.
    struct GatedEmbedder {
        inner: HashEmbedder,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Embedder for GatedEmbedder {
        fn embedder_id(&self) -> &str {
            self.inner.embedder_id()
        }

        fn dim(&self) -> usize {
            self.inner.dim()
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.len() == 1 && texts[0].starts_with("query:") {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.embed_batch(texts).await
        }
    }

    fn chunk(text: &str, index: usize) -> Chunk {
        Chunk { text: text.to_string(), source_id: "notes.md".to_string(), index }
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn writes_proceed_while_a_query_is_being_embedded() {
        let embedder = Arc::new(GatedEmbedder {
            inner: HashEmbedder::new(256),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let store = Arc::new(MemoryStore::new(embedder.clone()));
        store.index_documents(&[chunk("I hike on weekends.", 0)]).await.expect("seed");

        let searcher = {
            let store = store.clone();
            tokio::spawn(async move { store.search("query: hiking", 3).await })
        };
        embedder.entered.notified().await;

        let docs = [chunk("I also paint.", 1)];
        let write = store.index_documents(&docs);
        tokio::time::timeout(Duration::from_secs(2), write)
            .await
            .expect("write blocked behind query embedding")
            .expect("write");

        embedder.release.notify_one();
        let hits = searcher.await.expect("join").expect("search");
        assert_eq!(hits.len(), 2);
        assert_eq!(store.len().await, 2);
    }
}
