use std::sync::Arc;

use gatekeeper_core::traits::VectorStore;
use gatekeeper_core::types::RetrievalResult;
use gatekeeper_core::{Error, Result};

/// Similarity search with a default `k`. Ordering is the store's.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    k: usize,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, k: usize) -> Self {
        Self { store, k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        self.retrieve_k(query, self.k).await
    }

    pub async fn retrieve_k(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        let mut hits = self
            .store
            .search(query, k)
            .await
            .map_err(|e| Error::Retrieval(format!("{:#}", e)))?;
        hits.truncate(k);
        tracing::info!(k, hits = hits.len(), "retrieved");
        Ok(hits)
    }
}
