//! Embedding providers behind the [`Embedder`] trait.
//!
//! - [`LocalEmbedder`]: BGE-M3 through candle, fully offline
//! - [`GeminiEmbedder`]: hosted Gemini embeddings
//! - [`HashEmbedder`]: deterministic hashing, for tests and dry runs
//!
//! Every provider returns L2-normalized vectors so stores can rank by cosine.

pub mod device;
pub mod gemini;
pub mod hash;
pub mod local;
pub mod pool;
pub mod tokenize;

use anyhow::Result;
use std::sync::Arc;

use gatekeeper_core::config::{EmbeddingProvider, EmbeddingSettings};
pub use gatekeeper_core::traits::Embedder;

pub use gemini::GeminiEmbedder;
pub use hash::HashEmbedder;
pub use local::LocalEmbedder;
pub use pool::masked_mean_l2;

/// `APP_USE_FAKE_EMBEDDINGS=1` (or `true`) forces the hash embedder whatever
/// the configured provider.
pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if use_fake_embeddings() {
        tracing::info!(dim = settings.dim, "APP_USE_FAKE_EMBEDDINGS set, using hash embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.dim)));
    }
    let embedder: Arc<dyn Embedder> = match settings.provider {
        EmbeddingProvider::Hash => Arc::new(HashEmbedder::new(settings.dim)),
        EmbeddingProvider::Local => Arc::new(LocalEmbedder::load(settings)?),
        EmbeddingProvider::Gemini => Arc::new(GeminiEmbedder::new(settings)?),
    };
    tracing::info!(embedder = embedder.embedder_id(), dim = embedder.dim(), "embedder ready");
    Ok(embedder)
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
    for x in v.iter_mut() {
        *x /= norm;
    }
}
