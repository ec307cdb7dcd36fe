use gatekeeper_core::config::{EmbeddingProvider, EmbeddingSettings};
use gatekeeper_embed::{build_embedder, HashEmbedder};
use gatekeeper_embed::Embedder;

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid loading a model or calling out
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let settings = EmbeddingSettings { provider: EmbeddingProvider::Local, dim: 1024, ..EmbeddingSettings::default() };
    let embedder = build_embedder(&settings).expect("embedder");
    assert_eq!(embedder.embedder_id(), "hash:d1024");

    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    assert_eq!(embs.len(), 2);
    let (v1, v2) = (&embs[0], &embs[1]);
    assert_eq!(v1.len(), 1024, "embedding dim is 1024");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[tokio::test]
async fn hash_embedder_preserves_input_order() {
    let embedder = HashEmbedder::new(64);
    let texts = vec!["first text".to_string(), "second".to_string(), "first text".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    assert_eq!(embs.len(), 3);
    assert_eq!(embs[0], embs[2]);
    assert_ne!(embs[0], embs[1]);
    assert_eq!(embedder.dim(), 64);
}
