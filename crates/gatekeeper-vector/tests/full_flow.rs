use std::sync::Arc;

use gatekeeper_core::traits::VectorStore;
use gatekeeper_core::types::Chunk;
use gatekeeper_embed::HashEmbedder;
use gatekeeper_vector::{LanceStore, MemoryStore};
use tempfile::TempDir;

fn chunk(text: &str, source: &str, index: usize) -> Chunk {
    Chunk { text: text.to_string(), source_id: source.to_string(), index }
}

fn corpus() -> Vec<Chunk> {
    vec![
        chunk("For fun I hike in the mountains and build furniture.", "/notes/doc.pdf", 0),
        chunk("The quarterly report covers revenue and operating costs.", "/notes/report.md", 0),
        chunk("Starting a fire needs tinder, kindling, and dry logs.", "/notes/camp.txt", 0),
        chunk("Keep the fire ring clear of leaves before lighting.", "/notes/camp.txt", 1),
    ]
}

#[tokio::test]
async fn lancedb_full_flow() {
    let tmp = TempDir::new().expect("tmp");
    let uri = tmp.path().to_string_lossy().to_string();
    let store = LanceStore::open(&uri, "chunks_test", Arc::new(HashEmbedder::new(256))).await.expect("store");

    assert!(store.search("anything", 3).await.expect("empty search").is_empty());

    store.index_documents(&corpus()).await.expect("index");
    assert_eq!(store.count().await.expect("count"), 4);

    let results = store.search("what do I do for fun", 2).await.expect("search");
    assert_eq!(results.len(), 2);
    assert!(results[0].score >= results[1].score);
    let top = &results[0].chunk;
    assert_eq!(top.source_id, "/notes/doc.pdf");
    assert_eq!(top.index, 0);
    assert!(top.text.contains("hike"));

    let fire = store.search("fire", 10).await.expect("search");
    assert_eq!(fire.len(), 4, "k larger than the corpus returns everything");
}

#[tokio::test]
async fn reindexing_the_same_chunks_does_not_duplicate() {
    let tmp = TempDir::new().expect("tmp");
    let uri = tmp.path().to_string_lossy().to_string();
    let store = LanceStore::open(&uri, "chunks", Arc::new(HashEmbedder::new(32))).await.expect("store");
    store.index_documents(&corpus()).await.expect("index");
    store.index_documents(&corpus()).await.expect("reindex");
    assert_eq!(store.count().await.expect("count"), 4);
}

#[tokio::test]
async fn reopening_with_a_different_dimension_fails() {
    let tmp = TempDir::new().expect("tmp");
    let uri = tmp.path().to_string_lossy().to_string();
    let store = LanceStore::open(&uri, "chunks", Arc::new(HashEmbedder::new(32))).await.expect("store");
    store.index_documents(&corpus()).await.expect("index");
    drop(store);

    let reopened = LanceStore::open(&uri, "chunks", Arc::new(HashEmbedder::new(32))).await.expect("same dim");
    assert_eq!(reopened.count().await.expect("count"), 4);
    assert!(LanceStore::open(&uri, "chunks", Arc::new(HashEmbedder::new(48))).await.is_err());
}

#[tokio::test]
async fn memory_store_ranks_like_lance() {
    let store = MemoryStore::new(Arc::new(HashEmbedder::new(256)));
    assert!(store.search("fun", 3).await.expect("empty").is_empty());
    store.index_documents(&corpus()).await.expect("index");
    store.index_documents(&corpus()[..1]).await.expect("reindex");
    assert_eq!(store.len().await, 4);

    let results = store.search("what do I do for fun", 3).await.expect("search");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].chunk.source_id, "/notes/doc.pdf");
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}
