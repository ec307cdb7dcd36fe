use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use tempfile::TempDir;

use gatekeeper_core::config::{PromptPolicy, Settings};
use gatekeeper_core::traits::{LanguageModel, VectorStore};
use gatekeeper_core::types::{Chunk, IngestRequest, QueryRequest, ScoredChunk, RAW_TEXT_SOURCE_ID};
use gatekeeper_core::{ChunkingConfig, Error};
use gatekeeper_embed::HashEmbedder;
use gatekeeper_extract::{ExtractorRegistry, PlainTextExtractor};
use gatekeeper_rag::{KnowledgeBase, Retriever, UNKNOWN_ANSWER};
use gatekeeper_vector::MemoryStore;

/// Language model double: records every call and answers from a script.
#[derive(Default)]
struct ScriptedModel {
    calls: Mutex<Vec<(String, Vec<Chunk>)>>,
    fail: bool,
}

impl ScriptedModel {
    fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    fn calls(&self) -> Vec<(String, Vec<Chunk>)> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str, docs: &[Chunk]) -> anyhow::Result<String> {
        self.calls.lock().expect("lock").push((prompt.to_string(), docs.to_vec()));
        if self.fail {
            return Err(anyhow!("model timed out"));
        }
        Ok("scripted answer".to_string())
    }
}

/// Store double whose collaborator is always unavailable.
struct DownStore;

#[async_trait]
impl VectorStore for DownStore {
    async fn index_documents(&self, _chunks: &[Chunk]) -> anyhow::Result<()> {
        Err(anyhow!("store unavailable"))
    }

    async fn search(&self, _query: &str, _k: usize) -> anyhow::Result<Vec<ScoredChunk>> {
        Err(anyhow!("store unavailable"))
    }
}

fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(Arc::new(HashEmbedder::new(256))))
}

fn settings(policy: PromptPolicy) -> Settings {
    let mut settings = Settings::default();
    settings.prompt.policy = policy;
    settings
}

#[tokio::test]
async fn three_sentences_with_tiny_min_length_index_one_chunk() {
    let store = memory_store();
    let mut settings = settings(PromptPolicy::Blended);
    settings.chunking = ChunkingConfig::new(1, 2000, 100).expect("config");
    let kb = KnowledgeBase::new(store.clone(), Arc::new(ScriptedModel::default()), &settings).expect("kb");

    let outcome = kb.ingest(&IngestRequest::text("A. B. C.")).await;
    assert!(outcome.success);
    assert_eq!(outcome.documents_indexed, 1);
    assert_eq!(outcome.error, None);

    let hits = store.search("A", 3).await.expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.text, "A. B. C.");
    assert_eq!(hits[0].chunk.source_id, RAW_TEXT_SOURCE_ID);
    assert_eq!(hits[0].chunk.index, 0);
}

#[tokio::test]
async fn empty_text_succeeds_with_nothing_indexed() {
    let store = memory_store();
    let kb = KnowledgeBase::new(store.clone(), Arc::new(ScriptedModel::default()), &settings(PromptPolicy::Blended))
        .expect("kb");
    let outcome = kb.ingest(&IngestRequest::text("")).await;
    assert!(outcome.success);
    assert_eq!(outcome.documents_indexed, 0);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn unsupported_extension_is_a_failed_outcome() {
    let kb = KnowledgeBase::new(memory_store(), Arc::new(ScriptedModel::default()), &settings(PromptPolicy::Blended))
        .expect("kb");
    let outcome = kb.ingest(&IngestRequest::file("/tmp/installer.exe")).await;
    assert!(!outcome.success);
    assert_eq!(outcome.documents_indexed, 0);
    let error = outcome.error.expect("error message");
    assert!(error.contains(".exe"), "{}", error);
}

#[tokio::test]
async fn store_failure_reports_zero_indexed() {
    let kb = KnowledgeBase::new(Arc::new(DownStore), Arc::new(ScriptedModel::default()), &settings(PromptPolicy::Blended))
        .expect("kb");
    let outcome = kb.ingest(&IngestRequest::text("Some content. More content.")).await;
    assert!(!outcome.success);
    assert_eq!(outcome.documents_indexed, 0);
    assert!(outcome.error.expect("error").contains("store unavailable"));
}

#[tokio::test]
async fn strict_policy_without_context_answers_unknown_without_the_model() {
    let model = Arc::new(ScriptedModel::default());
    let kb = KnowledgeBase::new(memory_store(), model.clone(), &settings(PromptPolicy::Strict)).expect("kb");

    for _ in 0..2 {
        let result = kb.query(&QueryRequest::new("Who won the 1998 World Cup?")).await.expect("query");
        assert_eq!(result.answer, UNKNOWN_ANSWER);
    }
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn blended_policy_without_context_still_asks_the_model() {
    let model = Arc::new(ScriptedModel::default());
    let kb = KnowledgeBase::new(memory_store(), model.clone(), &settings(PromptPolicy::Blended)).expect("kb");

    let result = kb.query(&QueryRequest::new("What are tropical flowers?")).await.expect("query");
    assert_eq!(result.answer, "scripted answer");
    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.contains("(no relevant context found)"));
    assert!(calls[0].0.ends_with("Question: What are tropical flowers?"));
    assert!(calls[0].1.is_empty());
}

#[tokio::test]
async fn most_similar_chunk_keeps_its_file_provenance() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("doc.pdf");
    std::fs::write(&path, "For fun I hike in the mountains and build furniture.").expect("write");

    // Read the fixture as text so the test does not need a real PDF encoder.
    let mut extractors = ExtractorRegistry::with_defaults();
    extractors.register("pdf", Arc::new(PlainTextExtractor));

    let store = memory_store();
    let model = Arc::new(ScriptedModel::default());
    let kb = KnowledgeBase::new(store.clone(), model.clone(), &settings(PromptPolicy::Blended))
        .expect("kb")
        .with_extractors(extractors);

    assert!(kb.ingest(&IngestRequest::file(&path)).await.success);
    let other = kb.ingest(&IngestRequest::text("The quarterly report covers revenue and operating costs.")).await;
    assert_eq!(other.documents_indexed, 1);

    let hits = Retriever::new(store, 3).retrieve("What do I do for fun?").await.expect("retrieve");
    assert_eq!(hits.len(), 2);
    assert!(hits[0].chunk.source_id.ends_with("doc.pdf"), "{}", hits[0].chunk.source_id);

    let result = kb.query(&QueryRequest::new("What do I do for fun?")).await.expect("query");
    assert_eq!(result.answer, "scripted answer");
    let calls = model.calls();
    assert!(calls[0].0.contains("I hike in the mountains"));
    assert!(calls[0].1[0].source_id.ends_with("doc.pdf"));
}

#[tokio::test]
async fn collaborator_failures_map_to_stage_errors() {
    let kb = KnowledgeBase::new(Arc::new(DownStore), Arc::new(ScriptedModel::default()), &settings(PromptPolicy::Blended))
        .expect("kb");
    let err = kb.query(&QueryRequest::new("anything")).await.expect_err("retrieval");
    assert!(matches!(err, Error::Retrieval(_)), "{:?}", err);

    let kb = KnowledgeBase::new(memory_store(), Arc::new(ScriptedModel::failing()), &settings(PromptPolicy::Blended))
        .expect("kb");
    let err = kb.query(&QueryRequest::new("anything")).await.expect_err("generation");
    match err {
        Error::Generation(msg) => assert!(msg.contains("timed out")),
        other => panic!("expected Generation, got {:?}", other),
    }
}

#[test]
fn invalid_chunking_settings_are_rejected_up_front() {
    let mut settings = Settings::default();
    settings.chunking = ChunkingConfig { min_length: 10, max_length: 5, overlap: 0 };
    let result = KnowledgeBase::new(memory_store(), Arc::new(ScriptedModel::default()), &settings);
    assert!(matches!(result, Err(Error::Config(_))));
}
