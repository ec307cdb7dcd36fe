use std::sync::Arc;

use tracing::Instrument;

use gatekeeper_core::config::Settings;
use gatekeeper_core::traits::{LanguageModel, VectorStore};
use gatekeeper_core::types::{AnswerResult, IngestOutcome, IngestRequest, QueryRequest};
use gatekeeper_core::{Chunker, Result};
use gatekeeper_embed::build_embedder;
use gatekeeper_extract::ExtractorRegistry;
use gatekeeper_llm::GeminiModel;
use gatekeeper_vector::build_store;

use crate::generator::AnswerGenerator;
use crate::indexer::Indexer;
use crate::prompt::PromptAssembler;
use crate::retriever::Retriever;

/// Both pipelines over one store. Each call is a single pass: a failing
/// stage ends the call and no stage runs twice.
pub struct KnowledgeBase {
    extractors: ExtractorRegistry,
    chunker: Chunker,
    indexer: Indexer,
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl KnowledgeBase {
    pub fn new(store: Arc<dyn VectorStore>, model: Arc<dyn LanguageModel>, settings: &Settings) -> Result<Self> {
        Ok(Self {
            extractors: ExtractorRegistry::with_defaults(),
            chunker: Chunker::new(settings.chunking.clone())?,
            indexer: Indexer::new(store.clone()),
            retriever: Retriever::new(store, settings.retrieval.k),
            generator: AnswerGenerator::new(model, PromptAssembler::new(settings.prompt.policy)),
        })
    }

    /// Wire the configured embedder, store and model.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let embedder = build_embedder(&settings.embedding)?;
        let store = build_store(&settings.store, embedder).await?;
        let model = Arc::new(GeminiModel::new(&settings.llm)?);
        Ok(Self::new(store, model, settings)?)
    }

    pub fn extractors(&self) -> &ExtractorRegistry {
        &self.extractors
    }

    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    pub async fn ingest(&self, request: &IngestRequest) -> IngestOutcome {
        let span = tracing::info_span!("ingest", kind = request_kind(request));
        async {
            match self.try_ingest(request).await {
                Ok(n) => IngestOutcome::indexed(n),
                Err(e) => {
                    tracing::warn!(error = %e, kind = e.kind(), "ingestion failed");
                    IngestOutcome::failed(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn try_ingest(&self, request: &IngestRequest) -> Result<usize> {
        let document = self.extractors.extract(request).await?;
        let chunks = self.chunker.split(&document.text);
        tracing::debug!(source_id = %document.source_id, chars = document.text.chars().count(), chunks = chunks.len(), "chunked");
        self.indexer.index(chunks, &document.source_id).await
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<AnswerResult> {
        let span = tracing::info_span!("query", k = self.retriever.k());
        async {
            let retrieved = self.retriever.retrieve(&request.query).await?;
            let answer = self.generator.generate(&request.query, &retrieved).await?;
            Ok::<_, gatekeeper_core::Error>(AnswerResult { answer })
        }
        .instrument(span)
        .await
    }
}

fn request_kind(request: &IngestRequest) -> &'static str {
    match request {
        IngestRequest::File { .. } => "file",
        IngestRequest::Text { .. } => "text",
    }
}
