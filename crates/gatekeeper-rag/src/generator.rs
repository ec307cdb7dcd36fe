use std::sync::Arc;

use gatekeeper_core::config::PromptPolicy;
use gatekeeper_core::traits::LanguageModel;
use gatekeeper_core::types::{Chunk, ScoredChunk};
use gatekeeper_core::{Error, Result};

use crate::prompt::{PromptAssembler, UNKNOWN_ANSWER};

/// One model call per question; the completion is returned verbatim.
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    assembler: PromptAssembler,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, assembler: PromptAssembler) -> Self {
        Self { model, assembler }
    }

    pub async fn generate(&self, query: &str, retrieved: &[ScoredChunk]) -> Result<String> {
        if retrieved.is_empty() && self.assembler.policy() == PromptPolicy::Strict {
            tracing::info!("no context under strict policy, answering unknown");
            return Ok(UNKNOWN_ANSWER.to_string());
        }
        let prompt = self.assembler.assemble(query, retrieved);
        let docs: Vec<Chunk> = retrieved.iter().map(|hit| hit.chunk.clone()).collect();
        let answer = self
            .model
            .generate(&prompt, &docs)
            .await
            .map_err(|e| Error::Generation(format!("{:#}", e)))?;
        tracing::debug!(answer_chars = answer.chars().count(), "generated");
        Ok(answer)
    }
}
