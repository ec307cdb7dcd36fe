//! Prompt assembly under the two answering policies.

use gatekeeper_core::config::PromptPolicy;
use gatekeeper_core::types::ScoredChunk;

/// Strict-policy answer when nothing was retrieved. The model is not called.
pub const UNKNOWN_ANSWER: &str = "I don't know. The knowledge base has nothing on that question.";

const STRICT_INSTRUCTIONS: &str = "\
You are a helpful assistant answering questions about the user's personal knowledge base.
Use only the context provided to answer the question.
If the answer cannot be derived from the context, say that you don't know. Do not make up an answer.";

const BLENDED_INSTRUCTIONS: &str = "\
I will ask you a question and will provide some additional context information.
Assume this context information is factual and correct, as part of internal documentation.
If the question relates to the context, answer it using the context, along with general knowledge where it helps.
If the question does not relate to the context, answer it as normal from general knowledge without referring to the context.";

const NO_CONTEXT: &str = "(no relevant context found)";

pub struct PromptAssembler {
    policy: PromptPolicy,
}

impl PromptAssembler {
    pub fn new(policy: PromptPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PromptPolicy {
        self.policy
    }

    pub fn assemble(&self, query: &str, chunks: &[ScoredChunk]) -> String {
        let instructions = match self.policy {
            PromptPolicy::Strict => STRICT_INSTRUCTIONS,
            PromptPolicy::Blended => BLENDED_INSTRUCTIONS,
        };
        let context = if chunks.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            chunks
                .iter()
                .enumerate()
                .map(|(i, hit)| format!("[{}] (source: {})\n{}", i + 1, hit.chunk.source_id, hit.chunk.text))
                .collect::<Vec<_>>()
                .join("\n\n")
        };
        format!("{}\n\nContext:\n{}\n\nQuestion: {}", instructions, context, query)
    }
}
