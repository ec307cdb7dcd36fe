//! Ingestion and query pipelines.
//!
//! Ingestion: [`IngestRequest`] → extract → chunk → [`Indexer`] → store.
//! Query: question → [`Retriever`] → [`PromptAssembler`] → [`AnswerGenerator`] → answer.
//! [`KnowledgeBase`] runs both end to end.

pub mod generator;
pub mod indexer;
pub mod knowledge_base;
pub mod prompt;
pub mod retriever;

pub use gatekeeper_core::types::{AnswerResult, IngestOutcome, IngestRequest, QueryRequest};
pub use generator::AnswerGenerator;
pub use indexer::Indexer;
pub use knowledge_base::KnowledgeBase;
pub use prompt::{PromptAssembler, UNKNOWN_ANSWER};
pub use retriever::Retriever;
