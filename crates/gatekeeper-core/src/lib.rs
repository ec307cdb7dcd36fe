//! Core of the gatekeeper knowledge base: domain types, the error taxonomy,
//! collaborator traits, layered configuration, and the sentence chunker.

pub mod chunker;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::{chunk, Chunker, ChunkingConfig};
pub use error::{Error, Result};
