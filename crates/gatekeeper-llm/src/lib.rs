//! Language models behind the [`LanguageModel`] trait.

pub mod gemini;

pub use gatekeeper_core::traits::LanguageModel;
pub use gemini::GeminiModel;
