use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use gatekeeper_core::config::{resolve_api_key, LlmSettings};
use gatekeeper_core::traits::LanguageModel;
use gatekeeper_core::types::Chunk;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Gemini `generateContent`. The prompt is sent as a single user turn; it
/// already carries the retrieved context, so `docs` are only logged.
pub struct GeminiModel {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiModel {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let api_key = resolve_api_key(settings.api_key.as_deref())
            .ok_or_else(|| anyhow!("Gemini generation needs an API key (llm.api_key or GEMINI_API_KEY)"))?;
        let mut builder = Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            api_key,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.trim_start_matches("models/").to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn request_body(prompt: &str) -> GenerateRequest<'_> {
    GenerateRequest { contents: [Content { role: "user", parts: [Part { text: prompt }] }] }
}

/// Concatenated text parts of the first candidate.
fn answer_text(response: GenerateResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        bail!("prompt blocked: {}", reason);
    }
    let Some(candidate) = response.candidates.into_iter().next() else {
        bail!("response has no candidates");
    };
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        bail!("empty completion (finish reason: {})", candidate.finish_reason.as_deref().unwrap_or("unknown"));
    }
    Ok(text)
}

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn generate(&self, prompt: &str, docs: &[Chunk]) -> Result<String> {
        tracing::debug!(model = %self.model, prompt_chars = prompt.chars().count(), docs = docs.len(), "generateContent");
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(prompt))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("generation request failed with {}: {}", status, body);
        }
        answer_text(response.json().await?)
    }
}
