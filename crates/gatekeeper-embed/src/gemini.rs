//! Hosted embeddings through the Gemini `batchEmbedContents` endpoint.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use gatekeeper_core::config::{resolve_api_key, EmbeddingSettings};
use gatekeeper_core::traits::Embedder;

/// The endpoint rejects larger batches.
const MAX_BATCH: usize = 100;

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    output_dimensionality: usize,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

pub struct GeminiEmbedder {
    client: Client,
    api_key: String,
    endpoint: String,
    /// `models/<name>`, as the request body expects it.
    model: String,
    id: String,
    dim: usize,
    batch_size: usize,
}

impl GeminiEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = resolve_api_key(settings.api_key.as_deref())
            .ok_or_else(|| anyhow!("Gemini embeddings need an API key (embedding.api_key or GEMINI_API_KEY)"))?;
        let name = settings.model.trim_start_matches("models/");
        Ok(Self {
            client: Client::new(),
            api_key,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: format!("models/{}", name),
            id: format!("gemini:{}:d{}", name, settings.dim),
            dim: settings.dim,
            batch_size: settings.batch_size.clamp(1, MAX_BATCH),
        })
    }

    fn request_body<'a>(&'a self, texts: &'a [String]) -> BatchEmbedRequest<'a> {
        BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: &self.model,
                    content: Content { parts: [Part { text: text.as_str() }] },
                    output_dimensionality: self.dim,
                })
                .collect(),
        }
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/{}:batchEmbedContents", self.endpoint, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(texts))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("embedding request failed with {}: {}", status, body);
        }
        let parsed: BatchEmbedResponse = response.json().await?;
        self.check_response(parsed, texts.len())
    }

    fn check_response(&self, parsed: BatchEmbedResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
        if parsed.embeddings.len() != expected {
            bail!("expected {} embeddings, got {}", expected, parsed.embeddings.len());
        }
        parsed
            .embeddings
            .into_iter()
            .map(|e| {
                if e.values.len() != self.dim {
                    bail!("embedding has {} dimensions, expected {}", e.values.len(), self.dim);
                }
                let mut v = e.values;
                // Truncated outputs are not unit length.
                crate::l2_normalize(&mut v);
                Ok(v)
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            out.extend(self.embed_chunk(batch).await?);
        }
        tracing::debug!(model = %self.model, texts = texts.len(), "gemini embeddings");
        Ok(out)
    }
}
