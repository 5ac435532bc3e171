use std::time::Duration;

use async_trait::async_trait;
use localrag_core::traits::Embedder;
use localrag_core::BackendError;
use reqwest::Client;
use serde::Deserialize;

use localrag_http::{build_client, join_url, post_json};

/// Embeddings from a local Ollama server via `POST /api/embed`.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, BackendError> {
        Ok(Self { client: build_client()?, base_url: base_url.to_string(), model: model.to_string(), timeout })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> Option<usize> {
        None
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = serde_json::json!({ "model": self.model, "input": texts });
        let url = join_url(&self.base_url, "api/embed");
        let value = post_json(&self.client, &url, &body, self.timeout).await?;
        let parsed: EmbedResponse = serde_json::from_value(value)
            .map_err(|e| BackendError::Malformed(format!("invalid embed response from Ollama: {e}")))?;
        if parsed.embeddings.len() != texts.len() {
            return Err(BackendError::Malformed(format!(
                "Ollama returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }
        tracing::debug!(model = %self.model, n = texts.len(), "embedded batch");
        Ok(parsed.embeddings)
    }
}
