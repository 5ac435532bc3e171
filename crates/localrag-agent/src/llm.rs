use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use localrag_core::traits::{CompletionBackend, CompletionRequest};
use localrag_core::BackendError;
use localrag_http::{build_client, join_url, post_json};

/// Text completion via a local Ollama server (`POST /api/generate`, non-streaming).
pub struct OllamaCompletion {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaCompletion {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Ok(Self { client: build_client()?, base_url: base_url.to_string() })
    }
}

#[async_trait]
impl CompletionBackend for OllamaCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let body = serde_json::json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }
        });
        let url = join_url(&self.base_url, "api/generate");
        let value = post_json(&self.client, &url, &body, request.timeout).await?;
        let parsed: GenerateResponse = serde_json::from_value(value)
            .map_err(|e| BackendError::Malformed(format!("invalid generate response from Ollama: {e}")))?;
        tracing::debug!(model = %request.model, chars = parsed.response.len(), "completion received");
        Ok(parsed.response)
    }
}
