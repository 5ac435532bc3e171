use std::time::Duration;

use async_trait::async_trait;

use crate::error::BackendError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier of the embedding model; recorded in persisted indexes.
    fn model_id(&self) -> &str;
    /// Embedding dimensionality, when known before the first call.
    fn dimension(&self) -> Option<usize>;
    /// One vector per input text, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError>;
}
