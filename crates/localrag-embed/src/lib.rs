//! Embedding backends.
//!
//! `OllamaEmbedder` talks to a local Ollama server; `FakeEmbedder` is a
//! deterministic hashing stand-in selected with `APP_USE_FAKE_EMBEDDINGS=1`.

pub mod fake;
pub mod ollama;

use std::sync::Arc;

use localrag_core::config::Settings;
use localrag_core::traits::Embedder;
use localrag_core::BackendError;

pub use fake::FakeEmbedder;
pub use ollama::OllamaEmbedder;

pub const FAKE_EMBEDDING_DIM: usize = 768;

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Embedder for the configured model, or the fake one when requested via env.
pub fn get_default_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>, BackendError> {
    if use_fake_embeddings() {
        tracing::info!("using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(FAKE_EMBEDDING_DIM)));
    }
    let embedder = OllamaEmbedder::new(&settings.ollama.base_url, &settings.models.embeddings, settings.ollama.timeout())?;
    tracing::info!(model = %settings.models.embeddings, base_url = %settings.ollama.base_url, "using Ollama embeddings");
    Ok(Arc::new(embedder))
}
