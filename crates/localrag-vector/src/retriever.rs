use std::path::Path;
use std::sync::Arc;

use localrag_core::types::{Chunk, ScoredChunk};
use localrag_core::Result;

use crate::index::{EmbeddingIndex, Index};
use crate::store;

pub const DEFAULT_TOP_K: usize = 4;

/// Query-time view over an index that may not exist yet.
///
/// Without an index every retrieval is empty; callers use `total_chunks() == 0`
/// to fall back to answering without context.
pub struct Retriever {
    engine: EmbeddingIndex,
    index: Option<Arc<Index>>,
    top_k: usize,
}

impl Retriever {
    pub fn new(engine: EmbeddingIndex, index: Option<Index>) -> Self {
        Self { engine, index: index.map(Arc::new), top_k: DEFAULT_TOP_K }
    }

    /// Load whatever is persisted at `location` for the engine's model.
    pub async fn open(engine: EmbeddingIndex, location: &Path) -> Result<Self> {
        let index = store::load(location, engine.model_id()).await?;
        Ok(Self::new(engine, index))
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k.max(1);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn index(&self) -> Option<&Index> {
        self.index.as_deref()
    }

    pub fn total_chunks(&self) -> usize {
        self.index.as_ref().map(|i| i.len()).unwrap_or(0)
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<Chunk>> {
        self.retrieve_k(question, self.top_k).await
    }

    pub async fn retrieve_k(&self, question: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self.retrieve_scored(question, k).await?.into_iter().map(|s| s.chunk).collect())
    }

    pub async fn retrieve_scored(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        match &self.index {
            Some(index) if !index.is_empty() => {
                let hits = self.engine.query_scored(index, question, k).await?;
                tracing::debug!(k, hits = hits.len(), "retrieved");
                Ok(hits)
            }
            _ => Ok(Vec::new()),
        }
    }
}
