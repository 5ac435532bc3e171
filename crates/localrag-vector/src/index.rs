use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Table;
use tempfile::TempDir;

use localrag_core::config::EmbeddingSettings;
use localrag_core::traits::Embedder;
use localrag_core::types::{Chunk, ScoredChunk};
use localrag_core::{BackendError, Error, Result};

use crate::schema::{distances, entries_to_record_batch, CHUNKS_TABLE};
use crate::table::{create_table_from_batch, nearest, open_db};

/// One chunk paired with its embedding. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Immutable collection of embedded chunks plus the identity of the model
/// that produced the vectors. Safe to share across concurrent queries.
///
/// The entries are mirrored into a LanceDB table in a private scratch
/// directory that lives as long as the index; similarity search runs there.
#[derive(Clone)]
pub struct Index {
    model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
    table: Option<Table>,
    _scratch: Option<Arc<TempDir>>,
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Index {
    /// Validate `entries` and write them to a fresh searchable table.
    pub async fn materialize(model: impl Into<String>, dimension: usize, entries: Vec<IndexEntry>) -> Result<Self> {
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimension) {
            return Err(Error::Storage(format!(
                "entry {} has dimension {} but the index expects {}",
                bad.chunk.key(),
                bad.vector.len(),
                dimension
            )));
        }
        if entries.is_empty() {
            return Ok(Self { model: model.into(), dimension, entries, table: None, _scratch: None });
        }
        let scratch = tempfile::Builder::new().prefix("localrag-index-").tempdir()?;
        let conn = open_db(&scratch.path().to_string_lossy()).await?;
        let table = create_table_from_batch(&conn, CHUNKS_TABLE, entries_to_record_batch(&entries, dimension)?).await?;
        Ok(Self { model: model.into(), dimension, entries, table: Some(table), _scratch: Some(Arc::new(scratch)) })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Top-k entries by cosine similarity, closest first; ties keep insertion order.
    pub async fn search_vec(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(Error::InvalidConfig("k must be greater than zero".into()));
        }
        let Some(table) = &self.table else {
            return Ok(Vec::new());
        };
        if query.len() != self.dimension {
            return Err(Error::IndexMismatch {
                expected: format!("{} (dimension {})", self.model, self.dimension),
                found: format!("query vector of dimension {}", query.len()),
            });
        }
        let total = self.entries.len();
        let k = k.min(total);
        let mut limit = k;
        loop {
            let hits = self.ranked(table, query, limit).await?;
            // Lance returns equal distances in no fixed order: widen until every
            // row tied with the k-th hit is present.
            let settled = hits.len() < limit || limit >= total || hits.last().map(|h| h.1) != hits.get(k - 1).map(|h| h.1);
            if settled {
                return Ok(hits
                    .into_iter()
                    .take(k)
                    .map(|(i, score)| ScoredChunk { chunk: self.entries[i].chunk.clone(), score })
                    .collect());
            }
            limit = (limit * 2).min(total);
        }
    }

    /// Nearest `limit` rows as `(position, similarity)`, best first, position breaking ties.
    async fn ranked(&self, table: &Table, query: &[f32], limit: usize) -> Result<Vec<(usize, f32)>> {
        let mut hits = Vec::with_capacity(limit);
        for batch in nearest(table, query, limit).await? {
            for (position, distance) in distances(&batch)? {
                let i = usize::try_from(position)
                    .ok()
                    .filter(|&i| i < self.entries.len())
                    .ok_or_else(|| Error::Storage(format!("search returned unknown row {position}")))?;
                // zero vectors have no direction; lance reports NaN for them
                let score = if distance.is_finite() { 1.0 - distance } else { 0.0 };
                hits.push((i, score));
            }
        }
        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(hits)
    }
}

/// Builds and queries indexes with one embedding backend.
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    concurrency: usize,
    show_progress: bool,
}

impl EmbeddingIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        let defaults = EmbeddingSettings::default();
        Self { embedder, batch_size: defaults.batch_size, concurrency: defaults.concurrency, show_progress: false }
    }

    pub fn from_settings(embedder: Arc<dyn Embedder>, settings: &EmbeddingSettings) -> Self {
        Self::new(embedder).with_batch_size(settings.batch_size).with_concurrency(settings.concurrency)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    /// Embed every chunk and assemble an index.
    ///
    /// Up to `concurrency` batches are in flight; `buffered` yields them in
    /// submission order, so vectors stay paired with their chunks.
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<Index> {
        if chunks.is_empty() {
            return Err(Error::Build("no chunks to index".into()));
        }
        tracing::info!(chunks = chunks.len(), model = %self.model_id(), "building index");
        let pb = self.progress_bar(chunks.len());
        let batches: Vec<Vec<String>> = chunks
            .chunks(self.batch_size)
            .map(|batch| batch.iter().map(|c| c.text.clone()).collect())
            .collect();

        let embedder = &self.embedder;
        let pb_ref = &pb;
        let embedded: Vec<Vec<Vec<f32>>> = stream::iter(batches)
            .map(|texts| async move {
                let vectors = embedder.embed_batch(&texts).await?;
                if vectors.len() != texts.len() {
                    return Err(Error::Backend(BackendError::Malformed(format!(
                        "embedder returned {} vectors for {} texts",
                        vectors.len(),
                        texts.len()
                    ))));
                }
                pb_ref.inc(texts.len() as u64);
                Ok(vectors)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;
        let vectors: Vec<Vec<f32>> = embedded.into_iter().flatten().collect();

        let dimension = match self.embedder.dimension() {
            Some(d) => d,
            None => vectors.first().map(Vec::len).unwrap_or(0),
        };
        if dimension == 0 {
            return Err(Error::Backend(BackendError::Malformed("embedder returned empty vectors".into())));
        }
        if let Some(v) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(Error::Backend(BackendError::Malformed(format!(
                "inconsistent embedding dimension: expected {}, got {}",
                dimension,
                v.len()
            ))));
        }

        let entries = chunks.into_iter().zip(vectors).map(|(chunk, vector)| IndexEntry { chunk, vector }).collect();
        pb.finish_with_message("index built");
        let index = Index::materialize(self.model_id(), dimension, entries).await?;
        tracing::info!(entries = index.len(), dimension, "index built");
        Ok(index)
    }

    pub async fn query(&self, index: &Index, text: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self.query_scored(index, text, k).await?.into_iter().map(|s| s.chunk).collect())
    }

    /// Like `query`, keeping the similarity scores.
    pub async fn query_scored(&self, index: &Index, text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if index.model() != self.model_id() {
            return Err(Error::IndexMismatch { expected: self.model_id().to_string(), found: index.model().to_string() });
        }
        if index.is_empty() {
            return Ok(Vec::new());
        }
        let mut vectors = self.embedder.embed_batch(&[text.to_string()]).await?;
        let query = vectors
            .pop()
            .ok_or_else(|| Error::Backend(BackendError::Malformed("no embedding returned for query".into())))?;
        index.search_vec(&query, k).await
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str, vector: Vec<f32>) -> IndexEntry {
        IndexEntry {
            chunk: Chunk { text: source.to_string(), source_id: source.to_string(), offset: 0, metadata: Default::default() },
            vector,
        }
    }

    async fn sample() -> Index {
        Index::materialize(
            "m",
            2,
            vec![
                entry("a", vec![0.0, 1.0]),
                entry("b", vec![1.0, 0.0]),
                entry("c", vec![1.0, 0.0]),
                entry("d", vec![0.6, 0.8]),
            ],
        )
        .await
        .expect("index")
    }

    fn ids(hits: &[ScoredChunk]) -> Vec<&str> {
        hits.iter().map(|h| h.chunk.source_id.as_str()).collect()
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_and_keeps_insertion_order_on_ties() {
        let index = sample().await;
        let hits = index.search_vec(&[1.0, 0.0], 4).await.expect("search");
        assert_eq!(ids(&hits), vec!["b", "c", "d", "a"]);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!((hits[2].score - 0.6).abs() < 1e-5);
    }

    #[tokio::test]
    async fn tie_at_the_cut_goes_to_the_earlier_entry() {
        let index = sample().await;
        for _ in 0..5 {
            let hits = index.search_vec(&[1.0, 0.0], 1).await.expect("search");
            assert_eq!(ids(&hits), vec!["b"]);
        }
    }

    #[tokio::test]
    async fn search_rejects_wrong_dimension_and_zero_k() {
        let index = sample().await;
        assert!(matches!(index.search_vec(&[1.0, 0.0, 0.0], 1).await, Err(Error::IndexMismatch { .. })));
        assert!(matches!(index.search_vec(&[1.0, 0.0], 0).await, Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn k_larger_than_the_index_returns_everything() {
        let index = sample().await;
        assert_eq!(index.search_vec(&[0.0, 1.0], 10).await.expect("search").len(), 4);
    }

    #[tokio::test]
    async fn empty_index_needs_no_table() {
        let index = Index::materialize("m", 2, Vec::new()).await.expect("index");
        assert!(index.search_vec(&[1.0, 0.0], 3).await.expect("search").is_empty());
    }

    #[tokio::test]
    async fn mismatched_entry_dimension_is_rejected() {
        let err = Index::materialize("m", 3, vec![entry("a", vec![1.0, 0.0])]).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
