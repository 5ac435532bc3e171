//! Fixed-size, overlapping character windows over extracted document text.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than zero".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Distance between consecutive window starts.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Validates the window settings up front so a bad config never reaches a document.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            chunks.extend(self.split_document(doc));
        }
        tracing::debug!(documents = documents.len(), chunks = chunks.len(), "split documents");
        chunks
    }

    fn split_document(&self, doc: &Document) -> Vec<Chunk> {
        // Byte position of every char, so windows are cut on char boundaries.
        let boundaries: Vec<usize> = doc.text.char_indices().map(|(i, _)| i).collect();
        let len = boundaries.len();
        let byte_at = |pos: usize| if pos >= len { doc.text.len() } else { boundaries[pos] };

        let mut metadata = doc.metadata.clone();
        metadata.insert("source_id".to_string(), doc.source_id.clone());

        (0..len)
            .step_by(self.config.step())
            .map(|start| {
                let end = (start + self.config.chunk_size).min(len);
                Chunk {
                    text: doc.text[byte_at(start)..byte_at(end)].to_string(),
                    source_id: doc.source_id.clone(),
                    offset: start,
                    metadata: metadata.clone(),
                }
            })
            .collect()
    }
}
