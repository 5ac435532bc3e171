//! Domain types shared by the chunker, the index and the answer assembler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Meta = BTreeMap<String, String>;

/// Raw extracted text of one source document, as handed over by a loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub source_id: String,
    pub metadata: Meta,
}

impl Document {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { text: text.into(), source_id: source_id.into(), metadata: Meta::new() }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded window of a source document.
///
/// - `text`: at most `chunk_size` characters
/// - `source_id`: identity of the parent document
/// - `offset`: character position of the window start within the source
/// - `metadata`: loader-supplied fields plus `source_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub offset: usize,
    pub metadata: Meta,
}

impl Chunk {
    /// Stable identifier used to pair the chunk with its embedding.
    pub fn key(&self) -> String {
        format!("{}:{}", self.source_id, self.offset)
    }
}

/// A chunk returned from a similarity query. Higher `score` is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Citation attached to an augmented answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_id: String,
    pub preview: String,
}

/// Outcome of one question. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub agent_id: String,
    pub used_retrieval: bool,
    pub success: bool,
    pub error: Option<String>,
}

impl QueryResult {
    pub fn answered(agent_id: &str, answer: String, sources: Vec<SourceRef>, used_retrieval: bool) -> Self {
        Self { answer, sources, agent_id: agent_id.to_string(), used_retrieval, success: true, error: None }
    }

    pub fn failed(agent_id: &str, used_retrieval: bool, reason: String) -> Self {
        Self {
            answer: format!("Error: {reason}"),
            sources: Vec::new(),
            agent_id: agent_id.to_string(),
            used_retrieval,
            success: false,
            error: Some(reason),
        }
    }
}
