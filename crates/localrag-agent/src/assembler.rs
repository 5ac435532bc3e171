use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use localrag_core::config::Settings;
use localrag_core::traits::{CompletionBackend, CompletionRequest};
use localrag_core::types::{Chunk, QueryResult, SourceRef};
use localrag_core::{Error, Result};
use localrag_vector::Retriever;

use crate::registry::AgentProfile;
use crate::router::Router;

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// How a question is answered, fixed once per question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// No indexed chunks: the agent answers from its role alone.
    Direct,
    /// Retrieved chunks are rendered into the agent's template.
    Augmented,
}

pub struct AnswerAssembler {
    router: Router,
    retriever: Retriever,
    backend: Arc<dyn CompletionBackend>,
    timeout: Duration,
    preview_chars: usize,
}

impl AnswerAssembler {
    pub fn new(router: Router, retriever: Retriever, backend: Arc<dyn CompletionBackend>, settings: &Settings) -> Self {
        Self {
            router,
            retriever,
            backend,
            timeout: settings.ollama.timeout(),
            preview_chars: settings.retrieval.preview_chars,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn mode(&self) -> AnswerMode {
        if self.retriever.total_chunks() == 0 {
            AnswerMode::Direct
        } else {
            AnswerMode::Augmented
        }
    }

    pub async fn ask(&self, question: &str, explicit_agent: Option<&str>) -> Result<QueryResult> {
        self.ask_k(question, explicit_agent, self.retriever.top_k()).await
    }

    /// Answer `question` with up to `k` retrieved chunks.
    ///
    /// Routing errors are returned before anything is embedded or generated.
    /// Backend failures come back as an unsuccessful `QueryResult`.
    pub async fn ask_k(&self, question: &str, explicit_agent: Option<&str>, k: usize) -> Result<QueryResult> {
        let agent_id = self.router.select(question, explicit_agent)?;
        let profile = self
            .router
            .registry()
            .get(&agent_id)
            .ok_or_else(|| Error::UnknownAgent(agent_id.clone()))?;
        let mode = self.mode();
        let used_retrieval = mode == AnswerMode::Augmented;
        tracing::info!(agent = %agent_id, ?mode, "answering question");

        let (prompt, sources) = match mode {
            AnswerMode::Direct => (profile.direct_prompt(question), Vec::new()),
            AnswerMode::Augmented => {
                let chunks = match self.retriever.retrieve_k(question, k.max(1)).await {
                    Ok(chunks) => chunks,
                    Err(Error::Backend(e)) => {
                        tracing::warn!(agent = %agent_id, error = %e, "retrieval failed");
                        return Ok(QueryResult::failed(&agent_id, used_retrieval, e.to_string()));
                    }
                    Err(e) => return Err(e),
                };
                let context = join_context(&chunks);
                let sources = chunks.iter().map(|c| self.source_ref(c)).collect();
                (profile.render(&context, question), sources)
            }
        };

        match self.backend.complete(&self.request(profile, prompt)).await {
            Ok(answer) => Ok(QueryResult::answered(&agent_id, answer, sources, used_retrieval)),
            Err(e) => {
                tracing::warn!(agent = %agent_id, error = %e, "completion failed");
                Ok(QueryResult::failed(&agent_id, used_retrieval, e.to_string()))
            }
        }
    }

    fn request(&self, profile: &AgentProfile, prompt: String) -> CompletionRequest {
        CompletionRequest {
            model: profile.backend.model_name.clone(),
            prompt,
            temperature: profile.backend.temperature,
            max_tokens: profile.backend.max_output_tokens,
            timeout: self.timeout,
        }
    }

    fn source_ref(&self, chunk: &Chunk) -> SourceRef {
        SourceRef { source_id: chunk.source_id.clone(), preview: preview(&chunk.text, self.preview_chars) }
    }
}

fn join_context(chunks: &[Chunk]) -> String {
    chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
}

/// First `max_chars` characters, with `...` appended when anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
