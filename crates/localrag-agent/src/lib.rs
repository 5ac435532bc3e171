//! localrag-agent
//!
//! Role-specialized agents over the retrieval pipeline: the built-in
//! registry and its prompts, keyword routing, the Ollama completion client
//! and the answer assembler that ties them to a `Retriever`.

pub mod assembler;
pub mod llm;
pub mod prompts;
pub mod registry;
pub mod router;

pub use assembler::{AnswerAssembler, AnswerMode};
pub use llm::OllamaCompletion;
pub use registry::{AgentProfile, AgentRegistry, BackendSettings};
pub use router::Router;
