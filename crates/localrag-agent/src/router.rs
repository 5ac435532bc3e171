use std::sync::Arc;

use localrag_core::{Error, Result};

use crate::registry::AgentRegistry;

/// Explicit agent value that asks for keyword routing.
pub const AUTO: &str = "auto";

/// Picks the agent that handles a question.
///
/// Auto mode scores every agent by how many of its routing keywords occur in
/// the lower-cased question. A strict winner takes it; any tie at the top,
/// including nobody scoring, falls back to the default agent.
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<AgentRegistry>,
    default_agent: String,
}

impl Router {
    pub fn new(registry: Arc<AgentRegistry>, default_agent: &str) -> Result<Self> {
        if !registry.contains(default_agent) {
            return Err(Error::InvalidConfig(format!(
                "router.default_agent '{}' is not a registered agent",
                default_agent
            )));
        }
        Ok(Self { registry, default_agent: default_agent.to_string() })
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }

    pub fn select(&self, question: &str, explicit: Option<&str>) -> Result<String> {
        match explicit {
            Some(id) if id != AUTO => {
                if self.registry.contains(id) {
                    Ok(id.to_string())
                } else {
                    Err(Error::UnknownAgent(id.to_string()))
                }
            }
            _ => Ok(self.detect(question)),
        }
    }

    /// Keyword hits per agent, in registry order.
    pub fn scores(&self, question: &str) -> Vec<(&str, usize)> {
        let lowered = question.to_lowercase();
        self.registry
            .iter()
            .map(|p| {
                let hits = p.routing_keywords.iter().filter(|k| lowered.contains(k.as_str())).count();
                (p.id.as_str(), hits)
            })
            .collect()
    }

    fn detect(&self, question: &str) -> String {
        let scores = self.scores(question);
        let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        let mut leaders = scores.iter().filter(|(_, s)| *s == best);
        let chosen = match (leaders.next(), leaders.next()) {
            (Some((id, _)), None) if best > 0 => *id,
            _ => self.default_agent.as_str(),
        };
        tracing::debug!(agent = chosen, score = best, "routed question");
        chosen.to_string()
    }
}
