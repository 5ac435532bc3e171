use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use localrag_core::config::Settings;

use crate::prompts;

/// Generation parameters for one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendSettings {
    pub model_name: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentProfile {
    pub id: String,
    pub display_name: String,
    pub role_description: String,
    pub prompt_template: String,
    pub capabilities: Vec<String>,
    /// Empty for agents that are only reachable by explicit selection.
    pub routing_keywords: BTreeSet<String>,
    pub backend: BackendSettings,
}

impl AgentProfile {
    pub fn render(&self, context: &str, question: &str) -> String {
        prompts::render(&self.prompt_template, context, question)
    }

    /// Prompt used when there is no index to draw context from.
    pub fn direct_prompt(&self, question: &str) -> String {
        format!("{}\n\nQUESTION:\n{}\n\nANSWER:", self.role_description, question)
    }
}

/// Fixed, read-only `id -> AgentProfile` map. Iteration is in id order.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: BTreeMap<String, AgentProfile>,
}

struct Builtin {
    id: &'static str,
    display_name: &'static str,
    role: &'static str,
    template: &'static str,
    capabilities: &'static [&'static str],
    keywords: &'static [&'static str],
    temperature: f32,
}

const CODER_KEYWORDS: &[&str] = &[
    "code", "program", "function", "class", "method", "algorithm", "python", "javascript", "java", "html", "css",
    "sql", "api", "debug", "error", "variable", "import", "export", "compile", "syntax", "framework", "library",
    "git", "docker", "database",
];

const ASSISTANT_KEYWORDS: &[&str] = &[
    "document", "organize", "email", "letter", "report", "summary", "meeting", "agenda", "format", "template",
    "table", "chart", "plan", "strategy", "communication", "presentation", "budget", "task", "project", "calendar",
    "reminder", "analysis",
];

const BUILTINS: &[Builtin] = &[
    Builtin {
        id: "coder",
        display_name: "Code Assistant",
        role: prompts::CODER_ROLE,
        template: prompts::CODER_TEMPLATE,
        capabilities: &[
            "Full-stack development",
            "Debugging and profiling",
            "Software architecture",
            "Code review",
            "Technical documentation",
            "Algorithm optimization",
        ],
        keywords: CODER_KEYWORDS,
        temperature: 0.1,
    },
    Builtin {
        id: "assistant",
        display_name: "General Assistant",
        role: prompts::ASSISTANT_ROLE,
        template: prompts::ASSISTANT_TEMPLATE,
        capabilities: &[
            "Document management",
            "Professional communication",
            "Project organization",
            "Task automation",
            "Templates and formats",
            "Document analysis",
            "Executive summaries",
        ],
        keywords: ASSISTANT_KEYWORDS,
        temperature: 0.3,
    },
    Builtin {
        id: "research_analyst",
        display_name: "Research Analyst",
        role: prompts::RESEARCH_ANALYST_ROLE,
        template: prompts::RESEARCH_ANALYST_TEMPLATE,
        capabilities: &[
            "Documentary analysis",
            "Information synthesis",
            "Insight extraction",
            "Pattern identification",
            "Critical evaluation",
        ],
        keywords: &[],
        temperature: 0.3,
    },
    Builtin {
        id: "project_organizer",
        display_name: "Project Organizer",
        role: prompts::PROJECT_ORGANIZER_ROLE,
        template: prompts::PROJECT_ORGANIZER_TEMPLATE,
        capabilities: &[
            "Information structuring",
            "Project planning",
            "Schedule creation",
            "Task management",
            "Prioritization",
        ],
        keywords: &[],
        temperature: 0.3,
    },
    Builtin {
        id: "advanced_summarizer",
        display_name: "Advanced Summarizer",
        role: prompts::ADVANCED_SUMMARIZER_ROLE,
        template: prompts::ADVANCED_SUMMARIZER_TEMPLATE,
        capabilities: &[
            "Executive summary",
            "Key point extraction",
            "Content synthesis",
            "Detail level adaptation",
            "Logical structuring",
        ],
        keywords: &[],
        temperature: 0.3,
    },
    Builtin {
        id: "code_analyzer",
        display_name: "Code Analyzer",
        role: prompts::CODE_ANALYZER_ROLE,
        template: prompts::CODE_ANALYZER_TEMPLATE,
        capabilities: &[
            "Code analysis",
            "Technical review",
            "Technical documentation",
            "Optimizations",
            "Concept explanations",
        ],
        keywords: &[],
        temperature: 0.3,
    },
];

impl AgentRegistry {
    /// The built-in agents, with model names and output limits taken from `settings`.
    pub fn builtin(settings: &Settings) -> Self {
        let model_for = |id: &str| match id {
            "coder" => settings.models.coder.clone(),
            "assistant" => settings.models.assistant.clone(),
            _ => settings.models.general.clone(),
        };
        Self::from_profiles(BUILTINS.iter().map(|b| AgentProfile {
            id: b.id.to_string(),
            display_name: b.display_name.to_string(),
            role_description: b.role.to_string(),
            prompt_template: b.template.to_string(),
            capabilities: b.capabilities.iter().map(|c| c.to_string()).collect(),
            routing_keywords: b.keywords.iter().map(|k| k.to_string()).collect(),
            backend: BackendSettings {
                model_name: model_for(b.id),
                temperature: b.temperature,
                max_output_tokens: settings.generation.max_output_tokens,
            },
        }))
    }

    pub fn from_profiles(profiles: impl IntoIterator<Item = AgentProfile>) -> Self {
        Self { agents: profiles.into_iter().map(|p| (p.id.clone(), p)).collect() }
    }

    pub fn get(&self, id: &str) -> Option<&AgentProfile> {
        self.agents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentProfile> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
