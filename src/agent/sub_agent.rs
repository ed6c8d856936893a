//! Sub-agent support
//!
//! Named, specialised agents the assistant can delegate tasks to. Definitions
//! live in `<data_dir>/agents.toml`; a default set is written on first run.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::agent::conversation::Conversation;
use crate::core::{ForemanError, Result};

/// A specialised agent delegated tasks run against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAgent {
    /// Unique key used in delegation requests
    pub id: String,
    /// Display name shown to users
    pub name: String,
    /// Backend model identifier
    pub model: String,
    /// System prompt defining the sub-agent's role
    pub system_prompt: String,
}

impl SubAgent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    /// Fresh two-message conversation for a delegated task
    pub fn conversation_for(&self, task: &str) -> Conversation {
        let mut conversation = Conversation::new();
        conversation.add_system(&self.system_prompt);
        conversation.add_user(task);
        conversation
    }
}

/// One entry of agents.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAgentConfig {
    pub name: String,
    pub model: String,
    pub system_prompt: String,
}

/// Document stored in agents.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsFile {
    #[serde(default)]
    pub agents: BTreeMap<String, SubAgentConfig>,
}

impl Default for AgentsFile {
    fn default() -> Self {
        let mut agents = BTreeMap::new();
        agents.insert(
            "project_manager".to_string(),
            SubAgentConfig {
                name: "Project Manager".to_string(),
                model: "deepseek/deepseek-v3.2".to_string(),
                system_prompt: "You are an expert Project Manager agent. Your primary role is to \
                    analyze user requests, create detailed implementation plans, and break them \
                    down into clear, actionable tasks for other specialized agents to execute."
                    .to_string(),
            },
        );
        agents.insert(
            "programmer".to_string(),
            SubAgentConfig {
                name: "Programmer".to_string(),
                model: "minimax/minimax-m2.5".to_string(),
                system_prompt: "You are an expert Programmer agent. Your goal is to write clean, \
                    efficient, bug-free, and well-documented code according to the tasks assigned \
                    to you. Follow software engineering best practices and ensure your code \
                    integrates perfectly with the existing architecture."
                    .to_string(),
            },
        );
        Self { agents }
    }
}

/// Read-only lookup table of sub-agents keyed by id
#[derive(Debug, Clone, Default)]
pub struct SubAgentRegistry {
    agents: HashMap<String, SubAgent>,
}

impl SubAgentRegistry {
    /// Get the agents file path inside a data directory
    pub fn agents_file(data_dir: &Path) -> std::path::PathBuf {
        data_dir.join("agents.toml")
    }

    /// Load `<data_dir>/agents.toml`, writing the default set first if absent
    pub fn initialize(data_dir: &Path) -> Result<Self> {
        let path = Self::agents_file(data_dir);

        let file = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| ForemanError::config(format!("Failed to read agents: {}", e)))?;
            toml::from_str(&content)
                .map_err(|e| ForemanError::config(format!("Failed to parse agents: {}", e)))?
        } else {
            tracing::info!(path = %path.display(), "agents.toml not found, writing default agents");
            let file = AgentsFile::default();
            Self::save(data_dir, &file)?;
            file
        };

        let registry = Self::from_file(file);
        tracing::info!(count = registry.len(), "Loaded subagents");
        Ok(registry)
    }

    fn save(data_dir: &Path, file: &AgentsFile) -> Result<()> {
        fs::create_dir_all(data_dir)?;

        let content = toml::to_string_pretty(file)
            .map_err(|e| ForemanError::config(format!("Failed to serialize agents: {}", e)))?;
        fs::write(Self::agents_file(data_dir), content)?;
        Ok(())
    }

    /// Build a registry from a parsed agents document
    pub fn from_file(file: AgentsFile) -> Self {
        Self::from_agents(file.agents.into_iter().map(|(id, cfg)| {
            SubAgent::new(id, cfg.name, cfg.model, cfg.system_prompt)
        }))
    }

    /// Build a registry from agents directly
    pub fn from_agents(agents: impl IntoIterator<Item = SubAgent>) -> Self {
        Self {
            agents: agents.into_iter().map(|a| (a.id.clone(), a)).collect(),
        }
    }

    /// Look up an agent; absence is a normal outcome
    pub fn get_agent(&self, id: &str) -> Option<&SubAgent> {
        self.agents.get(id)
    }

    /// Every registered id, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.agents.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Agents sorted by id
    pub fn agents(&self) -> Vec<&SubAgent> {
        let mut agents: Vec<&SubAgent> = self.agents.values().collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
