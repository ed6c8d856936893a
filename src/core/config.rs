//! Configuration management for Foreman
//!
//! Supports a TOML config file, environment variables and runtime overrides.
//! When no config file exists a default document is written and used.
//!
//! Config file location: <data_dir>/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{ForemanError, Result};

/// Placeholder written into a freshly bootstrapped config
pub const API_KEY_PLACEHOLDER: &str = "YOUR_OPENROUTER_API_KEY";

/// Main configuration for Foreman
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active backend and default model
    pub ai: AiConfig,
    /// Per-backend settings and credentials
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Messaging channel settings
    #[serde(default)]
    pub channels: ChannelsConfig,
}

/// Model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Id of the active model provider
    pub provider: String,
    /// Model used when a call does not name one
    pub model: String,
    /// Replaces the built-in assistant persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Maximum tool round-trips inside a single chat call
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

fn default_max_tool_rounds() -> usize {
    8
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// OpenRouter credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Longest reply sent inline; anything longer goes out as a file
    pub inline_limit: usize,
    #[serde(default)]
    pub terminal: TerminalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            providers: ProvidersConfig::default(),
            channels: ChannelsConfig::default(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "openrouter".to_string(),
            model: "deepseek/deepseek-v3.2".to_string(),
            system_prompt: None,
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: API_KEY_PLACEHOLDER.to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            timeout_secs: 120,
        }
    }
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            inline_limit: 1900,
            terminal: TerminalConfig::default(),
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Default data directory (config, agents, conversations)
    pub fn default_data_dir() -> PathBuf {
        if let Ok(dir) = env::var("FOREMAN_DATA_DIR") {
            return PathBuf::from(dir);
        }

        dirs::data_local_dir()
            .map(|d| d.join("foreman"))
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    /// Get the config file path inside a data directory
    pub fn config_file(data_dir: &Path) -> PathBuf {
        data_dir.join("config.toml")
    }

    /// Load configuration from `<data_dir>/config.toml`.
    ///
    /// Priority: env vars > config file > defaults. A missing file is
    /// bootstrapped with the defaults and written back. The result is validated.
    pub fn load(data_dir: &Path) -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let path = Self::config_file(data_dir);
        let mut config = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            tracing::info!(path = %path.display(), "Config file not found, writing defaults");
            let config = Self::default();
            config.save(data_dir)?;
            config
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a file only
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ForemanError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse a config document
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ForemanError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to `<data_dir>/config.toml`
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        // Create data directory if it doesn't exist
        if !data_dir.exists() {
            fs::create_dir_all(data_dir)
                .map_err(|e| ForemanError::config(format!("Failed to create data dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ForemanError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(Self::config_file(data_dir), content)
            .map_err(|e| ForemanError::config(format!("Failed to write config: {}", e)))?;

        tracing::debug!(data_dir = %data_dir.display(), "Configuration saved");
        Ok(())
    }

    /// Apply environment variable overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(provider) = env::var("FOREMAN_PROVIDER") {
            self.ai.provider = provider;
        }
        if let Ok(model) = env::var("FOREMAN_MODEL") {
            self.ai.model = model;
        }
        if let Ok(key) = env::var("OPENROUTER_API_KEY") {
            self.providers.openrouter.api_key = key;
        }
        if let Ok(host) = env::var("OLLAMA_HOST") {
            self.providers.ollama.host = host;
        }
        if let Some(port) = env::var("OLLAMA_PORT").ok().and_then(|p| p.parse().ok()) {
            self.providers.ollama.port = port;
        }
    }

    /// Check the document once so later code can rely on it
    pub fn validate(&self) -> Result<()> {
        if self.ai.provider.trim().is_empty() {
            return Err(ForemanError::config("ai.provider must not be empty"));
        }
        if self.ai.model.trim().is_empty() {
            return Err(ForemanError::config("ai.model must not be empty"));
        }
        if self.ai.max_tool_rounds == 0 {
            return Err(ForemanError::config("ai.max_tool_rounds must be at least 1"));
        }
        if self.channels.inline_limit == 0 {
            return Err(ForemanError::config(
                "channels.inline_limit must be at least 1",
            ));
        }

        url::Url::parse(&self.providers.openrouter.base_url).map_err(|e| {
            ForemanError::config(format!(
                "providers.openrouter.base_url '{}' is invalid: {}",
                self.providers.openrouter.base_url, e
            ))
        })?;

        Ok(())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.providers.ollama.host, self.providers.ollama.port
        )
    }

    /// Whether the OpenRouter key has been filled in
    pub fn has_openrouter_key(&self) -> bool {
        let key = self.providers.openrouter.api_key.trim();
        !key.is_empty() && key != API_KEY_PLACEHOLDER
    }
}
