//! Model provider registry and manager
//!
//! Providers are registered at startup as factories keyed by a stable id.
//! `initialize` picks the configured one; every chat call goes through it.

pub mod openrouter;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::agent::conversation::Conversation;
use crate::core::{Config, ForemanError, Result};
use crate::llm::traits::{ChatOptions, ModelProvider};
use crate::llm::OllamaClient;

use self::openrouter::OpenRouterProvider;

/// Builds a provider from configuration
pub type ProviderFactory = fn(&Config) -> Result<Arc<dyn ModelProvider>>;

enum Registration {
    Factory(ProviderFactory),
    Instance(Arc<dyn ModelProvider>),
}

/// Holds the registered providers and the single active one
pub struct ModelProviderManager {
    config: Arc<Config>,
    registered: BTreeMap<String, Registration>,
    active: Option<Arc<dyn ModelProvider>>,
}

impl ModelProviderManager {
    /// Create an empty manager
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            registered: BTreeMap::new(),
            active: None,
        }
    }

    /// Create a manager with the built-in backends registered
    pub fn with_builtin_providers(config: Arc<Config>) -> Result<Self> {
        let mut manager = Self::new(config);
        manager.register_factory(openrouter::PROVIDER_ID, OpenRouterProvider::factory)?;
        manager.register_factory(crate::llm::ollama::PROVIDER_ID, OllamaClient::factory)?;
        Ok(manager)
    }

    /// Register a provider factory; it runs only if its id becomes active
    pub fn register_factory(&mut self, id: impl Into<String>, factory: ProviderFactory) -> Result<()> {
        self.insert(id.into(), Registration::Factory(factory))
    }

    /// Register an already constructed provider under its own id
    pub fn register_provider(&mut self, provider: Arc<dyn ModelProvider>) -> Result<()> {
        self.insert(provider.id().to_string(), Registration::Instance(provider))
    }

    fn insert(&mut self, id: String, registration: Registration) -> Result<()> {
        if self.registered.contains_key(&id) {
            return Err(ForemanError::DuplicateProvider(id));
        }
        tracing::debug!(provider = %id, "Registered model provider");
        self.registered.insert(id, registration);
        Ok(())
    }

    /// Ids of every registered provider, sorted
    pub fn provider_ids(&self) -> Vec<&str> {
        self.registered.keys().map(String::as_str).collect()
    }

    /// Select the configured provider.
    ///
    /// Fails with a configuration error when `ai.provider` is empty, names an
    /// unregistered id, or its factory rejects the configuration.
    pub fn initialize(&mut self) -> Result<()> {
        self.active = None;

        let id = self.config.ai.provider.trim();
        if id.is_empty() {
            return Err(ForemanError::config("No provider configured"));
        }

        let provider = match self.registered.get(id) {
            Some(Registration::Instance(provider)) => provider.clone(),
            Some(Registration::Factory(factory)) => factory(&self.config)?,
            None => {
                return Err(ForemanError::config(format!(
                    "Provider '{}' not found (registered: {})",
                    id,
                    self.provider_ids().join(", ")
                )))
            }
        };

        tracing::info!(provider = provider.id(), model = %self.config.ai.model, "Using model provider");
        self.active = Some(provider);
        Ok(())
    }

    /// The active provider, if initialized
    pub fn active(&self) -> Option<&Arc<dyn ModelProvider>> {
        self.active.as_ref()
    }

    /// Model used when a call does not name one
    pub fn default_model(&self) -> &str {
        &self.config.ai.model
    }

    /// Forward a chat call to the active provider
    pub async fn chat(&self, conversation: &Conversation, options: ChatOptions) -> Result<String> {
        let provider = self.active.as_ref().ok_or(ForemanError::NotInitialized)?;
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.config.ai.model.clone());

        tracing::debug!(
            provider = provider.id(),
            model = %model,
            conversation_id = conversation.id(),
            messages = conversation.len(),
            "Chat request"
        );

        provider.chat(conversation, &model, &options).await
    }
}
