//! Application wiring
//!
//! `AppContext` carries the shared services every component needs; it is
//! cloned into assistants and channels instead of being reached globally.

use std::path::PathBuf;
use std::sync::Arc;

use crate::agent::sub_agent::SubAgentRegistry;
use crate::channel::{Channel, ChannelManager};
use crate::core::{Config, Result};
use crate::llm::ModelProviderManager;
use crate::storage::{ConversationStore, FileConversationStore};

/// Shared services, all safe for concurrent read access
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub models: Arc<ModelProviderManager>,
    pub subagents: Arc<SubAgentRegistry>,
    pub store: Arc<dyn ConversationStore>,
}

impl AppContext {
    pub fn new(
        config: Arc<Config>,
        models: Arc<ModelProviderManager>,
        subagents: Arc<SubAgentRegistry>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            config,
            models,
            subagents,
            store,
        }
    }
}

/// Owns the context and the running channels
pub struct Application {
    context: AppContext,
    channels: ChannelManager,
}

impl Application {
    /// Bring up storage, subagents and the model provider for a loaded config
    pub async fn bootstrap(data_dir: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let data_dir = data_dir.into();
        tracing::info!(data_dir = %data_dir.display(), "Starting application");

        let config = Arc::new(config);

        let store = FileConversationStore::in_data_dir(&data_dir);
        store.init().await?;

        let subagents = SubAgentRegistry::initialize(&data_dir)?;

        let mut models = ModelProviderManager::with_builtin_providers(config.clone())?;
        models.initialize()?;

        Ok(Self {
            context: AppContext::new(
                config,
                Arc::new(models),
                Arc::new(subagents),
                Arc::new(store),
            ),
            channels: ChannelManager::new(),
        })
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn add_channel(&mut self, channel: Arc<dyn Channel>) {
        self.channels.add_channel(channel);
    }

    /// Start every channel
    pub async fn start(&self) -> Result<()> {
        self.channels.start_all().await
    }

    /// Stop every channel
    pub async fn stop(&self) -> Result<()> {
        tracing::info!("Stopping application");
        self.channels.stop_all().await?;
        tracing::info!("Application stopped");
        Ok(())
    }
}
