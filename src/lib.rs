//! Foreman - conversational assistant with delegating subagents
//!
//! A top-level assistant keeps a persistent conversation, talks to a
//! configurable model provider and can hand a focused task to a named
//! subagent through a single delegation tool. Subagents run in their own
//! throwaway conversation and cannot delegate further.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Model provider abstraction with OpenRouter and Ollama backends
//! - **Agent**: Conversations, subagents, delegation and the assistant turn
//! - **Storage**: Conversation persistence
//! - **Channel**: Inbound/outbound message plumbing
//! - **CLI**: Terminal channel and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use foreman::{Application, Config, SessionBridge, TerminalOutput};
//!
//! #[tokio::main]
//! async fn main() -> foreman::Result<()> {
//!     let data_dir = Config::default_data_dir();
//!     let config = Config::load(&data_dir)?;
//!     let app = Application::bootstrap(data_dir.clone(), config).await?;
//!
//!     let bridge = SessionBridge::new(
//!         app.context().clone(),
//!         Arc::new(TerminalOutput::in_data_dir(&data_dir)),
//!     );
//!     bridge.on_inbound_text(None, "What's 2+2?").await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod app;
pub mod channel;
pub mod cli;
pub mod core;
pub mod llm;
pub mod storage;

// Re-export commonly used items
pub use agent::{Assistant, Conversation, SubAgent, SubAgentRegistry};
pub use app::{AppContext, Application};
pub use channel::{Channel, ChannelManager, OutboundSink, SessionBridge};
pub use cli::{Repl, TerminalOutput};
pub use core::{Config, ForemanError, Result};
pub use llm::{ChatOptions, ModelProvider, ModelProviderManager};
pub use storage::{ConversationStore, FileConversationStore, MemoryConversationStore};
