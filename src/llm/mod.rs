//! LLM module - Language Model integrations
//!
//! Provides the provider abstraction, the shared tool-calling loop and the
//! OpenRouter and Ollama backends.

pub mod ollama;
pub mod provider;
pub mod tool_loop;
pub mod traits;

pub use ollama::OllamaClient;
pub use provider::{ModelProviderManager, ProviderFactory};
pub use traits::{ChatOptions, ModelProvider, ToolHandler};
