//! Model provider trait for abstracting different backends
//!
//! Enables swapping between OpenRouter, Ollama, etc.

use async_trait::async_trait;
use std::sync::Arc;

use crate::agent::conversation::Conversation;
use crate::core::{Result, ToolCall, ToolDefinition};

/// Tools a backend may call in the middle of a completion.
///
/// The handler answers every call with text; failures are reported in that
/// text rather than as errors so the model can recover conversationally.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool schemas advertised to the backend
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run one tool call and produce its textual result
    async fn handle(&self, call: &ToolCall) -> String;
}

/// Options for a single chat call
#[derive(Clone, Default)]
pub struct ChatOptions {
    /// Model override; the configured default is used when absent
    pub model: Option<String>,
    /// System instructions sent ahead of the conversation, never stored
    pub instructions: Option<String>,
    /// Tools the backend may invoke mid-completion
    pub tools: Option<Arc<dyn ToolHandler>>,
}

impl ChatOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolHandler>) -> Self {
        self.tools = Some(tools);
        self
    }
}

impl std::fmt::Debug for ChatOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOptions")
            .field("model", &self.model)
            .field("instructions", &self.instructions.as_ref().map(|i| i.len()))
            .field(
                "tools",
                &self
                    .tools
                    .as_ref()
                    .map(|t| t.definitions().into_iter().map(|d| d.function.name).collect::<Vec<_>>()),
            )
            .finish()
    }
}

/// Trait for model providers
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Stable identifier used in configuration
    fn id(&self) -> &str;

    /// Complete a conversation with the given model, running any tool
    /// round-trips the backend asks for before returning the final text
    async fn chat(
        &self,
        conversation: &Conversation,
        model: &str,
        options: &ChatOptions,
    ) -> Result<String>;
}
