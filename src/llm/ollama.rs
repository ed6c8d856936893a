//! Ollama client implementation
//!
//! Async HTTP client for the Ollama chat API with tool calling support.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::agent::conversation::Conversation;
use crate::core::{Config, ForemanError, Result, ToolCall, ToolDefinition};
use crate::llm::tool_loop::{self, Completion, CompletionBackend, WireMessage};
use crate::llm::traits::{ChatOptions, ModelProvider};

pub const PROVIDER_ID: &str = "ollama";

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    max_tool_rounds: usize,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    stream: bool,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

/// Ollama tool call format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

/// Ollama function in tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    arguments: serde_json::Value,
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: OllamaMessage,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            config.ollama_url(),
            Duration::from_secs(config.providers.ollama.timeout_secs),
            config.ai.max_tool_rounds,
        )
    }

    fn build(base_url: String, timeout: Duration, max_tool_rounds: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForemanError::transport(PROVIDER_ID, e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tool_rounds,
        })
    }

    /// Factory used by the provider manager
    pub fn factory(config: &Config) -> Result<Arc<dyn ModelProvider>> {
        Ok(Arc::new(Self::from_config(config)?))
    }

    /// Convert a wire message to Ollama format
    fn to_ollama_message(msg: &WireMessage) -> OllamaMessage {
        match msg {
            WireMessage::Chat { role, content } => OllamaMessage {
                role: role.clone(),
                content: content.clone(),
                tool_calls: None,
                tool_name: None,
            },
            WireMessage::ToolCalls { content, calls } => OllamaMessage {
                role: "assistant".to_string(),
                content: content.clone(),
                tool_calls: Some(
                    calls
                        .iter()
                        .map(|tc| OllamaToolCall {
                            function: OllamaFunction {
                                name: tc.name.clone(),
                                arguments: tc.arguments.clone(),
                            },
                        })
                        .collect(),
                ),
                tool_name: None,
            },
            WireMessage::ToolResult { name, content, .. } => OllamaMessage {
                role: "tool".to_string(),
                content: content.clone(),
                tool_calls: None,
                tool_name: Some(name.clone()),
            },
        }
    }

    /// Ollama does not assign call ids, so they are numbered per round
    fn to_completion(response: ChatResponse) -> Completion {
        let tool_calls = response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, tc)| ToolCall::new(format!("call_{}", i), tc.function.name, tc.function.arguments))
            .collect();

        Completion {
            content: response.message.content,
            tool_calls,
        }
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    fn backend_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[WireMessage],
        tools: &[ToolDefinition],
    ) -> Result<Completion> {
        let request = ChatRequest {
            model,
            messages: messages.iter().map(Self::to_ollama_message).collect(),
            tools: (!tools.is_empty()).then_some(tools),
            stream: false,
        };

        tracing::debug!(provider = PROVIDER_ID, model, "Sending chat request");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    tracing::warn!(url = %self.base_url, "Cannot connect to Ollama. Is it running?");
                }
                ForemanError::transport(PROVIDER_ID, e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(ForemanError::provider(
                    PROVIDER_ID,
                    format!("Model '{}' not available. Run: ollama pull {}", model, model),
                ));
            }

            return Err(ForemanError::provider(
                PROVIDER_ID,
                format!("Ollama API error ({}): {}", status, error_text),
            ));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            ForemanError::provider(PROVIDER_ID, format!("Failed to parse response: {}", e))
        })?;

        Ok(Self::to_completion(chat_response))
    }
}

#[async_trait]
impl ModelProvider for OllamaClient {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn chat(
        &self,
        conversation: &Conversation,
        model: &str,
        options: &ChatOptions,
    ) -> Result<String> {
        tool_loop::run(self, conversation, model, options, self.max_tool_rounds).await
    }
}
