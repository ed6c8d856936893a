//! OpenRouter Provider
//!
//! Implementation for the OpenAI-compatible OpenRouter chat completions API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::agent::conversation::Conversation;
use crate::core::{Config, ForemanError, Result, ToolCall, ToolDefinition};
use crate::llm::tool_loop::{self, Completion, CompletionBackend, WireMessage};
use crate::llm::traits::{ChatOptions, ModelProvider};

pub const PROVIDER_ID: &str = "openrouter";

/// OpenRouter API client
#[derive(Clone)]
pub struct OpenRouterProvider {
    client: Client,
    base_url: String,
    api_key: String,
    max_tool_rounds: usize,
}

/// Chat completions request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
}

/// OpenAI message format
#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: OpenAiFunction,
}

fn function_type() -> String {
    "function".to_string()
}

/// Arguments travel as a JSON-encoded string
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenRouterProvider {
    /// Create a client for a base URL and key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(120))
    }

    fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForemanError::transport(PROVIDER_ID, e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_tool_rounds: 8,
        })
    }

    /// Create the provider from configuration; a missing key is fatal
    pub fn from_config(config: &Config) -> Result<Self> {
        if !config.has_openrouter_key() {
            return Err(ForemanError::config(
                "OpenRouter API key not found (set providers.openrouter.api_key or OPENROUTER_API_KEY)",
            ));
        }

        let settings = &config.providers.openrouter;
        let mut provider = Self::with_timeout(
            &settings.base_url,
            &settings.api_key,
            Duration::from_secs(settings.timeout_secs),
        )?;
        provider.max_tool_rounds = config.ai.max_tool_rounds;
        Ok(provider)
    }

    /// Factory used by the provider manager
    pub fn factory(config: &Config) -> Result<Arc<dyn ModelProvider>> {
        Ok(Arc::new(Self::from_config(config)?))
    }

    /// Limit tool round-trips per chat call
    pub fn set_max_tool_rounds(&mut self, rounds: usize) {
        self.max_tool_rounds = rounds;
    }

    fn to_openai_message(msg: &WireMessage) -> OpenAiMessage {
        match msg {
            WireMessage::Chat { role, content } => OpenAiMessage {
                role: role.clone(),
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            WireMessage::ToolCalls { content, calls } => OpenAiMessage {
                role: "assistant".to_string(),
                content: (!content.is_empty()).then(|| content.clone()),
                tool_calls: Some(
                    calls
                        .iter()
                        .map(|tc| OpenAiToolCall {
                            id: tc.id.clone(),
                            call_type: function_type(),
                            function: OpenAiFunction {
                                name: tc.name.clone(),
                                arguments: tc.arguments.to_string(),
                            },
                        })
                        .collect(),
                ),
                tool_call_id: None,
            },
            WireMessage::ToolResult {
                call_id, content, ..
            } => OpenAiMessage {
                role: "tool".to_string(),
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: Some(call_id.clone()),
            },
        }
    }

    fn to_completion(response: ChatResponse) -> Result<Completion> {
        if let Some(error) = response.error {
            return Err(ForemanError::provider(PROVIDER_ID, error.message));
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ForemanError::provider(PROVIDER_ID, "response contained no choices"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                // Malformed argument strings are passed through so the tool can report them
                let arguments = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments));
                ToolCall::new(tc.id, tc.function.name, arguments)
            })
            .collect();

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterProvider {
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
            messages: messages.iter().map(Self::to_openai_message).collect(),
            tools: (!tools.is_empty()).then_some(tools),
        };

        tracing::debug!(
            provider = PROVIDER_ID,
            model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ForemanError::transport(PROVIDER_ID, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(ForemanError::provider(
                PROVIDER_ID,
                format!("API error ({}): {}", status, error_text),
            ));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ForemanError::transport(PROVIDER_ID, e))?;
        tracing::debug!(provider = PROVIDER_ID, body = %truncate(&response_text, 500), "Response");

        let chat_response: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            ForemanError::provider(PROVIDER_ID, format!("Failed to parse response: {}", e))
        })?;

        Self::to_completion(chat_response)
    }
}

#[async_trait]
impl ModelProvider for OpenRouterProvider {
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

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
