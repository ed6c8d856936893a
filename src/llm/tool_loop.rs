//! Nested tool-calling exchange shared by the HTTP providers
//!
//! A backend completion either yields final text or a batch of tool calls.
//! Tool calls are answered in order by the caller's `ToolHandler`, the
//! results are appended to the wire history and the backend is asked again.

use async_trait::async_trait;

use crate::agent::conversation::Conversation;
use crate::core::{ForemanError, Result, ToolCall, ToolDefinition};
use crate::llm::traits::ChatOptions;

/// One entry of the provider-side message history
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    /// Plain `{role, content}` message
    Chat { role: String, content: String },
    /// Assistant turn that requested tools
    ToolCalls { content: String, calls: Vec<ToolCall> },
    /// Answer to a single tool call
    ToolResult {
        call_id: String,
        name: String,
        content: String,
    },
}

/// Outcome of one backend round
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

/// A backend that can perform a single completion round
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Provider id used in errors and logs
    fn backend_id(&self) -> &str;

    async fn complete(
        &self,
        model: &str,
        messages: &[WireMessage],
        tools: &[ToolDefinition],
    ) -> Result<Completion>;
}

/// Initial wire history: optional instructions, then the conversation
pub fn initial_messages(conversation: &Conversation, options: &ChatOptions) -> Vec<WireMessage> {
    let mut messages = Vec::with_capacity(conversation.len() + 1);

    if let Some(ref instructions) = options.instructions {
        messages.push(WireMessage::Chat {
            role: "system".to_string(),
            content: instructions.clone(),
        });
    }

    messages.extend(
        conversation
            .to_backend_format()
            .into_iter()
            .map(|m| WireMessage::Chat {
                role: m.role,
                content: m.content,
            }),
    );

    messages
}

/// Drive a conversation to a final answer, answering tool calls on the way.
///
/// At most `max_rounds` batches of tool calls are served; a backend that keeps
/// asking after that fails the call.
pub async fn run(
    backend: &dyn CompletionBackend,
    conversation: &Conversation,
    model: &str,
    options: &ChatOptions,
    max_rounds: usize,
) -> Result<String> {
    let mut messages = initial_messages(conversation, options);
    let definitions = options
        .tools
        .as_ref()
        .map(|t| t.definitions())
        .unwrap_or_default();

    for round in 0..=max_rounds {
        let completion = backend.complete(model, &messages, &definitions).await?;

        if completion.tool_calls.is_empty() {
            return Ok(completion.content);
        }

        let Some(handler) = options.tools.as_ref() else {
            return Err(ForemanError::provider(
                backend.backend_id(),
                "backend requested a tool call but no tools were offered",
            ));
        };

        if round == max_rounds {
            break;
        }

        tracing::debug!(
            provider = backend.backend_id(),
            round = round + 1,
            calls = completion.tool_calls.len(),
            "Serving tool calls"
        );

        let calls = completion.tool_calls;
        messages.push(WireMessage::ToolCalls {
            content: completion.content,
            calls: calls.clone(),
        });

        for call in calls {
            let output = handler.handle(&call).await;
            messages.push(WireMessage::ToolResult {
                call_id: call.id,
                name: call.name,
                content: output,
            });
        }
    }

    Err(ForemanError::provider(
        backend.backend_id(),
        format!("gave up after {} tool rounds without a final answer", max_rounds),
    ))
}
