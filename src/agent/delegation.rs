//! Delegation tool
//!
//! The single tool offered to the outer model. Each call resolves a subagent,
//! runs the task in a fresh two-message conversation on the subagent's model
//! and folds the answer back as text. Failures never escape as errors: an
//! unknown id or a failed sub-call becomes the tool result.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::agent::sink::ResponseSink;
use crate::agent::sub_agent::SubAgentRegistry;
use crate::agent::turn::{DelegationRecord, TurnState};
use crate::core::{ToolCall, ToolDefinition};
use crate::llm::{ChatOptions, ModelProviderManager, ToolHandler};

/// Name the delegation tool is advertised under
pub const DELEGATE_TOOL_NAME: &str = "delegate_to_subagent";

/// Longest a progress notice may hold up the delegation
const NOTICE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles `delegate_to_subagent` calls for one turn
pub struct DelegationTool {
    subagents: Arc<SubAgentRegistry>,
    models: Arc<ModelProviderManager>,
    sink: Arc<dyn ResponseSink>,
    turn: Arc<Mutex<TurnState>>,
    notice_timeout: Duration,
}

impl DelegationTool {
    pub fn new(
        subagents: Arc<SubAgentRegistry>,
        models: Arc<ModelProviderManager>,
        sink: Arc<dyn ResponseSink>,
        turn: Arc<Mutex<TurnState>>,
    ) -> Self {
        Self {
            subagents,
            models,
            sink,
            turn,
            notice_timeout: NOTICE_TIMEOUT,
        }
    }

    pub fn with_notice_timeout(mut self, timeout: Duration) -> Self {
        self.notice_timeout = timeout;
        self
    }

    /// Schema advertised to the backend
    pub fn definition() -> ToolDefinition {
        ToolDefinition::function(
            DELEGATE_TOOL_NAME,
            "Delegate a task to a specialised subagent and return its answer",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "subagentId": {
                        "type": "string",
                        "description": "Id of the subagent to delegate to"
                    },
                    "task": {
                        "type": "string",
                        "description": "Complete description of the task for the subagent"
                    }
                },
                "required": ["subagentId", "task"]
            }),
        )
    }

    /// Run one delegation and produce the tool result text
    pub async fn delegate(&self, subagent_id: &str, task: &str) -> String {
        self.with_turn(|t| t.enter_delegation());

        let Some(agent) = self.subagents.get_agent(subagent_id) else {
            let output = format!(
                "Subagent '{}' not found. Available subagents: {}",
                subagent_id,
                self.subagents.ids().join(", ")
            );
            tracing::warn!(subagent_id, "Delegation to unknown subagent");
            self.with_turn(|t| t.finish_delegation(DelegationRecord::failure(subagent_id, &output)));
            return output;
        };

        let conversation = agent.conversation_for(task);
        tracing::info!(
            subagent_id,
            model = %agent.model,
            conversation_id = conversation.id(),
            "Delegating task"
        );
        self.notify(&format!("Delegating to {}...", agent.name)).await;

        let options = ChatOptions::default().with_model(&agent.model);
        match self.models.chat(&conversation, options).await {
            Ok(answer) => {
                self.notify(&format!("{} says:\n{}", agent.name, answer)).await;

                let output = format!("{} responded:\n{}", agent.name, answer);
                self.with_turn(|t| {
                    t.finish_delegation(DelegationRecord::success(subagent_id, &output))
                });
                output
            }
            Err(e) => {
                tracing::warn!(subagent_id, error = %e, "Delegated task failed");

                let output = format!("Subagent '{}' failed to complete the task: {}", subagent_id, e);
                self.with_turn(|t| t.finish_delegation(DelegationRecord::failure(subagent_id, &output)));
                output
            }
        }
    }

    /// Deliver a progress notice in order, giving up on a stalled sink
    async fn notify(&self, text: &str) {
        if tokio::time::timeout(self.notice_timeout, self.sink.send(text))
            .await
            .is_err()
        {
            tracing::warn!(
                timeout_ms = self.notice_timeout.as_millis() as u64,
                "Progress notice delivery timed out, continuing"
            );
        }
    }

    fn with_turn(&self, f: impl FnOnce(&mut TurnState)) {
        // A poisoned lock only loses bookkeeping, never the delegation result
        if let Ok(mut turn) = self.turn.lock() {
            f(&mut turn);
        }
    }
}

#[async_trait]
impl ToolHandler for DelegationTool {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![Self::definition()]
    }

    async fn handle(&self, call: &ToolCall) -> String {
        if call.name != DELEGATE_TOOL_NAME {
            return format!(
                "Unknown tool '{}'. The only available tool is '{}'.",
                call.name, DELEGATE_TOOL_NAME
            );
        }

        let (Some(subagent_id), Some(task)) = (call.get_string("subagentId"), call.get_string("task"))
        else {
            return format!(
                "Invalid arguments for '{}': both 'subagentId' and 'task' must be strings",
                DELEGATE_TOOL_NAME
            );
        };

        self.delegate(&subagent_id, &task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::conversation::Conversation;
    use crate::agent::sink::Discard;
    use crate::agent::sub_agent::SubAgent;
    use crate::core::{Config, ForemanError, Result};
    use crate::llm::ModelProvider;

    struct Failing;

    struct Answering;

    #[async_trait]
    impl ModelProvider for Answering {
        fn id(&self) -> &str {
            "answering"
        }

        async fn chat(&self, _: &Conversation, _: &str, _: &ChatOptions) -> Result<String> {
            Ok("done".to_string())
        }
    }

    /// Sink whose delivery never completes
    struct Stalled;

    #[async_trait]
    impl ResponseSink for Stalled {
        async fn send(&self, _text: &str) {
            std::future::pending::<()>().await
        }
    }

    #[async_trait]
    impl ModelProvider for Failing {
        fn id(&self) -> &str {
            "failing"
        }

        async fn chat(&self, _: &Conversation, _: &str, _: &ChatOptions) -> Result<String> {
            Err(ForemanError::provider("failing", "backend exploded"))
        }
    }

    fn tool_with(provider: Arc<dyn ModelProvider>) -> (DelegationTool, Arc<Mutex<TurnState>>) {
        tool_with_sink(provider, Arc::new(Discard))
    }

    fn tool_with_sink(
        provider: Arc<dyn ModelProvider>,
        sink: Arc<dyn ResponseSink>,
    ) -> (DelegationTool, Arc<Mutex<TurnState>>) {
        let mut config = Config::default();
        config.ai.provider = provider.id().to_string();

        let mut models = ModelProviderManager::new(Arc::new(config));
        models.register_provider(provider).unwrap();
        models.initialize().unwrap();

        let registry = SubAgentRegistry::from_agents(vec![
            SubAgent::new("project_manager", "Project Manager", "pm-model", "Plan."),
            SubAgent::new("programmer", "Programmer", "dev-model", "Code."),
        ]);

        let turn = Arc::new(Mutex::new(TurnState::default()));
        let tool = DelegationTool::new(
            Arc::new(registry),
            Arc::new(models),
            sink,
            turn.clone(),
        );
        (tool, turn)
    }

    #[tokio::test]
    async fn test_unknown_subagent_lists_ids() {
        let (tool, turn) = tool_with(Arc::new(Failing));

        let output = tool.delegate("coder", "write a function").await;
        assert!(output.contains("coder"));
        assert!(output.contains("programmer, project_manager"));

        let turn = turn.lock().unwrap();
        assert_eq!(turn.delegations.len(), 1);
        assert!(!turn.delegations[0].success);
    }

    #[tokio::test]
    async fn test_failed_subcall_is_contained() {
        let (tool, turn) = tool_with(Arc::new(Failing));

        let output = tool.delegate("programmer", "write a function").await;
        assert!(output.contains("programmer"));
        assert!(output.contains("backend exploded"));
        assert_eq!(turn.lock().unwrap().failed_delegations(), 1);
    }

    #[tokio::test]
    async fn test_stalled_sink_does_not_hold_up_delegation() {
        let (tool, turn) = tool_with_sink(Arc::new(Answering), Arc::new(Stalled));
        let tool = tool.with_notice_timeout(Duration::from_millis(20));

        let output = tokio::time::timeout(
            Duration::from_secs(5),
            tool.delegate("programmer", "write a function"),
        )
        .await
        .unwrap();

        assert_eq!(output, "Programmer responded:\ndone");
        assert!(turn.lock().unwrap().delegations[0].success);
    }

    #[tokio::test]
    async fn test_bad_arguments_and_unknown_tool() {
        let (tool, _) = tool_with(Arc::new(Failing));

        let missing = ToolCall::new("c1", DELEGATE_TOOL_NAME, serde_json::json!({"task": "x"}));
        assert!(tool.handle(&missing).await.contains("Invalid arguments"));

        let other = ToolCall::new("c2", "shell", serde_json::json!({}));
        assert!(tool.handle(&other).await.contains("Unknown tool 'shell'"));
    }

    #[test]
    fn test_definition_declares_both_parameters() {
        let def = DelegationTool::definition();
        assert_eq!(def.name(), DELEGATE_TOOL_NAME);
        let props = &def.function.parameters["properties"];
        assert_eq!(props["subagentId"]["type"], "string");
        assert_eq!(props["task"]["type"], "string");
    }
}
