//! Assistant orchestrator
//!
//! Owns one conversation and runs turns against the active model provider
//! with the delegation tool available. A turn moves
//! `Idle -> AwaitingModel -> (Delegating)* -> Responded -> Idle`.

use std::sync::{Arc, Mutex};

use crate::agent::conversation::Conversation;
use crate::agent::delegation::DelegationTool;
use crate::agent::prompts::assistant_instructions;
use crate::agent::sink::{Discard, ResponseSink};
use crate::agent::turn::{TurnPhase, TurnState};
use crate::app::AppContext;
use crate::core::Result;
use crate::llm::ChatOptions;

/// Top-level assistant bound to at most one conversation
pub struct Assistant {
    /// Shared services
    ctx: AppContext,
    /// Conversation the next turn runs against
    conversation: Option<Conversation>,
    /// Receives delegation notices and the final answer
    sink: Arc<dyn ResponseSink>,
    /// Phase and delegation log of the current or last turn
    turn: Arc<Mutex<TurnState>>,
}

impl Assistant {
    /// Create an assistant with no conversation and a discarding sink
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            conversation: None,
            sink: Arc::new(Discard),
            turn: Arc::new(Mutex::new(TurnState::default())),
        }
    }

    /// Set the response callback
    pub fn on_response(&mut self, sink: Arc<dyn ResponseSink>) {
        self.sink = sink;
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Start a fresh conversation and persist it
    pub async fn create_conversation(&mut self) -> Result<&Conversation> {
        let conversation = Conversation::new();
        tracing::info!(conversation_id = conversation.id(), "Creating conversation");

        self.ctx.store.save(&conversation).await?;
        Ok(self.conversation.insert(conversation))
    }

    /// Bind an existing conversation
    pub fn use_conversation(&mut self, conversation: Conversation) {
        self.conversation = Some(conversation);
    }

    /// Bind a stored conversation by id
    pub async fn attach(&mut self, id: &str) -> Result<&Conversation> {
        let conversation = self.ctx.store.load(id).await?;
        tracing::debug!(
            conversation_id = id,
            messages = conversation.len(),
            "Attached stored conversation"
        );
        Ok(self.conversation.insert(conversation))
    }

    /// Append user input to the bound conversation; false if none is bound
    pub fn add_user_message(&mut self, text: impl Into<String>) -> bool {
        match self.conversation.as_mut() {
            Some(conversation) => {
                conversation.add_user(text);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the current or last turn
    pub fn last_turn(&self) -> TurnState {
        snapshot(&self.turn)
    }

    /// Run one turn.
    ///
    /// Returns `Ok(None)` without side effects when no conversation is bound.
    /// Errors from the outer model call or from persistence propagate; a
    /// failed delegation only shows up in the tool result the model sees.
    pub async fn run(&mut self) -> Result<Option<String>> {
        let Some(conversation) = self.conversation.as_mut() else {
            return Ok(None);
        };

        update_turn(&self.turn, TurnState::begin);
        tracing::info!(
            conversation_id = conversation.id(),
            messages = conversation.len(),
            "Running turn"
        );

        let tool = DelegationTool::new(
            self.ctx.subagents.clone(),
            self.ctx.models.clone(),
            self.sink.clone(),
            self.turn.clone(),
        );

        let instructions = self
            .ctx
            .config
            .ai
            .system_prompt
            .clone()
            .unwrap_or_else(|| assistant_instructions(&self.ctx.subagents));

        let options = ChatOptions::default()
            .with_instructions(instructions)
            .with_tools(Arc::new(tool));

        let response = match self.ctx.models.chat(conversation, options).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(conversation_id = conversation.id(), error = %e, "Turn failed");
                update_turn(&self.turn, TurnState::reset);
                return Err(e);
            }
        };

        update_turn(&self.turn, TurnState::respond);
        self.sink.send(&response).await;
        conversation.add_assistant(&response);

        let saved = self.ctx.store.save(conversation).await;
        update_turn(&self.turn, TurnState::reset);
        saved?;

        let turn = snapshot(&self.turn);
        tracing::info!(
            conversation_id = conversation.id(),
            delegations = turn.delegations.len(),
            failed = turn.failed_delegations(),
            "Turn complete"
        );

        Ok(Some(response))
    }

    /// Current phase
    pub fn phase(&self) -> TurnPhase {
        self.turn.lock().map(|t| t.phase).unwrap_or_default()
    }
}

fn update_turn(turn: &Mutex<TurnState>, f: impl FnOnce(&mut TurnState)) {
    if let Ok(mut turn) = turn.lock() {
        f(&mut turn);
    }
}

fn snapshot(turn: &Mutex<TurnState>) -> TurnState {
    turn.lock().map(|t| t.clone()).unwrap_or_default()
}
