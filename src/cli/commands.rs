//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::app::AppContext;

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// Start a new conversation
    NewConversation,
}

/// What the REPL knows about its own session
pub struct ReplState {
    pub ctx: AppContext,
    /// Conversation id the next message continues, if any
    pub session: Option<String>,
}

impl ReplState {
    pub fn new(ctx: AppContext, session: Option<String>) -> Self {
        Self { ctx, session }
    }
}

/// Parse and handle special commands
pub fn handle_command(input: &str, state: &mut ReplState) -> CommandResult {
    let input = input.trim();
    // Commands take no arguments, so only a bare word counts
    let cmd = input.trim_start_matches('/').to_lowercase();

    match cmd.as_str() {
        "exit" | "quit" | "q" => CommandResult::Exit,

        "new" | "clear" | "reset" => {
            state.session = None;
            CommandResult::NewConversation
        }

        "help" | "?" => CommandResult::Handled(help_text()),

        "agents" => CommandResult::Handled(agents_text(&state.ctx)),

        "status" => CommandResult::Handled(status_text(state)),

        _ => {
            // Not a command, treat as normal input
            if input.starts_with('/') {
                CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                ))
            } else {
                CommandResult::Continue(input.to_string())
            }
        }
    }
}

fn agents_text(ctx: &AppContext) -> String {
    if ctx.subagents.is_empty() {
        return "No subagents configured.".to_string();
    }

    let mut output = String::from("Subagents:\n");
    for agent in ctx.subagents.agents() {
        output.push_str(&format!("  {} ({})\n    model: {}\n", agent.id, agent.name, agent.model));
    }
    output.trim_end().to_string()
}

fn status_text(state: &ReplState) -> String {
    let ctx = &state.ctx;
    format!(
        "Foreman Status:\n\
         ─────────────────────────────\n\
         Provider:     {}\n\
         Model:        {}\n\
         Subagents:    {}\n\
         Conversation: {}",
        ctx.models.active().map(|p| p.id()).unwrap_or("none"),
        ctx.models.default_model(),
        ctx.subagents.len(),
        state.session.as_deref().unwrap_or("(new)")
    )
}

/// Generate help text
fn help_text() -> String {
    r#"Foreman Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit Foreman
  new              Start a new conversation
  agents           List the configured subagents
  status           Show provider, model and conversation

Keyboard Shortcuts:
  Ctrl+C           Stop Foreman
  Ctrl+D           Exit Foreman

Anything else is sent to the assistant, which may hand
parts of the work to a subagent.
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::sub_agent::{SubAgent, SubAgentRegistry};
    use crate::core::Config;
    use crate::llm::ModelProviderManager;
    use crate::storage::MemoryConversationStore;
    use std::sync::Arc;

    fn state() -> ReplState {
        let config = Arc::new(Config::default());
        let ctx = AppContext::new(
            config.clone(),
            Arc::new(ModelProviderManager::new(config)),
            Arc::new(SubAgentRegistry::from_agents([SubAgent::new(
                "programmer",
                "Programmer",
                "minimax/minimax-m2.5",
                "You write code.",
            )])),
            Arc::new(MemoryConversationStore::new()),
        );
        ReplState::new(ctx, Some("abc".to_string()))
    }

    #[test]
    fn test_exit_aliases() {
        let mut state = state();
        for input in ["exit", "quit", "q", "/exit"] {
            assert_eq!(handle_command(input, &mut state), CommandResult::Exit);
        }
    }

    #[test]
    fn test_new_drops_session() {
        let mut state = state();
        assert_eq!(
            handle_command("new", &mut state),
            CommandResult::NewConversation
        );
        assert!(state.session.is_none());
    }

    #[test]
    fn test_agents_listing() {
        let mut state = state();
        match handle_command("agents", &mut state) {
            CommandResult::Handled(text) => {
                assert!(text.contains("programmer (Programmer)"));
                assert!(text.contains("minimax/minimax-m2.5"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_status_without_provider() {
        let mut state = state();
        match handle_command("status", &mut state) {
            CommandResult::Handled(text) => {
                assert!(text.contains("Provider:     none"));
                assert!(text.contains("Conversation: abc"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_continues() {
        let mut state = state();
        assert_eq!(
            handle_command("  What's 2+2? ", &mut state),
            CommandResult::Continue("What's 2+2?".to_string())
        );
        assert_eq!(
            handle_command("help me plan a release", &mut state),
            CommandResult::Continue("help me plan a release".to_string())
        );
        assert!(matches!(
            handle_command("/frobnicate", &mut state),
            CommandResult::Handled(text) if text.starts_with("Unknown command: frobnicate")
        ));
    }
}
