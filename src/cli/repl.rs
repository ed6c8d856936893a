//! Interactive REPL for Foreman
//!
//! The terminal is served as a channel: stdin lines are inbound messages,
//! replies are printed and long ones land in the outbox directory.

use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::app::AppContext;
use crate::channel::{Channel, OutboundSink, SessionBridge};
use crate::cli::commands::{handle_command, CommandResult, ReplState};
use crate::core::{ForemanError, Result};

/// Prints replies to stdout and writes attachments under an outbox directory
#[derive(Debug, Clone)]
pub struct TerminalOutput {
    outbox: PathBuf,
}

impl TerminalOutput {
    pub fn new(outbox: impl Into<PathBuf>) -> Self {
        Self {
            outbox: outbox.into(),
        }
    }

    /// Output whose outbox is `<data_dir>/outbox`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("outbox"))
    }
}

#[async_trait]
impl OutboundSink for TerminalOutput {
    async fn send_text(&self, _session_id: &str, text: &str) -> Result<()> {
        println!("\nAssistant:\n{}\n", text);
        Ok(())
    }

    async fn send_file(&self, session_id: &str, bytes: Vec<u8>, filename: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.outbox).await?;

        let path = self.outbox.join(format!("{}-{}", session_id, filename));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ForemanError::with_context("writing outbox file", e))?;

        println!("\nAssistant: reply saved to {}\n", path.display());
        Ok(())
    }
}

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    ctx: AppContext,
    bridge: SessionBridge,
    /// Conversation to continue on the first message
    session: Option<String>,
    task: Mutex<Option<JoinHandle<()>>>,
    closed: Arc<Notify>,
}

impl Repl {
    pub fn new(ctx: AppContext, output: TerminalOutput) -> Self {
        let bridge = SessionBridge::new(ctx.clone(), Arc::new(output));
        Self {
            ctx,
            bridge,
            session: None,
            task: Mutex::new(None),
            closed: Arc::new(Notify::new()),
        }
    }

    /// Continue an existing conversation instead of starting fresh
    pub fn with_session(mut self, session: Option<String>) -> Self {
        self.session = session;
        self
    }

    /// Resolves once the user leaves the REPL
    pub async fn closed(&self) {
        self.closed.notified().await
    }

    /// Read stdin on a plain thread and forward lines.
    ///
    /// A blocked stdin read cannot be cancelled, so it must not live on the
    /// runtime; the thread is simply abandoned at exit.
    fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
        let (tx, rx) = mpsc::channel(16);

        std::thread::Builder::new()
            .name("foreman-stdin".to_string())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.blocking_send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            eprintln!("Error reading input: {}", e);
                            break;
                        }
                    }
                }
            })
            .map_err(|e| ForemanError::channel(format!("failed to spawn stdin reader: {}", e)))?;

        Ok(rx)
    }

    async fn run(bridge: SessionBridge, mut state: ReplState, mut lines: mpsc::Receiver<String>) {
        loop {
            print!("You: ");
            if io::stdout().flush().is_err() {
                break;
            }

            let Some(input) = lines.recv().await else {
                // EOF (Ctrl+D)
                println!("\nGoodbye!");
                break;
            };

            if input.trim().is_empty() {
                continue;
            }

            match handle_command(&input, &mut state) {
                CommandResult::Exit => {
                    println!("\nGoodbye!");
                    break;
                }
                CommandResult::NewConversation => {
                    println!("Started a new conversation.\n");
                }
                CommandResult::Handled(output) => {
                    println!("{}\n", output);
                }
                CommandResult::Continue(text) => {
                    match bridge.on_inbound_text(state.session.as_deref(), &text).await {
                        Ok(id) => state.session = Some(id),
                        Err(e) => eprintln!("\nError: {}\n", e),
                    }
                }
            }
        }
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = &self.ctx.config;

        println!();
        println!("Foreman - assistant with delegating subagents");
        println!("─────────────────────────────────────────────");
        println!("Provider:   {}", config.ai.provider);
        println!("Model:      {}", config.ai.model);
        println!("Subagents:  {}", self.ctx.subagents.ids().join(", "));
        if let Some(session) = &self.session {
            println!("Continuing: {}", session);
        }
        println!();
        println!("Commands: help, new, agents, status, exit");
        println!("─────────────────────────────────────────────");
    }
}

#[async_trait]
impl Channel for Repl {
    fn name(&self) -> &str {
        "terminal"
    }

    async fn validate_configuration(&self) -> bool {
        self.ctx.config.channels.terminal.enabled
    }

    async fn start(&self) -> Result<()> {
        let mut task = self
            .task
            .lock()
            .map_err(|_| ForemanError::channel("terminal task lock poisoned"))?;
        if task.is_some() {
            return Err(ForemanError::channel("terminal channel already started"));
        }

        let lines = Self::spawn_stdin_reader()?;
        self.print_banner();

        let bridge = self.bridge.clone();
        let state = ReplState::new(self.ctx.clone(), self.session.clone());
        let closed = self.closed.clone();
        *task = Some(tokio::spawn(async move {
            Self::run(bridge, state, lines).await;
            closed.notify_one();
        }));

        tracing::debug!("Terminal channel started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let task = self
            .task
            .lock()
            .map_err(|_| ForemanError::channel("terminal task lock poisoned"))?
            .take();

        if let Some(task) = task {
            task.abort();
            self.closed.notify_one();
            tracing::debug!("Terminal channel stopped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::conversation::Conversation;
    use crate::agent::sub_agent::SubAgentRegistry;
    use crate::core::Config;
    use crate::llm::{ChatOptions, ModelProvider, ModelProviderManager};
    use crate::storage::MemoryConversationStore;

    struct Fixed;

    #[async_trait]
    impl ModelProvider for Fixed {
        fn id(&self) -> &str {
            "fixed"
        }

        async fn chat(&self, _: &Conversation, _: &str, _: &ChatOptions) -> Result<String> {
            Ok("4".to_string())
        }
    }

    fn context(store: Arc<MemoryConversationStore>) -> AppContext {
        let mut config = Config::default();
        config.ai.provider = "fixed".to_string();
        let config = Arc::new(config);

        let mut models = ModelProviderManager::new(config.clone());
        models.register_provider(Arc::new(Fixed)).unwrap();
        models.initialize().unwrap();

        AppContext::new(
            config,
            Arc::new(models),
            Arc::new(SubAgentRegistry::default()),
            store,
        )
    }

    async fn run_with(lines: &[&str], close_input: bool) -> Arc<MemoryConversationStore> {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryConversationStore::new());
        let ctx = context(store.clone());
        let bridge = SessionBridge::new(ctx.clone(), Arc::new(TerminalOutput::in_data_dir(dir.path())));

        let (tx, rx) = mpsc::channel(16);
        for line in lines {
            tx.send(line.to_string()).await.unwrap();
        }
        let _keep_open = (!close_input).then_some(tx.clone());
        drop(tx);

        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            Repl::run(bridge, ReplState::new(ctx, None), rx),
        )
        .await
        .unwrap();
        store
    }

    #[tokio::test]
    async fn test_exit_command_ends_loop_with_input_still_open() {
        let store = run_with(&["status", "What's 2+2?", "again", "exit"], false).await;

        // Both messages landed in one conversation
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_input_ends_loop() {
        let store = run_with(&["", "new"], true).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_long_reply_written_to_outbox() {
        let dir = tempfile::tempdir().unwrap();
        let output = TerminalOutput::in_data_dir(dir.path());

        output
            .send_file("conv-1", b"# Plan".to_vec(), "response.md")
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("outbox/conv-1-response.md")).unwrap();
        assert_eq!(written, "# Plan");
    }
}
