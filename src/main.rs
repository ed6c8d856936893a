//! Foreman - conversational assistant with delegating subagents
//!
//! Main entry point for the CLI application.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use foreman::{Application, Config, Repl, SessionBridge, TerminalOutput};

/// Foreman - conversational assistant with delegating subagents
#[derive(Parser, Debug)]
#[command(name = "foreman")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data directory holding config.toml, agents.toml and conversations
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Model provider to use (openrouter, ollama)
    #[arg(long)]
    provider: Option<String>,

    /// Model for the assistant
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Continue an existing conversation
    #[arg(long, short = 's')]
    session: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug, args.log_format);

    let data_dir = args.data_dir.unwrap_or_else(Config::default_data_dir);

    // Build configuration
    let mut config = Config::load(&data_dir)?;

    // Apply CLI overrides
    if let Some(provider) = args.provider {
        config.ai.provider = provider;
    }
    if let Some(model) = args.model {
        config.ai.model = model;
    }
    config.validate()?;

    let mut app = Application::bootstrap(data_dir.clone(), config).await?;
    let output = TerminalOutput::in_data_dir(&data_dir);

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let bridge = SessionBridge::new(app.context().clone(), Arc::new(output));
        let conversation_id = bridge
            .on_inbound_text(args.session.as_deref(), &prompt)
            .await?;
        eprintln!("Conversation: {}", conversation_id);
        return Ok(());
    }

    // Interactive REPL mode
    let repl = Arc::new(Repl::new(app.context().clone(), output).with_session(args.session));
    app.add_channel(repl.clone());
    app.start().await?;

    tokio::select! {
        _ = repl.closed() => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted.");
        }
    }

    app.stop().await?;
    Ok(())
}

/// Initialize tracing subscriber with environment filter.
///
/// Logs go to stderr so they never interleave with replies on stdout.
fn init_tracing(debug: bool, format: LogFormat) {
    let env_filter = if debug {
        EnvFilter::new("foreman=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("foreman=info"))
    };

    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}
