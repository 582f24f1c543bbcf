//! Terminal front end for a toolbridge chat session.
//!
//! Reads one line at a time, turns it into a session event and prints the
//! notifications that come back. Backends are listed in a YAML config file;
//! the LLM key comes from the environment (a `.env` file is loaded first).
//!
//! # Examples
//!
//! ```sh
//! toolbridge --provider openai --model gpt-4.1
//! > /servers
//! > /init weather,dataset
//! > what's the weather in Oslo?
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toolbridge_core::bridge::Bridge;
use toolbridge_core::config::{ConfigLevel, ConfigProvider, FileConfigProvider};
use toolbridge_core::engine::{LoopOptions, DEFAULT_MAX_TOOL_ROUNDS};
use toolbridge_core::hub::{ClientEvent, Dispatch, HubResult, Notification, Notifier, SessionHub};
use toolbridge_core::logging::{Logger, TracingLogger};
use toolbridge_core::providers::{create_provider, ProviderModelConfig};
use toolbridge_core::secrets::{EnvSecretStore, SecretStore};

const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_MODEL: &str = "gpt-4.1";

/// Chat with an LLM that can call tools on MCP servers
#[derive(Parser)]
#[command(name = "toolbridge", version)]
struct Cli {
    /// Backend config file (defaults to the workspace file, then the user file)
    #[arg(short, long, env = "TOOLBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// LLM provider (openai, anthropic, ollama, mock, ...)
    #[arg(long, env = "TOOLBRIDGE_PROVIDER")]
    provider: Option<String>,

    /// Model name
    #[arg(short, long, env = "TOOLBRIDGE_MODEL")]
    model: Option<String>,

    /// Override the provider endpoint
    #[arg(long)]
    api_base: Option<String>,

    /// Maximum LLM/tool round trips per message
    #[arg(long)]
    max_tool_rounds: Option<usize>,

    /// Print notifications as JSON lines
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Prints notifications for the single local session
struct TerminalNotifier {
    json: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&self, _session_id: &str, notification: Notification) {
        if self.json {
            match serde_json::to_string(&notification) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("error: {}", e),
            }
            return;
        }

        match notification {
            Notification::Status { message } => println!("· {}", message),
            Notification::Error { message } => eprintln!("error: {}", message),
            Notification::AvailableServers { servers } => {
                if servers.is_empty() {
                    println!("No servers configured.");
                }
                for server in servers {
                    println!("  {:<16} {:<20} {}", server.id, server.display_name(), server.url);
                }
            }
            Notification::McpInitialized { message, .. } => println!("✓ {}", message),
            Notification::NewMessage { text, .. } => println!("\n{}\n", text),
            Notification::ConversationReset => println!("· Conversation cleared."),
        }
    }
}

enum Command {
    Event(ClientEvent),
    Status,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Event(ClientEvent::SendMessage {
            message: line.to_string(),
        }));
    };

    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let command = match name {
        "servers" => Command::Event(ClientEvent::RequestServerList),
        "init" => Command::Event(ClientEvent::Initialize {
            selected_server_ids: args
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect(),
        }),
        "reset" => Command::Event(ClientEvent::ResetConversation),
        "status" => Command::Status,
        "quit" | "exit" => Command::Quit,
        _ => Command::Help,
    };
    Some(command)
}

fn print_help() {
    println!("Commands:");
    println!("  /servers          list configured MCP servers");
    println!("  /init <id,id,..>  connect to the selected servers");
    println!("  /reset            clear the conversation");
    println!("  /status           show the session status");
    println!("  /quit             leave");
    println!("Anything else is sent to the model.");
}

fn resolve_config(cli: &Cli) -> Result<FileConfigProvider> {
    if let Some(path) = &cli.config {
        return Ok(FileConfigProvider::new(path, ConfigLevel::Explicit));
    }
    let cwd = std::env::current_dir().context("reading current directory")?;
    let workspace = FileConfigProvider::workspace(cwd);
    if workspace.exists() {
        Ok(workspace)
    } else {
        Ok(FileConfigProvider::user())
    }
}

/// Log level used when `RUST_LOG` is not set
fn default_log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Wait for the asynchronous part of an event; rejections were already printed
fn settle(result: HubResult<Dispatch>, logger: &dyn Logger) {
    if let Ok(Some(ticket)) = result {
        if let Err(e) = ticket.wait() {
            logger.error(&format!("[toolbridge] Event did not complete: {}", e));
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(cli.verbose)));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new());

    let config = resolve_config(&cli)?;
    logger.info(&format!(
        "[toolbridge] Using {} config at {}",
        config.level().as_str(),
        config.path().display()
    ));
    let defaults = config
        .defaults()
        .with_context(|| format!("loading {}", config.path().display()))?;

    let provider_id = cli
        .provider
        .clone()
        .or(defaults.provider)
        .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
    let model_name = cli
        .model
        .clone()
        .or(defaults.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let max_tool_rounds = cli
        .max_tool_rounds
        .or(defaults.max_tool_rounds)
        .unwrap_or(DEFAULT_MAX_TOOL_ROUNDS);

    let mut model = ProviderModelConfig::new(model_name.clone());
    if let Some(key) = EnvSecretStore::new().get(&provider_id) {
        model = model.with_api_key(key);
    }
    if let Some(base) = &cli.api_base {
        model = model.with_api_base(base.clone());
    }

    let provider = create_provider(&provider_id, Arc::clone(&logger));
    let bridge = Arc::new(Bridge::start(Arc::clone(&logger)).context("starting session worker")?);
    let hub = SessionHub::builder(
        Arc::clone(&bridge),
        Arc::new(config),
        provider,
        Arc::new(TerminalNotifier { json: cli.json }),
    )
    .with_model(model)
    .with_loop_options(LoopOptions::default().with_max_tool_rounds(max_tool_rounds))
    .with_logger(Arc::clone(&logger))
    .build();

    let session_id = format!("cli-{}", std::process::id());
    println!("toolbridge: {} / {} (type /help for commands)", provider_id, model_name);
    settle(hub.handle(&session_id, ClientEvent::Connect), logger.as_ref());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().ok();

        let Some(line) = lines.next() else { break };
        let line = line.context("reading input")?;

        match parse_line(&line) {
            None => continue,
            Some(Command::Quit) => break,
            Some(Command::Help) => print_help(),
            Some(Command::Status) => match hub.status(&session_id) {
                Some(status) => println!("· {}", status),
                None => println!("· no session"),
            },
            Some(Command::Event(event)) => settle(hub.handle(&session_id, event), logger.as_ref()),
        }
    }

    settle(hub.handle(&session_id, ClientEvent::Disconnect), logger.as_ref());
    hub.close_all();
    bridge.shutdown();
    Ok(())
}
