//! onechat main binary.

mod commands;
mod config;
mod init;

use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(
    name = "onechat",
    version,
    about = "Send one chat-completion request through a configurable endpoint"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send the configured system message and print the response (default).
    Ask(commands::AskArgs),
    /// Validate configuration and report the resolved endpoint, without a network call.
    Doctor,
    /// Write a commented .env template into the working directory (idempotent).
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv()?;
    init_tracing()?;
    install_panic_hook();

    let cli = Cli::parse();

    let command = if let Some(command) = cli.command {
        command
    } else {
        Command::Ask(commands::AskArgs::default())
    };

    match command {
        Command::Ask(args) => commands::ask(args).await,
        Command::Doctor => commands::doctor(),
        Command::Init => {
            match init::initialize(Path::new(".")).await? {
                init::InitOutcome::Created(path) => {
                    println!("onechat init: wrote {}", path.display());
                    println!("next: set OPENAI_API_KEY in {}", path.display());
                }
                init::InitOutcome::Kept(path) => {
                    println!(
                        "onechat init: {} already exists, left unchanged",
                        path.display()
                    );
                }
            }
            Ok(())
        }
    }
}

/// Load a local `.env` before anything reads the environment. A missing file
/// is fine; a malformed one is not.
fn load_dotenv() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(anyhow::anyhow!("load .env: {e}")),
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new("info,onechat=debug,oc_app=debug,oc_llm=debug"),
    };
    let log_format = std::env::var("ONECHAT_LOG_FORMAT")
        .unwrap_or_else(|_| "pretty".to_string())
        .to_ascii_lowercase();

    // Logs go to stderr; stdout carries only the model's response.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .with_target(true)
                .with_writer(std::io::stderr)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true)
                .init();
        }
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_writer(std::io::stderr)
                .pretty()
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported ONECHAT_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    tracing::debug!(
        log_format = %log_format,
        env_filter = ?std::env::var("RUST_LOG").ok(),
        "tracing initialized"
    );
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_to_string(panic_info.payload());
        tracing::error!(
            panic_location = %location,
            panic_payload = %payload,
            "panic captured"
        );
        default_hook(panic_info);
    }));
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}
