//! One-shot command implementations for onechat.

use crate::config::AppConfig;
use anyhow::Result;
use clap::Args;
use futures_util::StreamExt;
use oc_llm::{ChatMessage, LlmClient, StreamChunk};
use std::io::Write;

#[derive(Debug, Clone, Default, Args)]
pub struct AskArgs {
    /// Optional user message sent after the system message.
    pub message: Option<String>,
    /// Model id to request.
    #[arg(long)]
    pub model: Option<String>,
    /// Chat-completions base URL, e.g. a proxy endpoint.
    #[arg(long)]
    pub base_url: Option<String>,
    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f32>,
    /// System message text.
    #[arg(long)]
    pub system: Option<String>,
    /// Print response deltas as they arrive instead of the whole response.
    #[arg(long)]
    pub stream: bool,
}

pub async fn ask(args: AskArgs) -> Result<()> {
    let cfg = load_config(&args)?;
    tracing::info!(
        project = %cfg.project,
        model = %cfg.model,
        base_url = %cfg.base_url,
        stream = args.stream,
        "sending chat completion"
    );

    let client =
        LlmClient::new(&cfg.api_key, &cfg.model, &cfg.base_url)?.with_temperature(cfg.temperature);

    let mut messages = vec![ChatMessage::system(&cfg.system_prompt)];
    if let Some(message) = args.message.as_deref() {
        messages.push(ChatMessage::user(message));
    }

    if args.stream {
        return print_streamed(&client, &messages).await;
    }

    let response = client.chat(&messages).await?;
    tracing::debug!(
        prompt_tokens = response.usage.prompt_tokens,
        completion_tokens = response.usage.completion_tokens,
        finish_reason = %response.finish_reason,
        "chat completion finished"
    );
    println!("{}", response.message.content);
    Ok(())
}

async fn print_streamed(client: &LlmClient, messages: &[ChatMessage]) -> Result<()> {
    let mut stream = client.chat_stream(messages).await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        match chunk? {
            StreamChunk::Delta { content } => {
                write!(stdout, "{content}")?;
                stdout.flush()?;
            }
            StreamChunk::Done { usage } => {
                tracing::debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "stream finished"
                );
            }
        }
    }
    writeln!(stdout)?;
    Ok(())
}

pub fn doctor() -> Result<()> {
    let cfg = AppConfig::from_env()?;
    cfg.validate()?;
    tracing::info!(
        project = %cfg.project,
        model = %cfg.model,
        base_url = %cfg.base_url,
        temperature = cfg.temperature,
        "config ok"
    );
    Ok(())
}

fn load_config(args: &AskArgs) -> Result<AppConfig> {
    let cfg = apply_overrides(AppConfig::from_env()?, args);
    cfg.validate()?;
    Ok(cfg)
}

fn apply_overrides(mut cfg: AppConfig, args: &AskArgs) -> AppConfig {
    if let Some(model) = &args.model {
        cfg.model = model.clone();
    }
    if let Some(base_url) = &args.base_url {
        cfg.base_url = base_url.clone();
    }
    if let Some(temperature) = args.temperature {
        cfg.temperature = temperature;
    }
    if let Some(system) = &args.system {
        cfg.system_prompt = system.clone();
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config_values() {
        let cfg = AppConfig {
            api_key: "sk-test".to_string(),
            ..AppConfig::default()
        };
        let args = AskArgs {
            message: None,
            model: Some("gpt-4o-mini".to_string()),
            base_url: Some("https://proxy.example.com/v1".to_string()),
            temperature: Some(0.9),
            system: Some("answer briefly".to_string()),
            stream: false,
        };

        let cfg = apply_overrides(cfg, &args);
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.base_url, "https://proxy.example.com/v1");
        assert_eq!(cfg.temperature, 0.9);
        assert_eq!(cfg.system_prompt, "answer briefly");
        assert_eq!(cfg.api_key, "sk-test", "key is untouched by flags");
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let cfg = AppConfig {
            api_key: "sk-test".to_string(),
            ..AppConfig::default()
        };
        let before = cfg.clone();
        let cfg = apply_overrides(cfg, &AskArgs::default());

        assert_eq!(cfg.model, before.model);
        assert_eq!(cfg.base_url, before.base_url);
        assert_eq!(cfg.temperature, before.temperature);
        assert_eq!(cfg.system_prompt, before.system_prompt);
    }
}
