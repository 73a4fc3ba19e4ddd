use crate::error::{LlmError, Result};
use crate::types::{ChatMessage, ChatResponse, StreamChunk, Usage};
use crate::wire::{self, SseEvent};
use futures_util::Stream;
use futures_util::StreamExt;
use std::pin::Pin;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// One-shot chat-completion client. The base URL may point at a proxy in
/// front of the default API host; the credential is passed through as a
/// bearer token either way.
#[derive(Clone, Debug)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: Option<f32>,
}

impl LlmClient {
    #[tracing::instrument(level = "debug", skip_all, fields(model = %model, base_url = %base_url))]
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(%e, "reqwest client build failed; falling back to default client");
                reqwest::Client::new()
            });
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url,
            temperature: None,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send the messages and return the first choice of the response.
    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse> {
        let req = wire::ChatCompletionsRequest::new(&self.model, messages, self.temperature, false);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Http(format!("chat status={status} body={body}")));
        }

        let parsed: wire::ChatCompletionsResponse = serde_json::from_str(&body)?;
        parsed.try_into()
    }

    /// Same single request with `stream: true`, decoded into content deltas
    /// followed by a final `Done` chunk carrying usage totals.
    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    pub async fn chat_stream(
        &self,
        messages: &[ChatMessage],
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>> {
        let req = wire::ChatCompletionsRequest::new(&self.model, messages, self.temperature, true);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http(format!(
                "stream status={status} body={body}"
            )));
        }

        let sse = Box::pin(wire::decode_sse(response.bytes_stream()));

        let stream = futures_util::stream::unfold(
            (sse, None::<Usage>),
            |(mut sse, mut usage)| async move {
                loop {
                    let next = sse.as_mut().next().await?;
                    match next {
                        Ok(SseEvent::Data(data)) => {
                            if data.trim() == "[DONE]" {
                                let usage = usage.take().unwrap_or_default();
                                return Some((Ok(StreamChunk::Done { usage }), (sse, None)));
                            }

                            let mut chunk: wire::ChatCompletionsChunk =
                                match serde_json::from_str(&data) {
                                    Ok(v) => v,
                                    Err(e) => {
                                        return Some((
                                            Err(LlmError::StreamParse(format!(
                                                "chunk json error={e} data={data}"
                                            ))),
                                            (sse, usage),
                                        ));
                                    }
                                };

                            if let Some(u) = chunk.usage() {
                                usage = Some(u);
                            }
                            if let Some(content) = chunk.content() {
                                return Some((
                                    Ok(StreamChunk::Delta {
                                        content: content.to_string(),
                                    }),
                                    (sse, usage),
                                ));
                            }
                        }
                        Ok(SseEvent::Other) => continue,
                        Err(e) => return Some((Err(e), (sse, usage))),
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim();
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(LlmError::InvalidInput(format!(
            "base URL must start with http:// or https://, got {trimmed:?}"
        )));
    }
    let normalized = trimmed.trim_end_matches('/');
    if normalized.split_once("://").is_none_or(|(_, rest)| rest.is_empty()) {
        return Err(LlmError::InvalidInput(format!(
            "base URL has no host: {trimmed:?}"
        )));
    }
    Ok(normalized.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slashes_are_trimmed() {
        let client =
            LlmClient::new("sk-test", "gpt-4", "https://proxy.example.com/v1/").expect("valid url");
        assert_eq!(client.base_url(), "https://proxy.example.com/v1");
        assert_eq!(
            client.endpoint(),
            "https://proxy.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn default_base_url_joins_cleanly() {
        let client = LlmClient::new("sk-test", "gpt-4", DEFAULT_BASE_URL).expect("valid url");
        assert_eq!(
            client.endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = LlmClient::new("sk-test", "gpt-4", "ftp://proxy.example.com")
            .expect_err("scheme must be http(s)");
        assert!(matches!(err, LlmError::InvalidInput(_)));

        let err = LlmClient::new("sk-test", "gpt-4", "https:///").expect_err("host required");
        assert!(matches!(err, LlmError::InvalidInput(_)));
    }

    #[test]
    fn temperature_is_optional() {
        let client = LlmClient::new("sk-test", "gpt-4", DEFAULT_BASE_URL).expect("valid url");
        assert!(client.temperature.is_none());
        let client = client.with_temperature(0.1);
        assert_eq!(client.temperature, Some(0.1));
    }
}
