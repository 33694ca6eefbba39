//! OpenRouter-compatible LLM backend.
//!
//! Talks to any `/v1/chat/completions` API (OpenRouter, OpenAI, local
//! proxies) with bearer auth, in both single-shot and SSE-streaming modes.

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;

use veritas_common::{Error, Result, Settings};

use crate::provider::{ChatTurn, ChunkReceiver, LlmProvider, LlmResponse, ResponseChunk};

/// OpenRouter-compatible provider.
pub struct OpenRouterProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenRouterProvider {
    /// Create a provider from settings.
    pub fn new(settings: &Settings) -> Self {
        Self::with_base_url(
            &settings.llm.base_url,
            settings.llm.api_key.as_deref(),
            &settings.llm.model,
        )
    }

    /// Create a provider against a specific base URL (used by tests).
    pub fn with_base_url(base_url: &str, api_key: Option<&str>, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(String::from),
            model: model.to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    async fn post_completions(
        &self,
        messages: &[ChatTurn],
        temperature: f64,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature,
            stream,
        };

        let mut builder = self.client.post(self.completions_url()).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Provider(format!("llm request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "llm api error ({}): {}",
                status.as_u16(),
                body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn generate_response(
        &self,
        messages: &[ChatTurn],
        temperature: f64,
    ) -> Result<LlmResponse> {
        let response = self.post_completions(messages, temperature, false).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("failed to parse llm response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("llm returned no choices".into()))?;

        Ok(LlmResponse {
            text: choice.message.content,
            confidence: None,
            created_at: Utc::now(),
            metadata: json!({
                "model": parsed.model,
                "usage": parsed.usage,
            }),
        })
    }

    async fn generate_stream(
        &self,
        messages: &[ChatTurn],
        temperature: f64,
    ) -> Result<ChunkReceiver> {
        let response = self.post_completions(messages, temperature, true).await?;

        let (tx, rx) = mpsc::channel(64);
        let mut byte_stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut buffer = String::new();
            'outer: while let Some(item) = byte_stream.next().await {
                let bytes = match item {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx
                            .send(Err(Error::Provider(format!("llm stream failed: {e}"))))
                            .await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);

                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();

                    if data == "[DONE]" {
                        break 'outer;
                    }

                    match serde_json::from_str::<StreamChunk>(data) {
                        Ok(chunk) => {
                            let text = chunk
                                .choices
                                .first()
                                .and_then(|c| c.delta.content.as_deref())
                                .unwrap_or_default();
                            if !text.is_empty()
                                && tx.send(Ok(ResponseChunk::text(text))).await.is_err()
                            {
                                // Consumer went away; stop decoding.
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "skipping undecodable stream chunk");
                        }
                    }
                }
            }

            let _ = tx.send(Ok(ResponseChunk::terminal())).await;
        });

        Ok(rx)
    }
}
