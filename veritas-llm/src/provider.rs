//! Provider trait for LLM backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use veritas_common::Result;

/// Role of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of an LLM transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    /// A system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A complete response from a single-shot generation.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    /// Provider-reported confidence, when available.
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

impl LlmResponse {
    /// Wrap raw text with empty metadata.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            created_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// One chunk of a streaming generation.
///
/// A stream is terminated by exactly one chunk with `is_complete == true`
/// and empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseChunk {
    pub text: String,
    pub is_complete: bool,
}

impl ResponseChunk {
    /// A content chunk.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_complete: false,
        }
    }

    /// The terminal chunk.
    pub fn terminal() -> Self {
        Self {
            text: String::new(),
            is_complete: true,
        }
    }
}

/// Receiver side of a streaming generation.
pub type ChunkReceiver = mpsc::Receiver<Result<ResponseChunk>>;

/// LLM provider trait.
///
/// Implementations handle authentication, request formatting, and
/// response parsing for specific LLM APIs.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Generate a complete response for a transcript.
    async fn generate_response(
        &self,
        messages: &[ChatTurn],
        temperature: f64,
    ) -> Result<LlmResponse>;

    /// Generate a streaming response for a transcript.
    ///
    /// The returned channel yields content chunks and is closed after one
    /// terminal chunk (`is_complete == true`, empty text). Transport
    /// failures mid-stream surface as `Err` items.
    async fn generate_stream(&self, messages: &[ChatTurn], temperature: f64)
        -> Result<ChunkReceiver>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate_response(
            &self,
            messages: &[ChatTurn],
            _temperature: f64,
        ) -> Result<LlmResponse> {
            let last = messages.last().map(|t| t.content.clone()).unwrap_or_default();
            Ok(LlmResponse::from_text(format!("Echo: {last}")))
        }

        async fn generate_stream(
            &self,
            messages: &[ChatTurn],
            _temperature: f64,
        ) -> Result<ChunkReceiver> {
            let (tx, rx) = mpsc::channel(8);
            let last = messages.last().map(|t| t.content.clone()).unwrap_or_default();
            tokio::spawn(async move {
                for word in last.split_whitespace() {
                    let _ = tx.send(Ok(ResponseChunk::text(word))).await;
                }
                let _ = tx.send(Ok(ResponseChunk::terminal())).await;
            });
            Ok(rx)
        }
    }

    #[tokio::test]
    async fn echo_provider_single_shot() {
        let provider = EchoProvider;
        let response = provider
            .generate_response(&[ChatTurn::user("hello")], 0.7)
            .await
            .unwrap();
        assert_eq!(response.text, "Echo: hello");
        assert!(response.confidence.is_none());
    }

    #[tokio::test]
    async fn echo_provider_stream_terminates_once() {
        let provider = EchoProvider;
        let mut rx = provider
            .generate_stream(&[ChatTurn::user("one two")], 0.7)
            .await
            .unwrap();

        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk.unwrap());
        }
        assert_eq!(chunks.len(), 3);
        assert!(chunks[..2].iter().all(|c| !c.is_complete));
        assert_eq!(chunks[2], ResponseChunk::terminal());
    }

    #[test]
    fn chat_turn_serializes_lowercase_roles() {
        let json = serde_json::to_value(ChatTurn::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }
}
