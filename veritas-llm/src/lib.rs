//! LLM client for the Veritas fact-checking services.
//!
//! Defines the `LlmProvider` trait (single-shot and streaming generation),
//! the `ChatTurn` transcript type, the prompt templates used by the
//! orchestrator, and an OpenRouter-compatible `reqwest` backend.

pub mod openrouter;
pub mod prompts;
pub mod provider;

pub use openrouter::OpenRouterProvider;
pub use provider::{ChatTurn, ChunkReceiver, LlmProvider, LlmResponse, ResponseChunk, Role};
