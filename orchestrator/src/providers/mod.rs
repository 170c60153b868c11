//! Provider contracts: the chat LLM and the embedding model.
//!
//! The engine only ever sees these traits; concrete clients (OpenAI-
//! compatible HTTP, local hashing embedder, test mocks) plug in behind
//! them.

pub mod embedding;
pub mod mock;
pub mod openai;

pub use embedding::{CachedEmbedder, HashingEmbedder, OpenAiEmbeddingClient};
pub use mock::{MockEmbedder, MockLlm, MockReply};
pub use openai::OpenAiLlmClient;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Provider returned malformed payload: {0}")]
    Malformed(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Timed out")]
    Timeout,
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// One chat turn sent to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chunks of a streamed completion.
pub type CompletionStream = BoxStream<'static, ProviderResult<String>>;

/// Plain-text chat completion provider. No JSON mode, no tool calling;
/// the orchestrator repairs JSON itself when needed.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One-shot completion.
    async fn call(&self, messages: &[ChatMessage], max_tokens: u32) -> ProviderResult<String>;

    /// Streaming completion; chunks arrive in model order.
    async fn stream(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> ProviderResult<CompletionStream>;
}

/// Text embedding provider. Must be deterministic for caching.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>>;
}
