//! Deterministic mock providers for tests and offline demos.

use super::{ChatMessage, CompletionStream, EmbeddingClient, LlmClient, ProviderError, ProviderResult};
use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;

/// What the mock should do for one call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Streamed as the given chunks, in order
    Chunks(Vec<String>),
    Fail(String),
}

type ReplyFn = dyn Fn(&[ChatMessage]) -> MockReply + Send + Sync;

/// Scripted LLM. A reply function inspects the messages (typically the
/// system prompt) and decides what to answer; every call is recorded.
pub struct MockLlm {
    reply: Box<ReplyFn>,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLlm {
    pub fn new(reply: impl Fn(&[ChatMessage]) -> MockReply + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Calls whose system prompt contains the marker.
    pub fn calls_matching(&self, marker: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|messages| messages.iter().any(|m| m.content.contains(marker)))
            .count()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn call(&self, messages: &[ChatMessage], _max_tokens: u32) -> ProviderResult<String> {
        self.calls.lock().push(messages.to_vec());
        match (self.reply)(messages) {
            MockReply::Text(text) => Ok(text),
            MockReply::Chunks(chunks) => Ok(chunks.concat()),
            MockReply::Fail(reason) => Err(ProviderError::Http(reason)),
        }
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        _max_tokens: u32,
    ) -> ProviderResult<CompletionStream> {
        self.calls.lock().push(messages.to_vec());
        match (self.reply)(messages) {
            MockReply::Text(text) => {
                // split into word chunks so tests exercise real interleaving
                let chunks: Vec<ProviderResult<String>> = text
                    .split_inclusive(' ')
                    .map(|piece| Ok(piece.to_string()))
                    .collect();
                Ok(Box::pin(stream::iter(chunks)))
            }
            MockReply::Chunks(chunks) => {
                let items: Vec<ProviderResult<String>> = chunks.into_iter().map(Ok).collect();
                Ok(Box::pin(stream::iter(items)))
            }
            MockReply::Fail(reason) => Err(ProviderError::Http(reason)),
        }
    }
}

/// Deterministic embedder with optional fixed responses for exact texts.
pub struct MockEmbedder {
    fixed: Mutex<Vec<(String, Vec<f32>)>>,
    fallback: super::HashingEmbedder,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            fixed: Mutex::new(Vec::new()),
            fallback: super::HashingEmbedder::new(),
        }
    }

    pub fn with_fixed(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.fixed.lock().push((text.into(), vector));
        self
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbedder {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        if let Some((_, vector)) = self.fixed.lock().iter().find(|(t, _)| t == text) {
            return Ok(vector.clone());
        }
        self.fallback.embed(text).await
    }
}
