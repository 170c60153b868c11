//! Embedding providers: OpenAI-compatible HTTP, a deterministic local
//! hashing embedder, and an LRU cache wrapper usable over either.

use super::{EmbeddingClient, ProviderError, ProviderResult};
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use query_router::embedder::LocalEmbedder;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub struct OpenAiEmbeddingClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddingClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "model": self.model, "input": text }))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Http(format!(
                "embedding request returned {}",
                response.status()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::Malformed("no embedding returned".to_string()))
    }
}

/// Offline fallback: the same deterministic feature-hashing embedder the
/// local router uses, exposed through the provider trait.
#[derive(Default)]
pub struct HashingEmbedder {
    inner: LocalEmbedder,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self {
            inner: LocalEmbedder::new(),
        }
    }
}

#[async_trait]
impl EmbeddingClient for HashingEmbedder {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        Ok(self.inner.embed(text))
    }
}

/// LRU cache over any embedding client. Sound because providers are
/// required to be deterministic.
pub struct CachedEmbedder {
    inner: Arc<dyn EmbeddingClient>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingClient>, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).expect("nonzero capacity"),
            )),
        }
    }
}

#[async_trait]
impl EmbeddingClient for CachedEmbedder {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        if let Some(cached) = self.cache.lock().get(text) {
            return Ok(cached.clone());
        }
        let vector = self.inner.embed(text).await?;
        self.cache.lock().put(text.to_string(), vector.clone());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingClient for CountingEmbedder {
        async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32])
        }
    }

    #[tokio::test]
    async fn cache_avoids_repeat_provider_calls() {
        let counting = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedEmbedder::new(counting.clone(), 10);

        cached.embed("grappling").await.unwrap();
        cached.embed("grappling").await.unwrap();

        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hashing_embedder_is_deterministic() {
        let embedder = HashingEmbedder::new();
        let a = embedder.embed("what's my AC").await.unwrap();
        let b = embedder.embed("what's my AC").await.unwrap();
        assert_eq!(a, b);
    }
}
