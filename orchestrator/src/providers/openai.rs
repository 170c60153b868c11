//! OpenAI-compatible chat client over reqwest, with SSE streaming.

use super::{ChatMessage, CompletionStream, LlmClient, ProviderError, ProviderResult};
use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub struct OpenAiLlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiLlmClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Reads `OPENAI_API_KEY`, `OPENAI_API_BASE`, and `LOREWEAVE_LLM_MODEL`.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::Http("OPENAI_API_KEY not set".to_string()))?;
        let base_url = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model =
            std::env::var("LOREWEAVE_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        Ok(Self::new(base_url, api_key, model))
    }

    fn request_body(&self, messages: &[ChatMessage], max_tokens: u32, stream: bool) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": max_tokens,
            "stream": stream,
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkResponse {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAiLlmClient {
    async fn call(&self, messages: &[ChatMessage], max_tokens: u32) -> ProviderResult<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(messages, max_tokens, false))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Http(format!(
                "chat completion returned {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("no completion choice".to_string()))
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> ProviderResult<CompletionStream> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(messages, max_tokens, true))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Http(format!(
                "chat stream returned {}",
                response.status()
            )));
        }

        let mut bytes = response.bytes_stream();

        let chunks = stream! {
            let mut buffer = String::new();

            while let Some(piece) = bytes.next().await {
                let piece = match piece {
                    Ok(p) => p,
                    Err(e) => {
                        yield Err(ProviderError::Stream(e.to_string()));
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&piece));

                // SSE frames are newline-delimited `data: {...}` lines
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);

                    let Some(payload) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if payload == "[DONE]" {
                        return;
                    }
                    match serde_json::from_str::<ChunkResponse>(payload) {
                        Ok(chunk) => {
                            if let Some(content) = chunk
                                .choices
                                .into_iter()
                                .next()
                                .and_then(|c| c.delta.content)
                            {
                                if !content.is_empty() {
                                    yield Ok(content);
                                }
                            }
                        }
                        Err(e) => {
                            debug!("Skipping undecodable SSE frame: {}", e);
                        }
                    }
                }
            }
        };

        Ok(Box::pin(chunks))
    }
}
