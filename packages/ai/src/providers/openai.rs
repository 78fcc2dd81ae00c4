//! `OpenAI`-compatible provider implementation.
//!
//! Works against the official `OpenAI` API and any server that speaks the
//! same protocol (Ollama, vLLM, llama.cpp) via `AI_BASE_URL`.

use serde::Serialize;

use crate::{AiError, Embedder, GenerativeModel, retry};

fn authorize(
    builder: reqwest::RequestBuilder,
    api_key: Option<&str>,
) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) => builder.header("Authorization", format!("Bearer {key}")),
        None => builder,
    }
}

/// `OpenAI`-compatible embedding provider.
pub struct OpenAiEmbedder {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    /// Creates a new embedder. `api_key` may be `None` for local servers
    /// that do not require authentication.
    #[must_use]
    pub fn new(api_key: Option<String>, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let request = EmbeddingsRequest {
            model: &self.model,
            input: text,
        };

        let body = retry::send_json(|| {
            authorize(self.client.post(&url), self.api_key.as_deref()).json(&request)
        })
        .await?;

        let values = body["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| AiError::Provider {
                message: "No embedding in OpenAI response".to_string(),
            })?;

        #[allow(clippy::cast_possible_truncation)]
        let vector = values
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| AiError::Provider {
                    message: "Non-numeric embedding value in OpenAI response".to_string(),
                })
            })
            .collect::<Result<Vec<f32>, AiError>>()?;

        if vector.is_empty() {
            return Err(AiError::Provider {
                message: "Empty embedding vector in OpenAI response".to_string(),
            });
        }

        Ok(vector)
    }
}

/// `OpenAI`-compatible chat completion provider.
pub struct OpenAiModel {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiModel {
    /// Creates a new chat provider. `api_key` may be `None` for local
    /// servers that do not require authentication.
    #[must_use]
    pub fn new(api_key: Option<String>, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[async_trait::async_trait]
impl GenerativeModel for OpenAiModel {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: 4096,
        };

        let body = retry::send_json(|| {
            authorize(self.client.post(&url), self.api_key.as_deref()).json(&request)
        })
        .await?;

        let text = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AiError::Provider {
                message: "No choices in OpenAI response".to_string(),
            })?;

        Ok(text.to_string())
    }
}
