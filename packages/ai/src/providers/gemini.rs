//! Google Gemini provider implementation.
//!
//! Uses the `generativelanguage.googleapis.com` REST API for both
//! embeddings (`:embedContent`) and text generation (`:generateContent`).

use serde::Serialize;

use crate::{AiError, Embedder, GenerativeModel, retry};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini embedding provider.
pub struct GeminiEmbedder {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiEmbedder {
    /// Creates a new Gemini embedder for the given model.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[async_trait::async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let url = format!(
            "{API_BASE}/models/{}:embedContent?key={}",
            self.model, self.api_key
        );
        let request = EmbedRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: vec![Part { text }],
            },
        };

        let body = retry::send_json(|| self.client.post(&url).json(&request)).await?;

        let values = body["embedding"]["values"]
            .as_array()
            .ok_or_else(|| AiError::Provider {
                message: "No embedding values in Gemini response".to_string(),
            })?;

        #[allow(clippy::cast_possible_truncation)]
        let vector = values
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| AiError::Provider {
                    message: "Non-numeric embedding value in Gemini response".to_string(),
                })
            })
            .collect::<Result<Vec<f32>, AiError>>()?;

        if vector.is_empty() {
            return Err(AiError::Provider {
                message: "Empty embedding vector in Gemini response".to_string(),
            });
        }

        Ok(vector)
    }
}

/// Gemini text generation provider.
pub struct GeminiModel {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiModel {
    /// Creates a new Gemini generation provider for the given model.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[async_trait::async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!(
            "{API_BASE}/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let body = retry::send_json(|| self.client.post(&url).json(&request)).await?;

        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| AiError::Provider {
                message: "No text candidate in Gemini response".to_string(),
            })?;

        Ok(text.to_string())
    }
}
