#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collaborator boundary for the crime RAG engine.
//!
//! Defines the [`Embedder`] and [`GenerativeModel`] traits consumed by the
//! store and analysis pipeline, provider implementations for Gemini and any
//! `OpenAI`-compatible endpoint (Ollama, vLLM, llama.cpp) via the
//! `AI_BASE_URL` environment variable, the context builder that turns
//! retrieved records into a bounded prompt, and the defensive parser that
//! extracts structured fields from free-form model output.

pub mod context;
pub mod parse;
pub mod providers;
pub mod retry;

use thiserror::Error;

/// Errors that can occur at the AI collaborator boundary.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error (bad status, unexpected response shape).
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error (missing API key, unknown provider name).
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// Maps arbitrary text into the fixed-dimension embedding space shared
/// with the stored incident records.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a single text.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the embedding service is unreachable or
    /// returns a malformed response.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError>;
}

/// Produces free-form text from a prompt.
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Sends the prompt and returns the model's raw text response.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the model service is unreachable or
    /// returns a malformed response.
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}
