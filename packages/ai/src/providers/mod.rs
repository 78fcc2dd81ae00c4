//! Embedding and generative-model provider implementations.
//!
//! Supports Google Gemini and any `OpenAI`-compatible server via a common
//! pair of traits.

pub mod gemini;
pub mod openai;

use std::sync::Arc;

use crate::{AiError, Embedder, GenerativeModel};

/// Creates a generative-model provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `GEMINI_API_KEY` set -> Gemini
/// 2. `OPENAI_API_KEY` or `AI_BASE_URL` set -> `OpenAI`-compatible
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_model_from_env() -> Result<Arc<dyn GenerativeModel>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());

    match provider.to_lowercase().as_str() {
        "gemini" | "google" => {
            let api_key = gemini_api_key()?;
            let model =
                std::env::var("AI_MODEL").unwrap_or_else(|_| "gemini-1.5-pro".to_string());
            Ok(Arc::new(gemini::GeminiModel::new(api_key, model)))
        }
        "openai" | "gpt" => {
            let model = std::env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
            Ok(Arc::new(openai::OpenAiModel::new(
                openai_api_key(),
                openai_base_url(),
                model,
            )))
        }
        other => Err(AiError::Config {
            message: format!("Unknown AI provider: {other}. Use 'gemini' or 'openai'."),
        }),
    }
}

/// Creates an embedding provider based on environment variables.
///
/// Provider selection follows the same rules as [`create_model_from_env`];
/// the model name comes from `EMBEDDING_MODEL` with a per-provider default.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_embedder_from_env() -> Result<Arc<dyn Embedder>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());

    match provider.to_lowercase().as_str() {
        "gemini" | "google" => {
            let api_key = gemini_api_key()?;
            let model = std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-004".to_string());
            Ok(Arc::new(gemini::GeminiEmbedder::new(api_key, model)))
        }
        "openai" | "gpt" => {
            let model = std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string());
            Ok(Arc::new(openai::OpenAiEmbedder::new(
                openai_api_key(),
                openai_base_url(),
                model,
            )))
        }
        other => Err(AiError::Config {
            message: format!("Unknown AI provider: {other}. Use 'gemini' or 'openai'."),
        }),
    }
}

fn gemini_api_key() -> Result<String, AiError> {
    std::env::var("GEMINI_API_KEY").map_err(|_| AiError::Config {
        message: "GEMINI_API_KEY environment variable not set".to_string(),
    })
}

/// `OpenAI`-compatible servers (Ollama, vLLM, llama.cpp) often need no key.
fn openai_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok()
}

fn openai_base_url() -> String {
    std::env::var("AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com".to_string())
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name string that matches the arms in
/// [`create_model_from_env`].
fn detect_provider() -> String {
    if std::env::var("GEMINI_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Gemini (GEMINI_API_KEY found)");
        return "gemini".to_string();
    }

    if std::env::var("OPENAI_API_KEY").is_ok() || std::env::var("AI_BASE_URL").is_ok() {
        log::info!("Auto-detected AI provider: OpenAI-compatible");
        return "openai".to_string();
    }

    log::warn!(
        "No AI credentials detected. Set GEMINI_API_KEY, OPENAI_API_KEY, or \
         AI_BASE_URL. You can also set AI_PROVIDER explicitly."
    );

    // Fall back to gemini, which will produce a clear error about the missing key
    "gemini".to_string()
}
