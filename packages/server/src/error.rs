//! API error shape and HTTP status mapping.

use actix_web::{HttpResponse, http::StatusCode};
use crime_rag_engine::EngineError;
use crime_rag_store::StoreError;
use thiserror::Error;

/// Request-level API failure. Every variant serializes to the same
/// body shape: `{"error": {"kind": ..., "message": ...}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller-supplied argument outside its documented domain.
    #[error("{message}")]
    InvalidParameter {
        /// Human-readable description.
        message: String,
    },

    /// The embedding service failed.
    #[error("{message}")]
    EmbeddingUnavailable {
        /// Human-readable description.
        message: String,
    },

    /// The generative model failed.
    #[error("{message}")]
    ModelUnavailable {
        /// Human-readable description.
        message: String,
    },

    /// An external call exceeded its timeout.
    #[error("{message}")]
    Timeout {
        /// Human-readable description.
        message: String,
    },

    /// Anything else.
    #[error("{message}")]
    Internal {
        /// Human-readable description.
        message: String,
    },
}

impl ApiError {
    const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::EmbeddingUnavailable { .. } => "embedding_unavailable",
            Self::ModelUnavailable { .. } => "model_unavailable",
            Self::Timeout { .. } => "timeout",
            Self::Internal { .. } => "internal",
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidParameter { message } => Self::InvalidParameter { message },
            EngineError::EmbeddingUnavailable { message } => {
                Self::EmbeddingUnavailable { message }
            }
            EngineError::ModelUnavailable { message } => Self::ModelUnavailable { message },
            EngineError::Timeout { .. } => Self::Timeout {
                message: e.to_string(),
            },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Embed(inner) => Self::EmbeddingUnavailable {
                message: inner.to_string(),
            },
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            Self::EmbeddingUnavailable { .. } | Self::ModelUnavailable { .. } => {
                StatusCode::BAD_GATEWAY
            }
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        }))
    }
}
