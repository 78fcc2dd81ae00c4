#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The analysis pipeline tying the store, AI boundary, and analytics
//! together.
//!
//! One [`AnalysisEngine::analyze`] call runs the full sequence: embed
//! the query, retrieve similar records from the current snapshot,
//! render them into a prompt, invoke the generative model, and parse
//! its response defensively. The engine also fronts hotspot detection
//! and temporal aggregation so callers see one surface.

use std::sync::Arc;
use std::time::Duration;

use crime_rag_ai::{Embedder, GenerativeModel, context, parse};
use crime_rag_analytics::{AnalyticsError, hotspots, retrieval, temporal};
use crime_rag_models::{
    AnalysisResult, ContextMode, HotspotReport, RecordFilter, TemporalBucket, TemporalDimension,
};
use crime_rag_store::RecordStore;
use thiserror::Error;

/// Request-level failures of the engine.
///
/// Malformed model output is deliberately absent: the parser always
/// produces a result with sentinel defaults instead of failing.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A caller-supplied argument is outside its documented domain.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Which parameter and why.
        message: String,
    },

    /// The embedding service is unreachable or erroring.
    #[error("embedding service unavailable: {message}")]
    EmbeddingUnavailable {
        /// Underlying provider failure.
        message: String,
    },

    /// The generative model is unreachable or erroring.
    #[error("generative model unavailable: {message}")]
    ModelUnavailable {
        /// Underlying provider failure.
        message: String,
    },

    /// An external call exceeded the configured timeout.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Which call timed out.
        operation: &'static str,
        /// The configured timeout.
        seconds: u64,
    },
}

impl From<AnalyticsError> for EngineError {
    fn from(e: AnalyticsError) -> Self {
        match e {
            AnalyticsError::InvalidParameter { message } => Self::InvalidParameter { message },
        }
    }
}

/// The process-wide analysis engine.
pub struct AnalysisEngine {
    store: Arc<RecordStore>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn GenerativeModel>,
    timeout: Duration,
}

impl AnalysisEngine {
    /// Creates an engine over the given store and AI collaborators.
    /// `timeout` bounds each external call (embedding, generation)
    /// individually.
    #[must_use]
    pub fn new(
        store: Arc<RecordStore>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn GenerativeModel>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            embedder,
            model,
            timeout,
        }
    }

    /// The record store backing this engine.
    #[must_use]
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Runs one full analysis: embed, retrieve, prompt, generate,
    /// parse.
    ///
    /// Parameters are validated before any external call. An empty
    /// corpus is not an error; the model is asked to analyze with no
    /// historical evidence and the result carries zero matches.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the query is blank, `n_results` is
    /// zero, or an external call fails or times out. Malformed model
    /// output is not an error; see [`AnalysisResult::defaulted_fields`].
    pub async fn analyze(
        &self,
        query: &str,
        mode: ContextMode,
        n_results: usize,
    ) -> Result<AnalysisResult, EngineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EngineError::InvalidParameter {
                message: "query must not be blank".to_string(),
            });
        }
        if n_results == 0 {
            return Err(EngineError::InvalidParameter {
                message: "n_results must be >= 1".to_string(),
            });
        }

        let snapshot = self.store.snapshot().await;

        let query_vector = tokio::time::timeout(self.timeout, self.embedder.embed(query))
            .await
            .map_err(|_| EngineError::Timeout {
                operation: "embedding",
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| EngineError::EmbeddingUnavailable {
                message: e.to_string(),
            })?;

        let matches = retrieval::retrieve(&query_vector, &snapshot, n_results)?;
        log::debug!("retrieved {} matches for analysis", matches.len());

        let rendered = context::build_context(&matches, mode);
        let prompt = context::build_prompt(query, &rendered);

        let raw_response = tokio::time::timeout(self.timeout, self.model.generate(&prompt))
            .await
            .map_err(|_| EngineError::Timeout {
                operation: "model invocation",
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| EngineError::ModelUnavailable {
                message: e.to_string(),
            })?;

        let parsed = parse::parse_response(&raw_response);

        Ok(AnalysisResult {
            query: query.to_string(),
            crime_probability: parsed.crime_probability,
            distribution: parsed.distribution,
            key_factors: parsed.key_factors,
            risk_level: parsed.risk_level,
            matches,
            raw_response,
            defaulted_fields: parsed.defaulted_fields,
        })
    }

    /// Detects geographic hotspots over the (optionally filtered)
    /// current corpus.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] if `eps` or
    /// `min_samples` is out of range.
    pub async fn hotspots(
        &self,
        eps: f64,
        min_samples: usize,
        filter: &RecordFilter,
    ) -> Result<HotspotReport, EngineError> {
        let snapshot = self.store.snapshot().await;
        let records = snapshot.filtered(filter);
        Ok(hotspots::detect(&records, eps, min_samples)?)
    }

    /// Aggregates the (optionally filtered) current corpus over a
    /// calendar dimension.
    pub async fn temporal_patterns(
        &self,
        dimension: TemporalDimension,
        filter: &RecordFilter,
    ) -> Vec<TemporalBucket> {
        let snapshot = self.store.snapshot().await;
        let records = snapshot.filtered(filter);
        temporal::aggregate(&records, dimension)
    }
}
