//! HTTP handler functions for the crime analysis API.

use std::str::FromStr as _;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use crime_rag_models::{ContextMode, RecordFilter, TemporalDimension};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// `POST /api/analyze` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Free-text situation description.
    pub query: String,
    /// `full_context` (default) or `summary`.
    pub context_type: Option<String>,
    /// How many similar records to retrieve, default 5.
    pub n_results: Option<usize>,
}

/// `GET /api/hotspots` query parameters.
///
/// Filter fields are repeated per endpoint rather than `serde(flatten)`ed
/// because url-encoded deserialization cannot parse numeric fields
/// through a flatten.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotParams {
    /// Neighborhood radius in coordinate degrees, default 0.005.
    pub eps: Option<f64>,
    /// Minimum points (including the point itself) for a core point,
    /// default 5.
    pub min_samples: Option<usize>,
    /// Earliest date, inclusive, `YYYY-MM-DD`.
    pub date_from: Option<NaiveDate>,
    /// Latest date, inclusive, `YYYY-MM-DD`.
    pub date_to: Option<NaiveDate>,
    /// Exact crime type, case-insensitive.
    pub crime_type: Option<String>,
    /// Exact neighborhood label, case-insensitive.
    pub neighborhood: Option<String>,
}

impl HotspotParams {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            crime_type: self.crime_type.clone(),
            neighborhood: self.neighborhood.clone(),
        }
    }
}

/// `GET /api/temporal-patterns` query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalParams {
    /// `month` (default), `dayOfWeek`, or `timeOfDay`.
    pub dimension: Option<String>,
    /// Earliest date, inclusive, `YYYY-MM-DD`.
    pub date_from: Option<NaiveDate>,
    /// Latest date, inclusive, `YYYY-MM-DD`.
    pub date_to: Option<NaiveDate>,
    /// Exact crime type, case-insensitive.
    pub crime_type: Option<String>,
    /// Exact neighborhood label, case-insensitive.
    pub neighborhood: Option<String>,
}

impl TemporalParams {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            crime_type: self.crime_type.clone(),
            neighborhood: self.neighborhood.clone(),
        }
    }
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.engine.store().snapshot().await;
    HttpResponse::Ok().json(serde_json::json!({
        "healthy": true,
        "version": env!("CARGO_PKG_VERSION"),
        "records": snapshot.len(),
    }))
}

/// `POST /api/analyze`
///
/// Runs the full retrieval-and-analysis pipeline for a query.
pub async fn analyze(
    state: web::Data<AppState>,
    body: web::Json<AnalyzeRequest>,
) -> Result<HttpResponse, ApiError> {
    let mode = match body.context_type.as_deref() {
        None => ContextMode::FullContext,
        Some(raw) => ContextMode::from_str(raw).map_err(|_| ApiError::InvalidParameter {
            message: format!("unknown contextType '{raw}', use full_context or summary"),
        })?,
    };
    let n_results = body.n_results.unwrap_or(5);

    let result = state.engine.analyze(&body.query, mode, n_results).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// `GET /api/hotspots`
///
/// Density-clusters the (optionally filtered) corpus coordinates.
pub async fn hotspots(
    state: web::Data<AppState>,
    params: web::Query<HotspotParams>,
) -> Result<HttpResponse, ApiError> {
    let eps = params.eps.unwrap_or(0.005);
    let min_samples = params.min_samples.unwrap_or(5);

    let report = state
        .engine
        .hotspots(eps, min_samples, &params.filter())
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

/// `GET /api/temporal-patterns`
///
/// Aggregates the (optionally filtered) corpus over a calendar
/// dimension.
pub async fn temporal_patterns(
    state: web::Data<AppState>,
    params: web::Query<TemporalParams>,
) -> Result<HttpResponse, ApiError> {
    let dimension = match params.dimension.as_deref() {
        None => TemporalDimension::Month,
        Some(raw) => {
            TemporalDimension::from_str(raw).map_err(|_| ApiError::InvalidParameter {
                message: format!(
                    "unknown dimension '{raw}', use month, dayOfWeek, or timeOfDay"
                ),
            })?
        }
    };

    let buckets = state
        .engine
        .temporal_patterns(dimension, &params.filter())
        .await;
    Ok(HttpResponse::Ok().json(buckets))
}

/// `POST /api/reload`
///
/// Re-ingests the corpus CSV and swaps the snapshot atomically. A
/// failed reload leaves the previous corpus serving.
pub async fn reload(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state
        .engine
        .store()
        .load_csv(&state.data_path, state.embedder.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "loaded": report.loaded,
        "skipped": report.skipped,
        "errors": report.errors,
    })))
}
