#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime analysis engine.
//!
//! Exposes retrieval-augmented analysis (`POST /api/analyze`), hotspot
//! detection (`GET /api/hotspots`), temporal aggregation
//! (`GET /api/temporal-patterns`), a health probe, and a corpus reload
//! endpoint. The corpus is loaded from CSV at startup and embedded via
//! the configured provider.

mod error;
mod handlers;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use crime_rag_ai::{Embedder, providers};
use crime_rag_engine::AnalysisEngine;
use crime_rag_store::RecordStore;

/// Shared application state.
pub struct AppState {
    /// The analysis engine fronting the store and AI collaborators.
    pub engine: Arc<AnalysisEngine>,
    /// Embedder handle kept for corpus reloads.
    pub embedder: Arc<dyn Embedder>,
    /// Path the corpus is (re)loaded from.
    pub data_path: PathBuf,
}

/// Starts the crime analysis API server.
///
/// Reads configuration from the environment: `CRIME_RAG_DATA` (corpus
/// CSV path, default `data/crime_data.csv`), `AI_TIMEOUT_SECS` (per
/// external call, default 30), `BIND_ADDR` and `PORT`, plus the
/// provider variables documented in [`crime_rag_ai::providers`]. This
/// is a regular async function; the caller provides the runtime (e.g.
/// via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
///
/// # Panics
///
/// Panics if no AI provider is configured or the corpus CSV cannot be
/// loaded.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let embedder = providers::create_embedder_from_env().expect("Failed to configure embedder");
    let model = providers::create_model_from_env().expect("Failed to configure generative model");

    let data_path = PathBuf::from(
        std::env::var("CRIME_RAG_DATA").unwrap_or_else(|_| "data/crime_data.csv".to_string()),
    );
    let timeout = Duration::from_secs(
        std::env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(30),
    );

    let store = Arc::new(RecordStore::new());
    let report = store
        .load_csv(&data_path, embedder.as_ref())
        .await
        .expect("Failed to load corpus");
    log::info!(
        "corpus ready: {} records ({} rows skipped)",
        report.loaded,
        report.skipped
    );

    let engine = Arc::new(AnalysisEngine::new(
        store,
        embedder.clone(),
        model,
        timeout,
    ));
    let state = web::Data::new(AppState {
        engine,
        embedder,
        data_path,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/analyze", web::post().to(handlers::analyze))
                    .route("/hotspots", web::get().to(handlers::hotspots))
                    .route(
                        "/temporal-patterns",
                        web::get().to(handlers::temporal_patterns),
                    )
                    .route("/reload", web::post().to(handlers::reload)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
