#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pure in-memory analytics over a corpus snapshot.
//!
//! Exact cosine-similarity retrieval, DBSCAN hotspot detection, and
//! calendar-dimension aggregation. Nothing here suspends or touches
//! external services; each function computes fresh from the records it
//! is handed.

pub mod hotspots;
pub mod retrieval;
pub mod temporal;

use thiserror::Error;

/// Errors from the analytics functions.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A caller-supplied parameter is out of range.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Which parameter and why.
        message: String,
    },
}
