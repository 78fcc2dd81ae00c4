#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared domain types for the crime record retrieval-and-analysis engine.
//!
//! Defines the incident record shape, retrieval and analysis result types,
//! hotspot cluster output, and temporal aggregation buckets used across
//! the store, analytics, and server crates.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Canonical month labels, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Canonical weekday labels, Monday first.
pub const DAY_LABELS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Time-of-day bucket for an incident.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum TimeOfDay {
    /// Roughly 06:00-12:00.
    Morning,
    /// Roughly 12:00-18:00.
    Afternoon,
    /// Roughly 18:00-22:00.
    Evening,
    /// Roughly 22:00-06:00.
    Night,
}

impl TimeOfDay {
    /// Canonical labels in chronological order.
    pub const LABELS: [&'static str; 4] = ["Morning", "Afternoon", "Evening", "Night"];
}

/// Categorical risk level produced by the generative model.
///
/// `Unknown` is the sentinel substituted when the model's response does
/// not contain a recognizable risk level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum RiskLevel {
    /// Little elevated risk.
    Low,
    /// Some elevated risk.
    #[strum(serialize = "Moderate", serialize = "Medium")]
    Moderate,
    /// Substantially elevated risk.
    High,
    /// Highest risk category.
    #[strum(serialize = "Very High", serialize = "VeryHigh", serialize = "Critical")]
    #[serde(rename = "Very High")]
    VeryHigh,
    /// Sentinel: the model response had no parseable risk level.
    Unknown,
}

/// One historical crime observation.
///
/// Records are created at corpus load time and read-only for the life of
/// a snapshot; coordinates and the date are validated at ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Stable unique identifier (CSV `Id` column or the row ordinal).
    pub id: String,
    /// Crime type, open vocabulary (e.g. "Theft", "Assault").
    pub crime_type: String,
    /// Neighborhood or district label.
    pub neighborhood: String,
    /// Latitude in degrees, finite, within [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, finite, within [-180, 180].
    pub longitude: f64,
    /// Calendar date of the incident.
    pub date: NaiveDate,
    /// Time-of-day bucket.
    pub time_of_day: TimeOfDay,
    /// Weather label (e.g. "Rainy").
    pub weather: String,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Lighting label (e.g. "Well-lit", "Poorly-lit").
    pub lighting: String,
    /// People per square kilometre, non-negative.
    pub population_density: f64,
    /// Average neighborhood income, non-negative.
    pub average_income: f64,
    /// Unemployment rate as a percentage.
    pub unemployment_rate: f64,
}

impl IncidentRecord {
    /// Weekday label for this record's date.
    #[must_use]
    pub fn day_of_week(&self) -> &'static str {
        DAY_LABELS[self.date.weekday().num_days_from_monday() as usize]
    }

    /// Month label for this record's date.
    #[must_use]
    pub fn month(&self) -> &'static str {
        MONTH_LABELS[self.date.month0() as usize]
    }
}

/// Optional AND-combined record filters for scans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilter {
    /// Earliest date, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Latest date, inclusive.
    pub date_to: Option<NaiveDate>,
    /// Exact crime type (case-insensitive).
    pub crime_type: Option<String>,
    /// Exact neighborhood/district label (case-insensitive).
    pub neighborhood: Option<String>,
}

impl RecordFilter {
    /// Returns `true` when every active filter matches the record.
    #[must_use]
    pub fn matches(&self, record: &IncidentRecord) -> bool {
        if let Some(from) = self.date_from
            && record.date < from
        {
            return false;
        }
        if let Some(to) = self.date_to
            && record.date > to
        {
            return false;
        }
        if let Some(ref crime_type) = self.crime_type
            && !record.crime_type.eq_ignore_ascii_case(crime_type)
        {
            return false;
        }
        if let Some(ref neighborhood) = self.neighborhood
            && !record.neighborhood.eq_ignore_ascii_case(neighborhood)
        {
            return false;
        }
        true
    }

    /// Returns `true` when no filter is active.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.crime_type.is_none()
            && self.neighborhood.is_none()
    }
}

/// One retrieval hit: a record and its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityMatch {
    /// The matched incident.
    pub record: IncidentRecord,
    /// Cosine similarity in [-1, 1].
    pub score: f64,
}

/// One entry of the model's crime-type distribution, e.g. `Theft(60%)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeShare {
    /// Crime type label as emitted by the model.
    pub crime_type: String,
    /// Percentage as emitted by the model. Shares are surfaced as-given
    /// and never renormalized, even when they do not sum to 100.
    pub percent: f64,
}

/// Structured output of one analysis request.
///
/// Fields the parser could not extract carry their sentinel values
/// (`None`, empty vec, [`RiskLevel::Unknown`]) and are named in
/// `defaulted_fields`; `raw_response` always holds the unmodified model
/// output so callers can recover anything the parser missed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// The original query text.
    pub query: String,
    /// Crime probability estimate in [0, 100], if parseable.
    pub crime_probability: Option<f64>,
    /// Ranked crime-type distribution, in the order the model listed it.
    pub distribution: Vec<CrimeShare>,
    /// Contributing risk factors.
    pub key_factors: Vec<String>,
    /// Categorical risk level.
    pub risk_level: RiskLevel,
    /// The retrieved records used as evidence, best match first.
    pub matches: Vec<SimilarityMatch>,
    /// The unparsed model response, retained for audit.
    pub raw_response: String,
    /// Names of fields that fell back to their sentinel values.
    pub defaulted_fields: Vec<String>,
}

/// One geographic hotspot found by density clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Cluster id, assigned in discovery order starting at 0.
    pub id: u32,
    /// Mean latitude of the members.
    pub centroid_lat: f64,
    /// Mean longitude of the members.
    pub centroid_lng: f64,
    /// Number of member incidents.
    pub member_count: u64,
    /// Incident count per crime type.
    pub crime_types: BTreeMap<String, u64>,
    /// Mean temperature across members.
    pub avg_temperature: f64,
    /// Incident count per lighting label.
    pub lighting: BTreeMap<String, u64>,
    /// Neighborhoods touched by this cluster.
    pub neighborhoods: BTreeSet<String>,
}

/// Result of one hotspot detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotReport {
    /// Clusters in discovery order.
    pub clusters: Vec<Hotspot>,
    /// Number of clusters found.
    pub total_clusters: usize,
    /// Points that belong to no cluster.
    pub noise_count: usize,
}

/// Calendar dimension for temporal aggregation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum TemporalDimension {
    /// Twelve month-of-year buckets.
    Month,
    /// Seven day-of-week buckets, Monday first.
    DayOfWeek,
    /// Four time-of-day buckets.
    TimeOfDay,
}

impl TemporalDimension {
    /// The canonical, ordered label set for this dimension.
    #[must_use]
    pub const fn labels(self) -> &'static [&'static str] {
        match self {
            Self::Month => &MONTH_LABELS,
            Self::DayOfWeek => &DAY_LABELS,
            Self::TimeOfDay => &TimeOfDay::LABELS,
        }
    }
}

/// One bucket of a temporal pattern: a canonical label and per-crime-type
/// counts. Buckets with no incidents are present with empty counts so the
/// output is always dense over the dimension's label set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalBucket {
    /// Canonical bucket label (month name, weekday name, or time of day).
    pub label: String,
    /// Incident count per crime type.
    pub counts: BTreeMap<String, u64>,
}

impl TemporalBucket {
    /// Total incidents across all crime types in this bucket.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// How much of each matched record the context builder renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContextMode {
    /// Render every attribute of each matched record.
    FullContext,
    /// Render only crime type, location, and date.
    Summary,
}
