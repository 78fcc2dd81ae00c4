#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV corpus ingest and the embedded record store.
//!
//! Loads incident records from CSV, validates each row, embeds a rich
//! textual description of every valid record, and publishes the result
//! as an immutable [`CorpusSnapshot`]. Readers clone an `Arc` to the
//! current snapshot; reloads build a complete replacement off to the
//! side and swap it in atomically, so in-flight requests keep a
//! consistent view and a failed reload leaves the old corpus serving.

use std::path::Path;
use std::str::FromStr as _;
use std::sync::Arc;

use chrono::NaiveDate;
use crime_rag_ai::{AiError, Embedder};
use crime_rag_models::{IncidentRecord, RecordFilter, TimeOfDay};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur while loading or serving the corpus.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the CSV file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV structure itself is unreadable (bad headers, wrong
    /// field counts). Individual bad rows are skipped, not errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The embedding provider failed while building the snapshot.
    #[error("Embedding error: {0}")]
    Embed(#[from] AiError),

    /// No valid rows survived validation.
    #[error("no valid records in corpus source")]
    EmptyCorpus,

    /// Record and embedding counts disagree.
    #[error("corpus misaligned: {records} records but {embeddings} embeddings")]
    Misaligned {
        /// Number of records.
        records: usize,
        /// Number of embedding vectors.
        embeddings: usize,
    },

    /// The embedder returned vectors of inconsistent dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the first embedded record.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
}

/// Outcome of one corpus load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows that validated and were embedded.
    pub loaded: usize,
    /// Rows dropped by validation.
    pub skipped: usize,
    /// One entry per skipped row: the row index and the reason it was
    /// dropped.
    pub errors: Vec<String>,
}

/// An immutable view of the corpus: records paired index-for-index with
/// their embedding vectors, all of one dimension.
#[derive(Debug)]
pub struct CorpusSnapshot {
    records: Vec<IncidentRecord>,
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
}

impl CorpusSnapshot {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            embeddings: Vec::new(),
            dimension: 0,
        }
    }

    /// Builds a snapshot from pre-computed embeddings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DimensionMismatch`] if the vectors are not
    /// all of one dimension, or [`StoreError::Misaligned`] if the
    /// record and embedding counts disagree.
    pub fn new(
        records: Vec<IncidentRecord>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, StoreError> {
        if records.len() != embeddings.len() {
            return Err(StoreError::Misaligned {
                records: records.len(),
                embeddings: embeddings.len(),
            });
        }
        let dimension = embeddings.first().map_or(0, Vec::len);
        if let Some(vector) = embeddings.iter().find(|vector| vector.len() != dimension) {
            return Err(StoreError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
        Ok(Self {
            records,
            embeddings,
            dimension,
        })
    }

    /// All records, in corpus order.
    #[must_use]
    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    /// Embedding vectors, index-aligned with [`Self::records`].
    #[must_use]
    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Embedding dimension, or 0 for an empty snapshot.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the snapshot holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records matching the filter, in corpus order.
    #[must_use]
    pub fn filtered(&self, filter: &RecordFilter) -> Vec<&IncidentRecord> {
        self.records
            .iter()
            .filter(|record| filter.matches(record))
            .collect()
    }
}

/// The process-wide record store.
///
/// Holds the current [`CorpusSnapshot`] behind a lock that is only ever
/// taken long enough to clone or replace an `Arc`.
pub struct RecordStore {
    snapshot: RwLock<Arc<CorpusSnapshot>>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Creates a store with an empty corpus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(CorpusSnapshot::empty())),
        }
    }

    /// Clones a handle to the current snapshot.
    pub async fn snapshot(&self) -> Arc<CorpusSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Loads the corpus from a CSV file, replacing the current snapshot
    /// on success. On any error the previous snapshot keeps serving.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file is unreadable, no rows
    /// survive validation, or embedding fails.
    pub async fn load_csv(
        &self,
        path: &Path,
        embedder: &dyn Embedder,
    ) -> Result<LoadReport, StoreError> {
        log::info!("loading corpus from {}", path.display());
        let file = std::fs::File::open(path)?;
        self.load_from_reader(file, embedder).await
    }

    /// Loads the corpus from any CSV reader. See [`Self::load_csv`].
    ///
    /// Invalid rows are skipped, not fatal; each one is reported in
    /// [`LoadReport::errors`]. The exception is a source where *every*
    /// row fails validation: that aborts with
    /// [`StoreError::EmptyCorpus`] rather than swapping in an empty
    /// corpus, since an empty snapshot would silently disable
    /// retrieval.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the CSV is unreadable, no rows survive
    /// validation, or embedding fails.
    pub async fn load_from_reader<R: std::io::Read>(
        &self,
        reader: R,
        embedder: &dyn Embedder,
    ) -> Result<LoadReport, StoreError> {
        let (records, errors) = parse_rows(reader)?;

        if records.is_empty() {
            return Err(StoreError::EmptyCorpus);
        }

        let mut embeddings = Vec::with_capacity(records.len());
        let mut dimension = 0;

        for record in &records {
            let vector = embedder.embed(&contextual_description(record)).await?;
            if dimension == 0 {
                dimension = vector.len();
            } else if vector.len() != dimension {
                return Err(StoreError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            embeddings.push(vector);
        }

        let loaded = records.len();
        let next = Arc::new(CorpusSnapshot {
            records,
            embeddings,
            dimension,
        });

        *self.snapshot.write().await = next;

        log::info!("corpus loaded: {loaded} records, {} rows skipped", errors.len());
        Ok(LoadReport {
            loaded,
            skipped: errors.len(),
            errors,
        })
    }
}

/// The textual rendering of a record that gets embedded. Queries are
/// embedded raw, so retrieval quality depends on this text carrying the
/// same vocabulary a user query would.
#[must_use]
pub fn contextual_description(record: &IncidentRecord) -> String {
    format!(
        "Crime: {} in {} on {} during the {} hours. The weather was {} with a temperature of \
         {:.1}\u{b0}C. The area was {} with a population density of {:.1} people per sq km. The \
         neighborhood has an average income of {:.1} and an unemployment rate of {:.1}%.",
        record.crime_type,
        record.neighborhood,
        record.date.format("%A, %B %d, %Y"),
        record.time_of_day,
        record.weather,
        record.temperature,
        record.lighting,
        record.population_density,
        record.average_income,
        record.unemployment_rate,
    )
}

/// One raw CSV row, headers as they appear in the source file.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default, rename = "Id")]
    id: Option<String>,
    #[serde(rename = "Crime_Type")]
    crime_type: String,
    #[serde(rename = "Neighborhood")]
    neighborhood: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time_of_Day")]
    time_of_day: String,
    #[serde(rename = "Weather")]
    weather: String,
    #[serde(rename = "Temperature")]
    temperature: f64,
    #[serde(rename = "Lighting")]
    lighting: String,
    #[serde(rename = "Population_Density")]
    population_density: f64,
    #[serde(rename = "Average_Income")]
    average_income: f64,
    #[serde(rename = "Unemployment_Rate")]
    unemployment_rate: f64,
}

/// Parses and validates all rows, skipping bad ones and collecting a
/// reason for each skip.
fn parse_rows<R: std::io::Read>(
    reader: R,
) -> Result<(Vec<IncidentRecord>, Vec<String>), StoreError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (index, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::warn!("row {index}: unreadable, skipping: {e}");
                errors.push(format!("row {index}: unreadable: {e}"));
                continue;
            }
        };
        match validate_row(index, row) {
            Ok(record) => records.push(record),
            Err(reason) => {
                log::warn!("row {index}: {reason}, skipping");
                errors.push(format!("row {index}: {reason}"));
            }
        }
    }

    Ok((records, errors))
}

fn validate_row(index: usize, row: CsvRow) -> Result<IncidentRecord, String> {
    if row.crime_type.trim().is_empty() {
        return Err("empty crime type".to_string());
    }
    if row.neighborhood.trim().is_empty() {
        return Err("empty neighborhood".to_string());
    }
    if !row.latitude.is_finite() || !(-90.0..=90.0).contains(&row.latitude) {
        return Err(format!("latitude {} out of range", row.latitude));
    }
    if !row.longitude.is_finite() || !(-180.0..=180.0).contains(&row.longitude) {
        return Err(format!("longitude {} out of range", row.longitude));
    }
    if !row.temperature.is_finite() {
        return Err("non-finite temperature".to_string());
    }
    if !row.population_density.is_finite() || row.population_density < 0.0 {
        return Err(format!(
            "invalid population density {}",
            row.population_density
        ));
    }
    if !row.average_income.is_finite() || row.average_income < 0.0 {
        return Err(format!("invalid average income {}", row.average_income));
    }
    if !row.unemployment_rate.is_finite() || row.unemployment_rate < 0.0 {
        return Err(format!(
            "invalid unemployment rate {}",
            row.unemployment_rate
        ));
    }

    let date = parse_date(&row.date).ok_or_else(|| format!("unparseable date '{}'", row.date))?;
    let time_of_day = TimeOfDay::from_str(row.time_of_day.trim())
        .map_err(|_| format!("unknown time of day '{}'", row.time_of_day))?;

    Ok(IncidentRecord {
        id: row
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| index.to_string()),
        crime_type: row.crime_type.trim().to_string(),
        neighborhood: row.neighborhood.trim().to_string(),
        latitude: row.latitude,
        longitude: row.longitude,
        date,
        time_of_day,
        weather: row.weather.trim().to_string(),
        temperature: row.temperature,
        lighting: row.lighting.trim().to_string(),
        population_density: row.population_density,
        average_income: row.average_income,
        unemployment_rate: row.unemployment_rate,
    })
}

/// Accepts ISO dates and the slash format some exports use.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const HEADER: &str = "Crime_Type,Neighborhood,Latitude,Longitude,Date,Time_of_Day,Weather,Temperature,Lighting,Population_Density,Average_Income,Unemployment_Rate";

    /// Deterministic embedder: a fixed-dimension vector derived from the
    /// text length.
    struct StubEmbedder {
        dimension: usize,
    }

    #[async_trait::async_trait]
    impl Embedder for StubEmbedder {
        #[allow(clippy::cast_precision_loss)]
        async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
            Ok(vec![text.len() as f32; self.dimension])
        }
    }

    struct FailingEmbedder;

    #[async_trait::async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, AiError> {
            Err(AiError::Provider {
                message: "embedding service down".to_string(),
            })
        }
    }

    fn csv_with(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[tokio::test]
    async fn loads_valid_rows_and_skips_bad_ones() {
        let csv = csv_with(&[
            "Theft,Downtown,40.71,-74.0,2024-03-15,Night,Rainy,12.0,Poorly-lit,5000,42000,7.5",
            // latitude out of range
            "Theft,Downtown,95.0,-74.0,2024-03-15,Night,Rainy,12.0,Poorly-lit,5000,42000,7.5",
            // bad date
            "Assault,Uptown,40.8,-73.9,not-a-date,Evening,Clear,20.0,Well-lit,3000,55000,4.0",
            "Assault,Uptown,40.8,-73.9,2024-06-01,Evening,Clear,20.0,Well-lit,3000,55000,4.0",
        ]);

        let store = RecordStore::new();
        let report = store
            .load_from_reader(Cursor::new(csv), &StubEmbedder { dimension: 4 })
            .await
            .unwrap();

        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped, 2);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.dimension(), 4);
        assert_eq!(snapshot.records()[0].crime_type, "Theft");
        // ids fall back to the row ordinal
        assert_eq!(snapshot.records()[0].id, "0");
        assert_eq!(snapshot.records()[1].id, "3");
    }

    #[tokio::test]
    async fn skipped_rows_report_their_reasons() {
        let csv = csv_with(&[
            "Theft,Downtown,40.71,-74.0,2024-03-15,Night,Rainy,12.0,Poorly-lit,5000,42000,7.5",
            "Theft,Downtown,95.0,-74.0,2024-03-15,Night,Rainy,12.0,Poorly-lit,5000,42000,7.5",
            "Assault,Uptown,40.8,-73.9,not-a-date,Evening,Clear,20.0,Well-lit,3000,55000,4.0",
        ]);

        let store = RecordStore::new();
        let report = store
            .load_from_reader(Cursor::new(csv), &StubEmbedder { dimension: 4 })
            .await
            .unwrap();

        assert_eq!(report.errors.len(), report.skipped);
        assert!(report.errors[0].contains("row 1"));
        assert!(report.errors[0].contains("latitude 95 out of range"));
        assert!(report.errors[1].contains("row 2"));
        assert!(report.errors[1].contains("unparseable date 'not-a-date'"));
    }

    #[tokio::test]
    async fn empty_corpus_is_an_error() {
        let csv = csv_with(&[]);
        let store = RecordStore::new();
        let result = store
            .load_from_reader(Cursor::new(csv), &StubEmbedder { dimension: 4 })
            .await;
        assert!(matches!(result, Err(StoreError::EmptyCorpus)));
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let good = csv_with(&[
            "Theft,Downtown,40.71,-74.0,2024-03-15,Night,Rainy,12.0,Poorly-lit,5000,42000,7.5",
        ]);
        let store = RecordStore::new();
        store
            .load_from_reader(Cursor::new(good), &StubEmbedder { dimension: 4 })
            .await
            .unwrap();

        let result = store
            .load_from_reader(
                Cursor::new(csv_with(&[
                    "Theft,Downtown,40.71,-74.0,2024-03-15,Night,Rainy,12.0,Poorly-lit,5000,42000,7.5",
                ])),
                &FailingEmbedder,
            )
            .await;
        assert!(matches!(result, Err(StoreError::Embed(_))));

        // Old corpus still serving
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn filter_scans_the_snapshot() {
        let csv = csv_with(&[
            "Theft,Downtown,40.71,-74.0,2024-03-15,Night,Rainy,12.0,Poorly-lit,5000,42000,7.5",
            "Assault,Uptown,40.8,-73.9,2024-06-01,Evening,Clear,20.0,Well-lit,3000,55000,4.0",
        ]);
        let store = RecordStore::new();
        store
            .load_from_reader(Cursor::new(csv), &StubEmbedder { dimension: 4 })
            .await
            .unwrap();

        let snapshot = store.snapshot().await;
        let filter = RecordFilter {
            crime_type: Some("assault".to_string()),
            ..RecordFilter::default()
        };
        let hits = snapshot.filtered(&filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].neighborhood, "Uptown");
    }

    #[test]
    fn description_reads_like_a_sentence() {
        let record = IncidentRecord {
            id: "0".to_string(),
            crime_type: "Theft".to_string(),
            neighborhood: "Downtown".to_string(),
            latitude: 40.71,
            longitude: -74.0,
            date: NaiveDate::from_str("2024-03-15").unwrap(),
            time_of_day: TimeOfDay::Night,
            weather: "Rainy".to_string(),
            temperature: 12.0,
            lighting: "Poorly-lit".to_string(),
            population_density: 5000.0,
            average_income: 42_000.0,
            unemployment_rate: 7.5,
        };
        let text = contextual_description(&record);
        assert!(text.starts_with("Crime: Theft in Downtown on Friday, March 15, 2024"));
        assert!(text.contains("during the Night hours"));
        assert!(text.contains("temperature of 12.0\u{b0}C"));
        assert!(text.contains("unemployment rate of 7.5%"));
    }

    #[test]
    fn lowercase_time_of_day_parses() {
        let csv = csv_with(&[
            "Theft,Downtown,40.71,-74.0,2024-03-15,night,Rainy,12.0,Poorly-lit,5000,42000,7.5",
        ]);
        let (records, errors) = parse_rows(Cursor::new(csv)).unwrap();
        assert!(errors.is_empty());
        assert_eq!(records[0].time_of_day, TimeOfDay::Night);
    }

    #[test]
    fn slash_dates_parse() {
        assert_eq!(
            parse_date("03/15/2024"),
            Some(NaiveDate::from_str("2024-03-15").unwrap())
        );
        assert_eq!(parse_date("2024-03-15"), parse_date("03/15/2024"));
        assert_eq!(parse_date("15.03.2024"), None);
    }
}
