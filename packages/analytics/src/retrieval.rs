//! Exact top-k retrieval by cosine similarity.
//!
//! The corpus is assumed to fit in memory, so every stored embedding is
//! scored against the query; no approximate index is involved.

use crime_rag_models::SimilarityMatch;
use crime_rag_store::CorpusSnapshot;

use crate::AnalyticsError;

/// Returns the `k` records most similar to the query vector, best first.
///
/// Ordering is by descending cosine similarity with ties broken by
/// record id ascending, so identical inputs always produce identical
/// output. `k` larger than the corpus is clamped; an empty corpus
/// yields an empty result, not an error.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] if `k` is zero or the
/// query vector's dimension does not match the corpus.
pub fn retrieve(
    query: &[f32],
    snapshot: &CorpusSnapshot,
    k: usize,
) -> Result<Vec<SimilarityMatch>, AnalyticsError> {
    if k == 0 {
        return Err(AnalyticsError::InvalidParameter {
            message: "n_results must be >= 1".to_string(),
        });
    }
    if snapshot.is_empty() {
        return Ok(Vec::new());
    }
    if query.len() != snapshot.dimension() {
        return Err(AnalyticsError::InvalidParameter {
            message: format!(
                "query vector dimension {} does not match corpus dimension {}",
                query.len(),
                snapshot.dimension()
            ),
        });
    }

    let mut scored: Vec<SimilarityMatch> = snapshot
        .records()
        .iter()
        .zip(snapshot.embeddings())
        .map(|(record, embedding)| SimilarityMatch {
            record: record.clone(),
            score: cosine_similarity(query, embedding),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    scored.truncate(k.min(snapshot.len()));

    Ok(scored)
}

/// Cosine similarity in [-1, 1]; zero vectors score 0 rather than NaN.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crime_rag_models::{IncidentRecord, TimeOfDay};

    use super::*;

    fn record(id: &str) -> IncidentRecord {
        IncidentRecord {
            id: id.to_string(),
            crime_type: "Theft".to_string(),
            neighborhood: "Downtown".to_string(),
            latitude: 40.71,
            longitude: -74.0,
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            time_of_day: TimeOfDay::Night,
            weather: "Rainy".to_string(),
            temperature: 12.0,
            lighting: "Poorly-lit".to_string(),
            population_density: 5000.0,
            average_income: 42_000.0,
            unemployment_rate: 7.5,
        }
    }

    fn snapshot(entries: &[(&str, [f32; 2])]) -> CorpusSnapshot {
        let records = entries.iter().map(|(id, _)| record(id)).collect();
        let embeddings = entries.iter().map(|(_, v)| v.to_vec()).collect();
        CorpusSnapshot::new(records, embeddings).unwrap()
    }

    #[test]
    fn results_are_sorted_by_descending_similarity() {
        let corpus = snapshot(&[
            ("a", [0.0, 1.0]),
            ("b", [1.0, 0.0]),
            ("c", [1.0, 1.0]),
        ]);
        let matches = retrieve(&[1.0, 0.0], &corpus, 3).unwrap();

        let ids: Vec<&str> = matches.iter().map(|m| m.record.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(matches[0].score > matches[1].score);
        assert!(matches[1].score > matches[2].score);
    }

    #[test]
    fn ties_break_by_id_ascending() {
        let corpus = snapshot(&[
            ("c", [1.0, 0.0]),
            ("a", [1.0, 0.0]),
            ("b", [2.0, 0.0]),
        ]);
        let matches = retrieve(&[1.0, 0.0], &corpus, 3).unwrap();

        // All three score 1.0 (cosine is scale-invariant)
        let ids: Vec<&str> = matches.iter().map(|m| m.record.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn k_is_clamped_to_corpus_size() {
        let corpus = snapshot(&[("a", [1.0, 0.0]), ("b", [0.0, 1.0])]);
        let matches = retrieve(&[1.0, 0.0], &corpus, 100).unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn zero_k_is_invalid() {
        let corpus = snapshot(&[("a", [1.0, 0.0])]);
        assert!(matches!(
            retrieve(&[1.0, 0.0], &corpus, 0),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn empty_corpus_returns_empty() {
        let corpus = CorpusSnapshot::new(Vec::new(), Vec::new()).unwrap();
        let matches = retrieve(&[1.0, 0.0], &corpus, 5).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn dimension_mismatch_is_invalid() {
        let corpus = snapshot(&[("a", [1.0, 0.0])]);
        assert!(matches!(
            retrieve(&[1.0, 0.0, 0.0], &corpus, 1),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = [1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
    }

    #[test]
    fn opposite_vectors_score_negative_one() {
        let similarity = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((similarity + 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).abs() < f64::EPSILON);
    }
}
