//! Calendar-dimension aggregation.
//!
//! Output is dense: every canonical bucket for the chosen dimension is
//! present, in calendar order, even when its count is zero. Consumers
//! can therefore chart the result without filling gaps themselves.

use std::collections::BTreeMap;

use crime_rag_models::{IncidentRecord, TemporalBucket, TemporalDimension};

/// Counts incidents per crime type within each bucket of the dimension.
///
/// Each record contributes exactly once, to the bucket derived from its
/// date (month, weekday) or its time-of-day field.
#[must_use]
pub fn aggregate(records: &[&IncidentRecord], dimension: TemporalDimension) -> Vec<TemporalBucket> {
    let labels = dimension.labels();
    let mut buckets: Vec<TemporalBucket> = labels
        .iter()
        .map(|label| TemporalBucket {
            label: (*label).to_string(),
            counts: BTreeMap::new(),
        })
        .collect();

    for record in records {
        let label = match dimension {
            TemporalDimension::Month => record.month(),
            TemporalDimension::DayOfWeek => record.day_of_week(),
            TemporalDimension::TimeOfDay => record.time_of_day.as_ref(),
        };
        if let Some(position) = labels.iter().position(|candidate| *candidate == label) {
            *buckets[position]
                .counts
                .entry(record.crime_type.clone())
                .or_insert(0) += 1;
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crime_rag_models::TimeOfDay;

    use super::*;

    fn record(id: &str, date: &str, time_of_day: TimeOfDay, crime_type: &str) -> IncidentRecord {
        IncidentRecord {
            id: id.to_string(),
            crime_type: crime_type.to_string(),
            neighborhood: "Downtown".to_string(),
            latitude: 40.71,
            longitude: -74.0,
            date: date.parse::<NaiveDate>().unwrap(),
            time_of_day,
            weather: "Clear".to_string(),
            temperature: 10.0,
            lighting: "Well-lit".to_string(),
            population_density: 5000.0,
            average_income: 42_000.0,
            unemployment_rate: 7.5,
        }
    }

    #[test]
    fn month_buckets_are_dense_and_ordered() {
        let a = record("a", "2024-01-10", TimeOfDay::Night, "Theft");
        let b = record("b", "2024-01-20", TimeOfDay::Morning, "Theft");
        let c = record("c", "2024-06-05", TimeOfDay::Evening, "Assault");
        let records = vec![&a, &b, &c];

        let buckets = aggregate(&records, TemporalDimension::Month);

        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].label, "January");
        assert_eq!(buckets[0].counts.get("Theft"), Some(&2));
        assert_eq!(buckets[5].label, "June");
        assert_eq!(buckets[5].counts.get("Assault"), Some(&1));
        assert!(buckets[11].counts.is_empty());
    }

    #[test]
    fn day_of_week_starts_monday() {
        // 2024-03-15 was a Friday, 2024-03-18 a Monday.
        let a = record("a", "2024-03-15", TimeOfDay::Night, "Theft");
        let b = record("b", "2024-03-18", TimeOfDay::Night, "Theft");
        let records = vec![&a, &b];

        let buckets = aggregate(&records, TemporalDimension::DayOfWeek);

        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].label, "Monday");
        assert_eq!(buckets[0].total(), 1);
        assert_eq!(buckets[4].label, "Friday");
        assert_eq!(buckets[4].total(), 1);
    }

    #[test]
    fn time_of_day_buckets_count_by_field() {
        let a = record("a", "2024-03-15", TimeOfDay::Night, "Theft");
        let b = record("b", "2024-03-16", TimeOfDay::Night, "Assault");
        let c = record("c", "2024-03-17", TimeOfDay::Morning, "Theft");
        let records = vec![&a, &b, &c];

        let buckets = aggregate(&records, TemporalDimension::TimeOfDay);

        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0].label, "Morning");
        assert_eq!(buckets[0].total(), 1);
        assert_eq!(buckets[3].label, "Night");
        assert_eq!(buckets[3].counts.get("Theft"), Some(&1));
        assert_eq!(buckets[3].counts.get("Assault"), Some(&1));
    }

    #[test]
    fn totals_sum_to_record_count() {
        let records_owned: Vec<IncidentRecord> = (0..30)
            .map(|i| {
                record(
                    &i.to_string(),
                    &format!("2024-{:02}-11", (i % 12) + 1),
                    TimeOfDay::Afternoon,
                    "Theft",
                )
            })
            .collect();
        let records: Vec<&IncidentRecord> = records_owned.iter().collect();

        for dimension in [
            TemporalDimension::Month,
            TemporalDimension::DayOfWeek,
            TemporalDimension::TimeOfDay,
        ] {
            let total: u64 = aggregate(&records, dimension)
                .iter()
                .map(TemporalBucket::total)
                .sum();
            assert_eq!(total, 30, "dimension {dimension}");
        }
    }

    #[test]
    fn empty_input_yields_dense_zero_buckets() {
        let buckets = aggregate(&[], TemporalDimension::Month);
        assert_eq!(buckets.len(), 12);
        assert!(buckets.iter().all(|bucket| bucket.counts.is_empty()));
    }
}
