//! Geographic hotspot detection with DBSCAN semantics.
//!
//! Distances are plain euclidean in degree space, so `eps` is expressed
//! in degrees (0.005 is roughly half a kilometre at mid latitudes).
//! Neighborhood expansion uses an explicit work queue rather than
//! recursion, so corpus size never threatens the stack.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crime_rag_models::{Hotspot, HotspotReport, IncidentRecord};

use crate::AnalyticsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unassigned,
    Noise,
    Cluster(u32),
}

/// Clusters the records' coordinates and aggregates each cluster.
///
/// A point is a core point when at least `min_samples` points
/// (including itself) lie within `eps` of it; clusters are the
/// density-connected components of core points plus their border
/// points. Points in no cluster are noise and appear only in the
/// report's `noise_count`. Cluster ids are assigned in discovery order
/// starting at 0, so identical input yields identical output.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] if `eps` is not a
/// positive finite number or `min_samples` is zero.
pub fn detect(
    records: &[&IncidentRecord],
    eps: f64,
    min_samples: usize,
) -> Result<HotspotReport, AnalyticsError> {
    if !eps.is_finite() || eps <= 0.0 {
        return Err(AnalyticsError::InvalidParameter {
            message: format!("eps must be a positive finite number, got {eps}"),
        });
    }
    if min_samples < 1 {
        return Err(AnalyticsError::InvalidParameter {
            message: "min_samples must be >= 1".to_string(),
        });
    }

    let labels = assign_labels(records, eps, min_samples);
    Ok(aggregate(records, &labels))
}

fn assign_labels(records: &[&IncidentRecord], eps: f64, min_samples: usize) -> Vec<Label> {
    let mut labels = vec![Label::Unassigned; records.len()];
    let mut next_cluster = 0u32;

    for i in 0..records.len() {
        if labels[i] != Label::Unassigned {
            continue;
        }

        let neighbors = neighbors_of(records, i, eps);
        if neighbors.len() < min_samples {
            labels[i] = Label::Noise;
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[i] = Label::Cluster(cluster);

        let mut queue: VecDeque<usize> = neighbors.into();
        while let Some(j) = queue.pop_front() {
            if labels[j] == Label::Noise {
                // Border point previously dismissed, absorb it.
                labels[j] = Label::Cluster(cluster);
                continue;
            }
            if labels[j] != Label::Unassigned {
                continue;
            }
            labels[j] = Label::Cluster(cluster);

            let expansion = neighbors_of(records, j, eps);
            if expansion.len() >= min_samples {
                queue.extend(expansion);
            }
        }
    }

    labels
}

/// Indices within `eps` of point `i`, including `i` itself.
fn neighbors_of(records: &[&IncidentRecord], i: usize, eps: f64) -> Vec<usize> {
    let origin = records[i];
    records
        .iter()
        .enumerate()
        .filter(|(_, candidate)| {
            let d_lat = candidate.latitude - origin.latitude;
            let d_lng = candidate.longitude - origin.longitude;
            d_lat.hypot(d_lng) <= eps
        })
        .map(|(index, _)| index)
        .collect()
}

fn aggregate(records: &[&IncidentRecord], labels: &[Label]) -> HotspotReport {
    let total_clusters = labels
        .iter()
        .filter_map(|label| match label {
            Label::Cluster(id) => Some(*id as usize + 1),
            _ => None,
        })
        .max()
        .unwrap_or(0);

    let mut sums = vec![ClusterSums::default(); total_clusters];
    let mut noise_count = 0;

    for (record, label) in records.iter().zip(labels) {
        match label {
            Label::Cluster(id) => sums[*id as usize].add(record),
            Label::Noise => noise_count += 1,
            Label::Unassigned => {
                // Unreachable: assign_labels visits every point.
                noise_count += 1;
            }
        }
    }

    let clusters: Vec<Hotspot> = sums
        .into_iter()
        .enumerate()
        .map(|(id, sums)| sums.into_hotspot(u32::try_from(id).unwrap_or(u32::MAX)))
        .collect();

    HotspotReport {
        total_clusters: clusters.len(),
        clusters,
        noise_count,
    }
}

#[derive(Debug, Clone, Default)]
struct ClusterSums {
    lat_sum: f64,
    lng_sum: f64,
    temperature_sum: f64,
    count: u64,
    crime_types: BTreeMap<String, u64>,
    lighting: BTreeMap<String, u64>,
    neighborhoods: BTreeSet<String>,
}

impl ClusterSums {
    fn add(&mut self, record: &IncidentRecord) {
        self.lat_sum += record.latitude;
        self.lng_sum += record.longitude;
        self.temperature_sum += record.temperature;
        self.count += 1;
        *self
            .crime_types
            .entry(record.crime_type.clone())
            .or_insert(0) += 1;
        *self.lighting.entry(record.lighting.clone()).or_insert(0) += 1;
        self.neighborhoods.insert(record.neighborhood.clone());
    }

    #[allow(clippy::cast_precision_loss)]
    fn into_hotspot(self, id: u32) -> Hotspot {
        let count = self.count.max(1) as f64;
        Hotspot {
            id,
            centroid_lat: self.lat_sum / count,
            centroid_lng: self.lng_sum / count,
            member_count: self.count,
            crime_types: self.crime_types,
            avg_temperature: self.temperature_sum / count,
            lighting: self.lighting,
            neighborhoods: self.neighborhoods,
        }
    }
}
