//! Knee point: the frontier member closest to the ideal point.
//!
//! Each participating dimension is rescaled over the frontier so that the
//! best observed value maps to 1.0 and the worst to 0.0. A dimension on
//! which every member has the same value carries no information and maps
//! to 1.0 for all of them. The knee is the member with the smallest
//! Euclidean distance to the all-ones ideal; ties go to the earlier member.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{DimensionRegistry, MetricRecord};
use crate::metrics::METRICS;
use crate::obs;

/// Value ranges below this width count as a tie.
pub const NORMALIZATION_EPSILON: f64 = 1e-12;

/// Selected knee point with the coordinates that justify it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KneePoint<'a> {
    pub record: &'a MetricRecord,
    /// Position of the record in the frontier passed in.
    pub index: usize,
    /// Euclidean distance to the ideal point.
    pub distance: f64,
    /// Normalized coordinate per participating dimension.
    pub normalized: BTreeMap<String, f64>,
}

impl KneePoint<'_> {
    pub fn agent_id(&self) -> &str {
        self.record.agent_id()
    }
}

struct Axis<'r> {
    name: &'r str,
    best: f64,
    worst: f64,
}

impl Axis<'_> {
    fn normalize(&self, value: f64) -> f64 {
        let span = self.best - self.worst;
        if span.abs() < NORMALIZATION_EPSILON {
            1.0
        } else {
            ((value - self.worst) / span).clamp(0.0, 1.0)
        }
    }
}

/// Dimensions measured by every frontier member, with best/worst values.
fn axes<'r>(registry: &'r DimensionRegistry, frontier: &[&MetricRecord]) -> Vec<Axis<'r>> {
    registry
        .iter()
        .filter_map(|spec| {
            let values: Vec<f64> = frontier
                .iter()
                .map(|r| r.get(&spec.name))
                .collect::<Option<Vec<f64>>>()?;
            let first = *values.first()?;
            let (best, worst) = values.iter().fold((first, first), |(b, w), &v| {
                (spec.direction.best(b, v), spec.direction.worst(w, v))
            });
            Some(Axis {
                name: spec.name.as_str(),
                best,
                worst,
            })
        })
        .collect()
}

/// Select the best-balance member of `frontier`.
///
/// Returns `None` for an empty frontier. The result is always one of the
/// given records, never an interpolated point.
pub fn get_knee_point<'a>(
    registry: &DimensionRegistry,
    frontier: &[&'a MetricRecord],
) -> Option<KneePoint<'a>> {
    let axes = axes(registry, frontier);

    let mut best: Option<KneePoint<'a>> = None;
    for (index, &record) in frontier.iter().enumerate() {
        let mut normalized = BTreeMap::new();
        let mut sum_sq = 0.0;
        for axis in &axes {
            // axes only lists dimensions every member has
            let value = record.get(axis.name).unwrap_or(axis.worst);
            let n = axis.normalize(value);
            sum_sq += (1.0 - n).powi(2);
            normalized.insert(axis.name.to_string(), n);
        }
        let distance = sum_sq.sqrt();

        if best.as_ref().map_or(true, |b| distance < b.distance) {
            best = Some(KneePoint {
                record,
                index,
                distance,
                normalized,
            });
        }
    }

    if let Some(knee) = &best {
        METRICS.inc_knees();
        obs::emit_knee_selected(knee.agent_id(), knee.distance, frontier.len());
    }
    best
}
