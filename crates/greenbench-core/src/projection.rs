//! Two-dimensional views of a comparison set for external plotting.
//!
//! `is_frontier` is decided by dominance on the two plotted dimensions
//! only, so a record can sit on the full frontier and still be dominated in
//! a given view, and vice versa.

use serde::{Deserialize, Serialize};

use crate::domain::{
    ConfigError, DimensionRegistry, MetricRecord, ACCURACY, CARBON_KG, ENERGY_KWH, LATENCY_MS,
};
use crate::frontier::compute_frontier;

/// A named pair of dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionSpec {
    pub x: String,
    pub y: String,
}

impl ProjectionSpec {
    pub fn new(x: &str, y: &str) -> Self {
        Self {
            x: x.to_string(),
            y: y.to_string(),
        }
    }

    pub fn name(&self) -> String {
        format!("{}_vs_{}", self.x, self.y)
    }

    pub fn validate(&self, registry: &DimensionRegistry) -> Result<(), ConfigError> {
        if self.x == self.y {
            return Err(ConfigError::DegenerateProjection {
                x: self.x.clone(),
                y: self.y.clone(),
            });
        }
        for dim in [&self.x, &self.y] {
            if registry.get(dim).is_none() {
                return Err(ConfigError::UnknownDimension(dim.clone()));
            }
        }
        Ok(())
    }
}

/// accuracy × carbon, latency × energy, carbon × energy.
pub fn standard_projections() -> Vec<ProjectionSpec> {
    vec![
        ProjectionSpec::new(ACCURACY, CARBON_KG),
        ProjectionSpec::new(LATENCY_MS, ENERGY_KWH),
        ProjectionSpec::new(CARBON_KG, ENERGY_KWH),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub agent_id: String,
    pub is_frontier: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub name: String,
    pub x_dim: String,
    pub y_dim: String,
    /// Sorted by `x`, then `y`; equal points keep input order.
    pub points: Vec<ProjectedPoint>,
}

impl Projection {
    pub fn frontier_ids(&self) -> Vec<&str> {
        self.points
            .iter()
            .filter(|p| p.is_frontier)
            .map(|p| p.agent_id.as_str())
            .collect()
    }
}

/// Project `records` onto `spec`. Records missing either dimension are left out.
pub fn project_2d<'a, I>(
    registry: &DimensionRegistry,
    records: I,
    spec: &ProjectionSpec,
) -> Result<Projection, ConfigError>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    spec.validate(registry)?;
    let plane = registry.project(&[spec.x.as_str(), spec.y.as_str()])?;

    let plotted: Vec<&MetricRecord> = records
        .into_iter()
        .filter(|r| r.get(&spec.x).is_some() && r.get(&spec.y).is_some())
        .collect();
    let frontier = compute_frontier(&plane, plotted.iter().copied());

    let mut points: Vec<ProjectedPoint> = plotted
        .iter()
        .filter_map(|r| {
            Some(ProjectedPoint {
                x: r.get(&spec.x)?,
                y: r.get(&spec.y)?,
                agent_id: r.agent_id().to_string(),
                is_frontier: frontier.iter().any(|f| std::ptr::eq(*f, *r)),
            })
        })
        .collect();
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    Ok(Projection {
        name: spec.name(),
        x_dim: spec.x.clone(),
        y_dim: spec.y.clone(),
        points,
    })
}

/// One projection per spec, in the order given.
pub fn project_all(
    registry: &DimensionRegistry,
    records: &[&MetricRecord],
    specs: &[ProjectionSpec],
) -> Result<Vec<Projection>, ConfigError> {
    specs
        .iter()
        .map(|spec| project_2d(registry, records.iter().copied(), spec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(reg: &DimensionRegistry, id: &str, acc: f64, carbon: f64, latency: f64) -> MetricRecord {
        MetricRecord::new(
            reg,
            id,
            [
                (ACCURACY, acc),
                (ENERGY_KWH, 0.002),
                (CARBON_KG, carbon),
                (LATENCY_MS, latency),
            ],
        )
        .unwrap()
    }

    #[test]
    fn view_frontier_uses_only_plotted_dimensions() {
        let reg = DimensionRegistry::standard();
        // "fast" is only on the full frontier because of latency
        let good = rec(&reg, "good", 0.95, 0.001, 200.0);
        let fast = rec(&reg, "fast", 0.90, 0.002, 50.0);
        let records = [&good, &fast];

        let view = project_2d(&reg, records, &ProjectionSpec::new(ACCURACY, CARBON_KG)).unwrap();
        assert_eq!(view.name, "accuracy_vs_carbon_kg");
        assert_eq!(view.frontier_ids(), vec!["good"]);
        assert_eq!(view.points.len(), 2);
        assert_eq!(view.points[0].agent_id, "fast");
        assert_eq!((view.points[0].x, view.points[0].y), (0.90, 0.002));
    }

    #[test]
    fn bad_specs_are_rejected() {
        let reg = DimensionRegistry::standard();
        let records: [&MetricRecord; 0] = [];
        assert!(matches!(
            project_2d(&reg, records, &ProjectionSpec::new(ACCURACY, ACCURACY)),
            Err(ConfigError::DegenerateProjection { .. })
        ));
        assert!(matches!(
            project_2d(&reg, records, &ProjectionSpec::new(ACCURACY, "gpu")),
            Err(ConfigError::UnknownDimension(_))
        ));
    }

    #[test]
    fn standard_set_projects_everything() {
        let reg = DimensionRegistry::standard();
        let a = rec(&reg, "a", 0.9, 0.001, 100.0);
        let views = project_all(&reg, &[&a], &standard_projections()).unwrap();
        assert_eq!(views.len(), 3);
        assert!(views.iter().all(|v| v.frontier_ids() == vec!["a"]));
    }
}
