//! Dimension declarations: name, optimization direction and value domain.
//!
//! The [`DimensionRegistry`] is the single place that knows whether a
//! dimension is maximized or minimized. Every algorithm in the crate asks
//! the registry instead of special-casing dimension names.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::record::MetricRecord;

pub const ACCURACY: &str = "accuracy";
pub const ENERGY_KWH: &str = "energy_kwh";
pub const CARBON_KG: &str = "carbon_kg";
pub const LATENCY_MS: &str = "latency_ms";
pub const MEMORY_MB: &str = "memory_mb";
pub const CIRCUIT_DEPTH: &str = "circuit_depth";
pub const VARIANCE_SCORE: &str = "variance_score";

/// Optimization direction of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// Order `a` against `b` so that `Greater` means `a` is better.
    ///
    /// Incomparable floats (NaN) compare as `Equal`; records never hold NaN.
    pub fn preference(self, a: f64, b: f64) -> Ordering {
        let raw = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            Direction::Maximize => raw,
            Direction::Minimize => raw.reverse(),
        }
    }

    /// Direction-aware difference: positive when `a` is better than `b`.
    pub fn advantage(self, a: f64, b: f64) -> f64 {
        match self {
            Direction::Maximize => a - b,
            Direction::Minimize => b - a,
        }
    }

    /// The better of two values.
    pub fn best(self, a: f64, b: f64) -> f64 {
        match self {
            Direction::Maximize => a.max(b),
            Direction::Minimize => a.min(b),
        }
    }

    /// The worse of two values.
    pub fn worst(self, a: f64, b: f64) -> f64 {
        match self {
            Direction::Maximize => a.min(b),
            Direction::Minimize => a.max(b),
        }
    }
}

/// Admissible values of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDomain {
    /// Closed interval `[0, 1]`.
    UnitInterval,
    /// `[0, +inf)`.
    NonNegative,
}

impl ValueDomain {
    pub fn contains(self, value: f64) -> bool {
        match self {
            ValueDomain::UnitInterval => (0.0..=1.0).contains(&value),
            ValueDomain::NonNegative => value >= 0.0,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ValueDomain::UnitInterval => "[0, 1]",
            ValueDomain::NonNegative => "[0, inf)",
        }
    }
}

/// Declaration of one measured dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub name: String,
    pub direction: Direction,
    pub domain: ValueDomain,
    /// Whether every record must carry this dimension.
    #[serde(default)]
    pub required: bool,
}

impl DimensionSpec {
    pub fn new(name: &str, direction: Direction, domain: ValueDomain, required: bool) -> Self {
        Self {
            name: name.to_string(),
            direction,
            domain,
            required,
        }
    }
}

/// Ordered set of dimension declarations.
///
/// Registry order is the canonical order for deltas, knee coordinates and
/// report output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRegistry {
    specs: Vec<DimensionSpec>,
}

impl Default for DimensionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl DimensionRegistry {
    /// The seven built-in dimensions.
    pub fn standard() -> Self {
        use Direction::{Maximize, Minimize};
        use ValueDomain::{NonNegative, UnitInterval};

        Self {
            specs: vec![
                DimensionSpec::new(ACCURACY, Maximize, UnitInterval, true),
                DimensionSpec::new(ENERGY_KWH, Minimize, NonNegative, true),
                DimensionSpec::new(CARBON_KG, Minimize, NonNegative, true),
                DimensionSpec::new(LATENCY_MS, Minimize, NonNegative, true),
                DimensionSpec::new(MEMORY_MB, Minimize, NonNegative, false),
                DimensionSpec::new(CIRCUIT_DEPTH, Minimize, NonNegative, false),
                DimensionSpec::new(VARIANCE_SCORE, Minimize, NonNegative, false),
            ],
        }
    }

    /// Register an additional optional dimension.
    pub fn register(
        &mut self,
        name: &str,
        direction: Direction,
        domain: ValueDomain,
    ) -> Result<(), ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyDimensionName);
        }
        if self.get(name).is_some() {
            return Err(ConfigError::DuplicateDimension(name.to_string()));
        }
        tracing::debug!(dimension = %name, ?direction, "dimension registered");
        self.specs
            .push(DimensionSpec::new(name, direction, domain, false));
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_dimension(
        mut self,
        name: &str,
        direction: Direction,
        domain: ValueDomain,
    ) -> Result<Self, ConfigError> {
        self.register(name, direction, domain)?;
        Ok(self)
    }

    /// Sub-registry restricted to `names`, in the order given.
    ///
    /// Projected dimensions are never required, so records missing one are
    /// simply skipped by callers.
    pub fn project(&self, names: &[&str]) -> Result<Self, ConfigError> {
        let mut specs = Vec::with_capacity(names.len());
        for name in names {
            let spec = self
                .get(name)
                .ok_or_else(|| ConfigError::UnknownDimension(name.to_string()))?;
            if specs.iter().any(|s: &DimensionSpec| s.name == *name) {
                return Err(ConfigError::DuplicateDimension(name.to_string()));
            }
            specs.push(DimensionSpec {
                required: false,
                ..spec.clone()
            });
        }
        Ok(Self { specs })
    }

    /// Sub-registry of the dimensions measured by every record in `records`.
    ///
    /// Dominance over a collection is decided on this fixed set, so the
    /// relation stays transitive when optional dimensions are only present
    /// on some records.
    pub fn common_to(&self, records: &[&MetricRecord]) -> Self {
        let specs = self
            .specs
            .iter()
            .filter(|spec| records.iter().all(|r| r.get(&spec.name).is_some()))
            .cloned()
            .collect();
        Self { specs }
    }

    pub fn get(&self, name: &str) -> Option<&DimensionSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn direction(&self, name: &str) -> Option<Direction> {
        self.get(name).map(|s| s.direction)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_declares_directions() {
        let reg = DimensionRegistry::standard();
        assert_eq!(reg.len(), 7);
        assert_eq!(reg.direction(ACCURACY), Some(Direction::Maximize));
        for name in [ENERGY_KWH, CARBON_KG, LATENCY_MS, MEMORY_MB, CIRCUIT_DEPTH, VARIANCE_SCORE] {
            assert_eq!(reg.direction(name), Some(Direction::Minimize), "{name}");
        }
        assert!(reg.get(ACCURACY).unwrap().required);
        assert!(!reg.get(MEMORY_MB).unwrap().required);
    }

    #[test]
    fn preference_respects_direction() {
        assert_eq!(Direction::Maximize.preference(0.9, 0.8), Ordering::Greater);
        assert_eq!(Direction::Minimize.preference(0.9, 0.8), Ordering::Less);
        assert_eq!(Direction::Minimize.preference(2.0, 2.0), Ordering::Equal);
        assert!(Direction::Minimize.advantage(1.0, 3.0) > 0.0);
        assert!(Direction::Maximize.advantage(1.0, 3.0) < 0.0);
    }

    #[test]
    fn register_rejects_duplicates_and_empty_names() {
        let mut reg = DimensionRegistry::standard();
        reg.register("cost_usd", Direction::Minimize, ValueDomain::NonNegative)
            .unwrap();
        assert_eq!(reg.direction("cost_usd"), Some(Direction::Minimize));

        let err = reg
            .register(ACCURACY, Direction::Minimize, ValueDomain::UnitInterval)
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateDimension(ACCURACY.to_string()));

        let err = reg
            .register("  ", Direction::Minimize, ValueDomain::NonNegative)
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptyDimensionName);
    }

    #[test]
    fn project_keeps_order_and_drops_required_flag() {
        let reg = DimensionRegistry::standard();
        let sub = reg.project(&[CARBON_KG, ACCURACY]).unwrap();
        assert_eq!(sub.names(), vec![CARBON_KG, ACCURACY]);
        assert!(sub.iter().all(|s| !s.required));

        assert!(matches!(
            reg.project(&["nope"]),
            Err(ConfigError::UnknownDimension(_))
        ));
    }

    #[test]
    fn domains() {
        assert!(ValueDomain::UnitInterval.contains(0.0));
        assert!(ValueDomain::UnitInterval.contains(1.0));
        assert!(!ValueDomain::UnitInterval.contains(1.01));
        assert!(ValueDomain::NonNegative.contains(1e9));
        assert!(!ValueDomain::NonNegative.contains(-0.001));
    }

    #[test]
    fn common_to_keeps_dimensions_every_record_measures() {
        let reg = DimensionRegistry::standard();
        let core = [
            (ACCURACY, 0.9),
            (ENERGY_KWH, 0.002),
            (CARBON_KG, 0.001),
            (LATENCY_MS, 90.0),
        ];
        let plain = MetricRecord::new(&reg, "plain", core).unwrap();
        let mut extra = core.to_vec();
        extra.push((MEMORY_MB, 128.0));
        let with_memory = MetricRecord::new(&reg, "with_memory", extra).unwrap();

        let both = reg.common_to(&[&with_memory]);
        assert!(both.get(MEMORY_MB).is_some());
        assert!(both.get(CIRCUIT_DEPTH).is_none());

        let common = reg.common_to(&[&plain, &with_memory]);
        assert_eq!(common.names(), vec![ACCURACY, ENERGY_KWH, CARBON_KG, LATENCY_MS]);
        assert_eq!(reg.common_to(&[]), reg);
    }
}
