//! Hard per-dimension budgets used for feasibility filtering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::dimension::{DimensionRegistry, Direction, CIRCUIT_DEPTH, MEMORY_MB, VARIANCE_SCORE};
use super::error::ConfigError;

pub const DEFAULT_WARNING_FRACTION: f64 = 0.8;

fn default_warning_fraction() -> f64 {
    DEFAULT_WARNING_FRACTION
}

fn default_budget_name() -> String {
    "default".to_string()
}

/// Named set of per-dimension bounds.
///
/// A limit is the worst acceptable value: a ceiling for minimized
/// dimensions, a floor for maximized ones. `warning_fraction` only drives
/// the advisory [`BudgetStatus`]; feasibility uses the limit itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default = "default_budget_name")]
    pub name: String,
    #[serde(default)]
    pub limits: BTreeMap<String, f64>,
    #[serde(default = "default_warning_fraction")]
    pub warning_fraction: f64,
}

impl Default for Budget {
    fn default() -> Self {
        Self::new("default")
    }
}

impl Budget {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            limits: BTreeMap::new(),
            warning_fraction: DEFAULT_WARNING_FRACTION,
        }
    }

    /// Set the bound for any dimension.
    pub fn with_limit(mut self, dimension: &str, limit: f64) -> Self {
        self.limits.insert(dimension.to_string(), limit);
        self
    }

    pub fn with_max_memory_mb(self, limit: f64) -> Self {
        self.with_limit(MEMORY_MB, limit)
    }

    pub fn with_max_circuit_depth(self, limit: f64) -> Self {
        self.with_limit(CIRCUIT_DEPTH, limit)
    }

    pub fn with_max_variance(self, limit: f64) -> Self {
        self.with_limit(VARIANCE_SCORE, limit)
    }

    pub fn with_warning_fraction(mut self, fraction: f64) -> Self {
        self.warning_fraction = fraction;
        self
    }

    pub fn limit(&self, dimension: &str) -> Option<f64> {
        self.limits.get(dimension).copied()
    }

    /// Check limits against the registry and the warning fraction range.
    pub fn validate(&self, registry: &DimensionRegistry) -> Result<(), ConfigError> {
        if !(self.warning_fraction > 0.0 && self.warning_fraction <= 1.0) {
            return Err(ConfigError::WarningFraction(self.warning_fraction));
        }
        for (dimension, limit) in &self.limits {
            if registry.get(dimension).is_none() {
                return Err(ConfigError::UnknownDimension(dimension.clone()));
            }
            if !limit.is_finite() {
                return Err(ConfigError::InvalidLimit {
                    dimension: dimension.clone(),
                    value: *limit,
                });
            }
        }
        Ok(())
    }
}

/// Whether `value` respects `limit` under `direction`.
pub fn within_limit(direction: Direction, value: f64, limit: f64) -> bool {
    match direction {
        Direction::Minimize => value <= limit,
        Direction::Maximize => value >= limit,
    }
}

/// Advisory consumption status of one value against one limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    UnderBudget,
    NearLimit,
    Exceeded,
}

/// Fraction of the budget consumed: `value / limit` for ceilings,
/// `limit / value` for floors. Zero denominators saturate.
pub fn utilization(direction: Direction, value: f64, limit: f64) -> f64 {
    let (num, den) = match direction {
        Direction::Minimize => (value, limit),
        Direction::Maximize => (limit, value),
    };
    if den > 0.0 {
        num / den
    } else if num > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Classify a value for advisory signalling.
pub fn budget_status(
    direction: Direction,
    value: f64,
    limit: f64,
    warning_fraction: f64,
) -> BudgetStatus {
    if !within_limit(direction, value, limit) {
        BudgetStatus::Exceeded
    } else if utilization(direction, value, limit) >= warning_fraction {
        BudgetStatus::NearLimit
    } else {
        BudgetStatus::UnderBudget
    }
}
