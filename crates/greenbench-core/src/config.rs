//! TOML analysis configuration.
//!
//! Every section is optional:
//!
//! ```toml
//! projections = [["accuracy", "carbon_kg"], ["latency_ms", "energy_kwh"]]
//!
//! [[dimensions]]
//! name = "cost_usd"
//! direction = "minimize"
//! domain = "non_negative"
//!
//! [complexity]
//! cut_points = [1.0, 2.0, 4.0, 8.0]
//! expected_steps = [1.0, 2.0, 4.0, 8.0, 16.0]
//! over_reasoning_threshold = 2.0
//!
//! [complexity.weights]
//! prompt_length = 0.2
//! reasoning_steps = 0.2
//! tool_calls = 0.2
//! wall_clock_ms = 0.2
//! context_size = 0.2
//!
//! [budget]
//! name = "edge"
//! warning_fraction = 0.8
//!
//! [budget.limits]
//! memory_mb = 512.0
//! variance_score = 0.2
//!
//! [parallel]
//! min_records = 512
//! chunk_size = 64
//! ```
//!
//! Validation runs on load, so a bad weight vector or an unknown budget
//! dimension is reported before anything is analyzed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::complexity::ComplexityModel;
use crate::domain::{Budget, ConfigError, DimensionRegistry, Direction, Result, ValueDomain};
use crate::frontier::ParallelConfig;
use crate::projection::{standard_projections, ProjectionSpec};

/// Extra dimension declared in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDecl {
    pub name: String,
    pub direction: Direction,
    #[serde(default = "DimensionDecl::default_domain")]
    pub domain: ValueDomain,
}

impl DimensionDecl {
    fn default_domain() -> ValueDomain {
        ValueDomain::NonNegative
    }
}

fn default_projection_pairs() -> Vec<[String; 2]> {
    standard_projections()
        .into_iter()
        .map(|p| [p.x, p.y])
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub dimensions: Vec<DimensionDecl>,
    #[serde(default)]
    pub complexity: ComplexityModel,
    #[serde(default)]
    pub budget: Option<Budget>,
    #[serde(default = "default_projection_pairs")]
    pub projections: Vec<[String; 2]>,
    #[serde(default)]
    pub parallel: ParallelConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dimensions: Vec::new(),
            complexity: ComplexityModel::default(),
            budget: None,
            projections: default_projection_pairs(),
            parallel: ParallelConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(msg) => {
                ConfigError::Parse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "analysis config loaded");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(toml: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Standard dimensions plus every `[[dimensions]]` entry, in file order.
    pub fn registry(&self) -> std::result::Result<DimensionRegistry, ConfigError> {
        let mut registry = DimensionRegistry::standard();
        for decl in &self.dimensions {
            registry.register(&decl.name, decl.direction, decl.domain)?;
        }
        Ok(registry)
    }

    pub fn projection_specs(&self) -> Vec<ProjectionSpec> {
        self.projections
            .iter()
            .map(|[x, y]| ProjectionSpec::new(x, y))
            .collect()
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let registry = self.registry()?;
        self.complexity.validate()?;
        if let Some(budget) = &self.budget {
            budget.validate(&registry)?;
        }
        for spec in self.projection_specs() {
            spec.validate(&registry)?;
        }
        self.parallel.validate()
    }
}
