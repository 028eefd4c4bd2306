//! Domain models for greenbench.
//!
//! Canonical definitions for the core entities:
//! - `DimensionRegistry`: declared dimensions with direction and domain
//! - `MetricRecord`: immutable measurement of one agent
//! - `ExecutionTrace`: raw task trace fed to the complexity normalizer
//! - `Budget`: hard per-dimension bounds

pub mod budget;
pub mod dimension;
pub mod error;
pub mod record;
pub mod trace;

// Re-export main types and errors
pub use budget::{budget_status, utilization, within_limit, Budget, BudgetStatus};
pub use dimension::{
    DimensionRegistry, DimensionSpec, Direction, ValueDomain, ACCURACY, CARBON_KG, CIRCUIT_DEPTH,
    ENERGY_KWH, LATENCY_MS, MEMORY_MB, VARIANCE_SCORE,
};
pub use error::{ConfigError, GreenbenchError, Result, ValidationError};
pub use record::{ensure_unique_ids, validate_records, MetricRecord, RawMetricRecord};
pub use trace::ExecutionTrace;
