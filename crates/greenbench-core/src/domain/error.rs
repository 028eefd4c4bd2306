//! Domain-level error taxonomy for greenbench.

/// Errors produced while constructing a [`MetricRecord`](super::MetricRecord).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("agent_id must not be empty")]
    EmptyAgentId,

    #[error("duplicate agent_id in comparison set: {agent_id}")]
    DuplicateAgentId { agent_id: String },

    #[error("agent {agent_id}: unknown dimension '{dimension}' (register it first)")]
    UnknownDimension { agent_id: String, dimension: String },

    #[error("agent {agent_id}: missing required dimension '{dimension}'")]
    MissingDimension { agent_id: String, dimension: String },

    #[error("agent {agent_id}: {dimension} = {value} is outside {domain}")]
    OutOfDomain {
        agent_id: String,
        dimension: String,
        value: f64,
        domain: String,
    },

    #[error("agent {agent_id}: {dimension} is not a finite number")]
    NonFinite { agent_id: String, dimension: String },
}

/// Errors produced by invalid analysis configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("complexity weights sum to {sum}, expected 1.0 ± {tolerance}")]
    WeightSum { sum: f64, tolerance: f64 },

    #[error("complexity weight '{field}' must be a finite non-negative number, got {value}")]
    InvalidWeight { field: String, value: f64 },

    #[error("unknown complexity weight '{0}'")]
    UnknownWeight(String),

    #[error("complexity cut points must be finite and strictly ascending: {0:?}")]
    CutPoints(Vec<f64>),

    #[error("expected reasoning steps must be positive for every tier: {0:?}")]
    ExpectedSteps(Vec<f64>),

    #[error("over-reasoning threshold must be positive, got {0}")]
    Threshold(f64),

    #[error("warning fraction must lie in (0, 1], got {0}")]
    WarningFraction(f64),

    #[error("budget limit for '{dimension}' must be finite, got {value}")]
    InvalidLimit { dimension: String, value: f64 },

    #[error("dimension '{0}' is not registered")]
    UnknownDimension(String),

    #[error("dimension '{0}' is already registered")]
    DuplicateDimension(String),

    #[error("dimension name must not be empty")]
    EmptyDimensionName,

    #[error("projection needs two distinct dimensions, got '{x}' and '{y}'")]
    DegenerateProjection { x: String, y: String },

    #[error("parallel chunk size must be at least 1")]
    ChunkSize,

    #[error("invalid config: {0}")]
    Parse(String),
}

/// Greenbench errors.
#[derive(Debug, thiserror::Error)]
pub enum GreenbenchError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for greenbench operations.
pub type Result<T> = std::result::Result<T, GreenbenchError>;
