//! Greenbench Core Library
//!
//! Multi-objective comparison of agent runs: dominance, frontiers, layered
//! ranking, knee point selection, complexity normalization and budget
//! feasibility. Every operation is a pure function of immutable inputs.

pub mod complexity;
pub mod config;
pub mod constraints;
pub mod domain;
pub mod dominance;
pub mod frontier;
pub mod knee;
pub mod metrics;
pub mod obs;
pub mod projection;
pub mod report;
pub mod telemetry;

pub use domain::{
    budget_status, ensure_unique_ids, validate_records, Budget, BudgetStatus, ConfigError,
    DimensionRegistry, DimensionSpec, Direction, ExecutionTrace, GreenbenchError, MetricRecord,
    RawMetricRecord, Result, ValidationError, ValueDomain, ACCURACY, CARBON_KG, CIRCUIT_DEPTH,
    ENERGY_KWH, LATENCY_MS, MEMORY_MB, VARIANCE_SCORE,
};

pub use complexity::{
    complexity_normalized, normalize_efficiency, BatchSummary, ComplexityAnalysis,
    ComplexityComparison, ComplexityModel, ComplexityTier, ComplexityWeights, MoreComplex,
    OverReasoningReport, TaskComplexity,
};
pub use config::{AnalysisConfig, DimensionDecl};
pub use constraints::{
    analyze_circuit_depth_scalability, analyze_memory_constraint, analyze_variance_stability,
    comprehensive_analysis, ComprehensiveAnalysis, ConstraintEvaluation, Recommendation,
};
pub use dominance::{compare, dominates, Comparison, DimensionDelta, Favors, Relation};
pub use frontier::{
    compute_frontier, compute_frontier_partitioned, compute_frontier_with, rank_by_dominance,
    ParallelConfig, Ranking,
};
pub use knee::{get_knee_point, KneePoint};
pub use projection::{
    project_2d, project_all, standard_projections, ProjectedPoint, Projection, ProjectionSpec,
};
pub use report::{
    build_report, read_report_artifact, write_report_artifact, AnalysisReport, ReportArtifact,
};

pub use metrics::METRICS;
pub use obs::AnalysisSpan;
pub use telemetry::{init_tracing, LogFormat};

/// Greenbench version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
