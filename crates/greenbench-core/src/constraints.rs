//! Feasibility filtering against hard per-dimension budgets.
//!
//! The three focused analyses (memory, circuit depth, variance) describe one
//! dimension each. [`comprehensive_analysis`] intersects every limit of a
//! [`Budget`], then runs frontier and knee selection on the survivors. A
//! record missing a constrained dimension is reported as unmeasured and is
//! never feasible for that limit.

use serde::{Deserialize, Serialize};

use crate::domain::record::as_ids;
use crate::domain::{
    budget_status, utilization, within_limit, Budget, BudgetStatus, ConfigError,
    DimensionRegistry, Direction, MetricRecord, ACCURACY, CIRCUIT_DEPTH, ENERGY_KWH, MEMORY_MB,
    VARIANCE_SCORE,
};
use crate::frontier::compute_frontier;
use crate::knee::{get_knee_point, KneePoint};
use crate::obs;

/// Memory denominators below this are treated as this.
const MEMORY_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Single-dimension split
// ---------------------------------------------------------------------------

/// Records split by one bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintEvaluation<'a> {
    pub dimension: String,
    pub direction: Direction,
    pub limit: f64,
    #[serde(serialize_with = "as_ids::serialize")]
    pub feasible: Vec<&'a MetricRecord>,
    #[serde(serialize_with = "as_ids::serialize")]
    pub infeasible: Vec<&'a MetricRecord>,
    #[serde(serialize_with = "as_ids::serialize")]
    pub unmeasured: Vec<&'a MetricRecord>,
}

/// Split `records` by `limit` on `dimension`, preserving input order.
pub fn evaluate_limit<'a>(
    dimension: &str,
    direction: Direction,
    limit: f64,
    records: &[&'a MetricRecord],
) -> ConstraintEvaluation<'a> {
    let mut feasible = Vec::new();
    let mut infeasible = Vec::new();
    let mut unmeasured = Vec::new();
    for &record in records {
        match record.get(dimension) {
            Some(v) if within_limit(direction, v, limit) => feasible.push(record),
            Some(_) => infeasible.push(record),
            None => unmeasured.push(record),
        }
    }
    obs::emit_constraint_evaluated(dimension, limit, feasible.len(), infeasible.len());
    ConstraintEvaluation {
        dimension: dimension.to_string(),
        direction,
        limit,
        feasible,
        infeasible,
        unmeasured,
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEfficiency<'a> {
    #[serde(rename = "agent_id", serialize_with = "as_ids::serialize_one")]
    pub record: &'a MetricRecord,
    pub memory_mb: f64,
    pub accuracy_per_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryAnalysis<'a> {
    pub max_memory_mb: f64,
    pub split: ConstraintEvaluation<'a>,
    /// Non-dominated feasible records, input order.
    #[serde(serialize_with = "as_ids::serialize")]
    pub feasible_frontier: Vec<&'a MetricRecord>,
    /// One entry per feasible record, input order.
    pub efficiency: Vec<MemoryEfficiency<'a>>,
    /// Feasible record with the highest accuracy per MB.
    #[serde(serialize_with = "as_ids::serialize_opt")]
    pub most_efficient: Option<&'a MetricRecord>,
}

pub fn analyze_memory_constraint<'a>(
    registry: &DimensionRegistry,
    records: &[&'a MetricRecord],
    max_memory_mb: f64,
) -> MemoryAnalysis<'a> {
    let split = evaluate_limit(MEMORY_MB, Direction::Minimize, max_memory_mb, records);
    let feasible_frontier = compute_frontier(registry, split.feasible.iter().copied());

    let efficiency: Vec<MemoryEfficiency<'a>> = split
        .feasible
        .iter()
        .filter_map(|&record| {
            let memory_mb = record.get(MEMORY_MB)?;
            let accuracy = record.get(ACCURACY).unwrap_or(0.0);
            Some(MemoryEfficiency {
                record,
                memory_mb,
                accuracy_per_mb: accuracy / memory_mb.max(MEMORY_EPSILON),
            })
        })
        .collect();

    let mut most_efficient: Option<&MemoryEfficiency<'a>> = None;
    for entry in &efficiency {
        if most_efficient.map_or(true, |m| entry.accuracy_per_mb > m.accuracy_per_mb) {
            most_efficient = Some(entry);
        }
    }
    let most_efficient = most_efficient.map(|m| m.record);

    MemoryAnalysis {
        max_memory_mb,
        split,
        feasible_frontier,
        efficiency,
        most_efficient,
    }
}

// ---------------------------------------------------------------------------
// Circuit depth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobustnessEntry<'a> {
    #[serde(rename = "agent_id", serialize_with = "as_ids::serialize_one")]
    pub record: &'a MetricRecord,
    pub circuit_depth: f64,
    /// `accuracy / (1 + depth / max_depth)`.
    pub robustness: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DepthStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

/// Pearson correlation of circuit depth with other dimensions.
///
/// 0.0 when fewer than two measured records or when either side is constant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DepthCorrelations {
    pub accuracy_vs_depth: f64,
    pub energy_vs_depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthAnalysis<'a> {
    pub stats: DepthStats,
    pub correlations: DepthCorrelations,
    /// Depth at or below the mean.
    #[serde(serialize_with = "as_ids::serialize")]
    pub shallow: Vec<&'a MetricRecord>,
    #[serde(serialize_with = "as_ids::serialize")]
    pub deep: Vec<&'a MetricRecord>,
    #[serde(serialize_with = "as_ids::serialize")]
    pub unmeasured: Vec<&'a MetricRecord>,
    /// Most robust first; equal scores keep input order.
    pub robustness: Vec<RobustnessEntry<'a>>,
    #[serde(serialize_with = "as_ids::serialize_opt")]
    pub most_robust: Option<&'a MetricRecord>,
    /// Lowest robustness; the earliest record wins ties.
    #[serde(serialize_with = "as_ids::serialize_opt")]
    pub most_fragile: Option<&'a MetricRecord>,
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 0 => (sorted[mid - 1] + sorted[mid]) / 2.0,
        _ => sorted[mid],
    }
}

fn pearson(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return 0.0;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    let denom = (vx * vy).sqrt();
    if denom < MEMORY_EPSILON {
        0.0
    } else {
        cov / denom
    }
}

fn depth_pairs(measured: &[(&MetricRecord, f64)], dimension: &str) -> Vec<(f64, f64)> {
    measured
        .iter()
        .filter_map(|&(r, depth)| r.get(dimension).map(|v| (depth, v)))
        .collect()
}

pub fn analyze_circuit_depth_scalability<'a>(records: &[&'a MetricRecord]) -> DepthAnalysis<'a> {
    let mut measured: Vec<(&'a MetricRecord, f64)> = Vec::new();
    let mut unmeasured = Vec::new();
    for &record in records {
        match record.get(CIRCUIT_DEPTH) {
            Some(depth) => measured.push((record, depth)),
            None => unmeasured.push(record),
        }
    }

    if measured.is_empty() {
        return DepthAnalysis {
            stats: DepthStats::default(),
            correlations: DepthCorrelations::default(),
            shallow: Vec::new(),
            deep: Vec::new(),
            unmeasured,
            robustness: Vec::new(),
            most_robust: None,
            most_fragile: None,
        };
    }

    let n = measured.len() as f64;
    let mean = measured.iter().map(|(_, d)| d).sum::<f64>() / n;
    let var = measured.iter().map(|(_, d)| (d - mean).powi(2)).sum::<f64>() / n;
    let min = measured.iter().map(|(_, d)| *d).fold(f64::INFINITY, f64::min);
    let max = measured.iter().map(|(_, d)| *d).fold(f64::NEG_INFINITY, f64::max);
    let depths: Vec<f64> = measured.iter().map(|(_, d)| *d).collect();

    let (shallow, deep): (Vec<_>, Vec<_>) = measured.iter().partition(|(_, d)| *d <= mean);

    let mut robustness: Vec<RobustnessEntry<'a>> = measured
        .iter()
        .map(|&(record, depth)| {
            let normalized = if max > 0.0 { depth / max } else { 0.0 };
            RobustnessEntry {
                record,
                circuit_depth: depth,
                robustness: record.get(ACCURACY).unwrap_or(0.0) / (1.0 + normalized),
            }
        })
        .collect();

    let mut most_fragile: Option<&RobustnessEntry<'a>> = None;
    for entry in &robustness {
        if most_fragile.map_or(true, |m| entry.robustness < m.robustness) {
            most_fragile = Some(entry);
        }
    }
    let most_fragile = most_fragile.map(|e| e.record);

    robustness.sort_by(|a, b| b.robustness.total_cmp(&a.robustness));
    let most_robust = robustness.first().map(|e| e.record);

    DepthAnalysis {
        stats: DepthStats {
            mean,
            std: var.sqrt(),
            min,
            max,
            median: median(&depths),
        },
        correlations: DepthCorrelations {
            accuracy_vs_depth: pearson(&depth_pairs(&measured, ACCURACY)),
            energy_vs_depth: pearson(&depth_pairs(&measured, ENERGY_KWH)),
        },
        shallow: shallow.into_iter().map(|&(r, _)| r).collect(),
        deep: deep.into_iter().map(|&(r, _)| r).collect(),
        unmeasured,
        robustness,
        most_robust,
        most_fragile,
    }
}

// ---------------------------------------------------------------------------
// Variance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyOverhead<'a> {
    #[serde(rename = "agent_id", serialize_with = "as_ids::serialize_one")]
    pub record: &'a MetricRecord,
    /// Estimated extra energy at P95: `energy_kwh * 2 * variance_score`.
    pub p95_energy_overhead_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceAnalysis<'a> {
    pub stability_threshold: f64,
    pub split: ConstraintEvaluation<'a>,
    /// Measured records, lowest variance first.
    #[serde(serialize_with = "as_ids::serialize")]
    pub stability_ranking: Vec<&'a MetricRecord>,
    pub mean_variance: f64,
    pub energy_overhead: Vec<EnergyOverhead<'a>>,
}

pub fn analyze_variance_stability<'a>(
    records: &[&'a MetricRecord],
    stability_threshold: f64,
) -> VarianceAnalysis<'a> {
    let split = evaluate_limit(
        VARIANCE_SCORE,
        Direction::Minimize,
        stability_threshold,
        records,
    );

    let mut measured: Vec<(&'a MetricRecord, f64)> = records
        .iter()
        .filter_map(|&r| r.get(VARIANCE_SCORE).map(|v| (r, v)))
        .collect();

    let mean_variance = if measured.is_empty() {
        0.0
    } else {
        measured.iter().map(|(_, v)| v).sum::<f64>() / measured.len() as f64
    };

    let energy_overhead = measured
        .iter()
        .filter_map(|&(record, variance)| {
            let energy = record.get(ENERGY_KWH)?;
            Some(EnergyOverhead {
                record,
                p95_energy_overhead_kwh: energy * 2.0 * variance,
            })
        })
        .collect();

    measured.sort_by(|a, b| a.1.total_cmp(&b.1));

    VarianceAnalysis {
        stability_threshold,
        split,
        stability_ranking: measured.into_iter().map(|(r, _)| r).collect(),
        mean_variance,
        energy_overhead,
    }
}

// ---------------------------------------------------------------------------
// Comprehensive analysis
// ---------------------------------------------------------------------------

/// One failed limit. `value` is `None` when the dimension was not measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitViolation {
    pub dimension: String,
    pub limit: f64,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusion<'a> {
    #[serde(rename = "agent_id", serialize_with = "as_ids::serialize_one")]
    pub record: &'a MetricRecord,
    pub violations: Vec<LimitViolation>,
}

/// Advisory budget consumption of one record on one limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub agent_id: String,
    pub dimension: String,
    pub value: f64,
    pub limit: f64,
    pub utilization: f64,
    pub status: BudgetStatus,
}

/// Final pick. There is no fallback to an infeasible record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Recommendation<'a> {
    Feasible { knee: KneePoint<'a> },
    NoFeasibleCandidate { budget: String, evaluated: usize },
}

impl<'a> Recommendation<'a> {
    pub fn knee(&self) -> Option<&KneePoint<'a>> {
        match self {
            Recommendation::Feasible { knee } => Some(knee),
            Recommendation::NoFeasibleCandidate { .. } => None,
        }
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.knee().map(KneePoint::agent_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComprehensiveAnalysis<'a> {
    pub budget: String,
    pub evaluations: Vec<ConstraintEvaluation<'a>>,
    /// Records satisfying every limit, input order.
    #[serde(serialize_with = "as_ids::serialize")]
    pub feasible: Vec<&'a MetricRecord>,
    #[serde(serialize_with = "as_ids::serialize")]
    pub feasible_frontier: Vec<&'a MetricRecord>,
    pub exclusions: Vec<Exclusion<'a>>,
    pub advisories: Vec<Advisory>,
    pub recommendation: Recommendation<'a>,
}

/// Apply every limit of `budget`, then pick the knee of the feasible frontier.
///
/// # Errors
///
/// Fails if the budget names an unregistered dimension, a non-finite limit
/// or a warning fraction outside (0, 1].
pub fn comprehensive_analysis<'a>(
    registry: &DimensionRegistry,
    records: &[&'a MetricRecord],
    budget: &Budget,
) -> Result<ComprehensiveAnalysis<'a>, ConfigError> {
    budget.validate(registry)?;

    // (dimension, direction, limit) in registry order
    let limits: Vec<(&str, Direction, f64)> = registry
        .iter()
        .filter_map(|spec| {
            budget
                .limit(&spec.name)
                .map(|l| (spec.name.as_str(), spec.direction, l))
        })
        .collect();

    let evaluations: Vec<ConstraintEvaluation<'a>> = limits
        .iter()
        .map(|&(dim, dir, limit)| evaluate_limit(dim, dir, limit, records))
        .collect();

    let mut feasible = Vec::new();
    let mut exclusions = Vec::new();
    let mut advisories = Vec::new();
    for &record in records {
        let mut violations = Vec::new();
        for &(dim, dir, limit) in &limits {
            match record.get(dim) {
                Some(value) => {
                    if !within_limit(dir, value, limit) {
                        violations.push(LimitViolation {
                            dimension: dim.to_string(),
                            limit,
                            value: Some(value),
                        });
                    }
                    advisories.push(Advisory {
                        agent_id: record.agent_id().to_string(),
                        dimension: dim.to_string(),
                        value,
                        limit,
                        utilization: utilization(dir, value, limit),
                        status: budget_status(dir, value, limit, budget.warning_fraction),
                    });
                }
                None => violations.push(LimitViolation {
                    dimension: dim.to_string(),
                    limit,
                    value: None,
                }),
            }
        }
        if violations.is_empty() {
            feasible.push(record);
        } else {
            exclusions.push(Exclusion { record, violations });
        }
    }

    let feasible_frontier = compute_frontier(registry, feasible.iter().copied());
    let recommendation = match get_knee_point(registry, &feasible_frontier) {
        Some(knee) => Recommendation::Feasible { knee },
        None => {
            obs::emit_no_feasible_candidate(&budget.name, records.len());
            Recommendation::NoFeasibleCandidate {
                budget: budget.name.clone(),
                evaluated: records.len(),
            }
        }
    };

    Ok(ComprehensiveAnalysis {
        budget: budget.name.clone(),
        evaluations,
        feasible,
        feasible_frontier,
        exclusions,
        advisories,
        recommendation,
    })
}
