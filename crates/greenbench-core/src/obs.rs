//! Structured observability hooks for analysis stages.
//!
//! This module provides:
//! - Analysis-scoped tracing spans via the `AnalysisSpan` RAII guard
//! - Emission functions for stage events: frontier, ranking, knee point,
//!   constraint evaluation and report assembly
//!
//! Events are emitted at `info!` level except per-stage detail, which is
//! `debug!`. Filtering follows `RUST_LOG` (see [`crate::telemetry`]).

use tracing::{debug, info, warn};

/// RAII guard that enters an analysis-scoped span.
///
/// # Example
///
/// ```ignore
/// let _span = AnalysisSpan::enter("nightly-sweep");
/// // tracing calls below carry analysis = "nightly-sweep"
/// ```
pub struct AnalysisSpan {
    _span: tracing::span::EnteredSpan,
}

impl AnalysisSpan {
    /// Create and enter a span tagged with `label`.
    pub fn enter(label: &str) -> Self {
        let span = tracing::info_span!("greenbench.analysis", analysis = %label);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: frontier computed over `total` records.
pub fn emit_frontier_computed(total: usize, frontier: usize, partitioned: bool) {
    debug!(
        event = "frontier.computed",
        total = total,
        frontier = frontier,
        partitioned = partitioned,
    );
}

/// Emit event: dominance ranking finished.
pub fn emit_ranking_computed(total: usize, tiers: usize) {
    debug!(event = "ranking.computed", total = total, tiers = tiers);
}

/// Emit event: knee point selected from a frontier.
pub fn emit_knee_selected(agent_id: &str, distance: f64, frontier: usize) {
    info!(
        event = "knee.selected",
        agent_id = %agent_id,
        distance = distance,
        frontier = frontier,
    );
}

/// Emit event: one constraint filter evaluated.
pub fn emit_constraint_evaluated(dimension: &str, limit: f64, feasible: usize, infeasible: usize) {
    info!(
        event = "constraint.evaluated",
        dimension = %dimension,
        limit = limit,
        feasible = feasible,
        infeasible = infeasible,
    );
}

/// Emit event: every candidate failed the budget (warning level).
pub fn emit_no_feasible_candidate(budget: &str, total: usize) {
    warn!(event = "constraint.no_feasible_candidate", budget = %budget, total = total);
}

/// Emit event: analysis report assembled.
pub fn emit_report_built(total: usize, frontier: usize, knee: Option<&str>) {
    info!(
        event = "report.built",
        total = total,
        frontier = frontier,
        knee = knee.unwrap_or("-"),
    );
}
