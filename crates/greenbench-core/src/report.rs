//! Analysis report: the structured result handed to dashboards and
//! reporting tools, plus its on-disk artifact form.
//!
//! [`build_report`] is a pure function of its inputs; two calls on the same
//! records and config serialize to identical bytes. The artifact envelope
//! adds a timestamp and is written as `<dir>/report.json` alongside a
//! `<dir>/report.digest` file holding the SHA-256 of the JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::AnalysisConfig;
use crate::constraints::{comprehensive_analysis, Advisory, ComprehensiveAnalysis, LimitViolation};
use crate::domain::{ensure_unique_ids, DimensionRegistry, GreenbenchError, MetricRecord, Result};
use crate::frontier::{compute_frontier_with, rank_by_dominance};
use crate::knee::{get_knee_point, KneePoint};
use crate::metrics::METRICS;
use crate::obs;
use crate::projection::{project_all, Projection};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

const REPORT_FILE: &str = "report.json";
const DIGEST_FILE: &str = "report.digest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KneeSummary {
    pub agent_id: String,
    pub distance: f64,
    pub normalized: BTreeMap<String, f64>,
}

impl From<&KneePoint<'_>> for KneeSummary {
    fn from(knee: &KneePoint<'_>) -> Self {
        Self {
            agent_id: knee.agent_id().to_string(),
            distance: knee.distance,
            normalized: knee.normalized.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitSummary {
    pub dimension: String,
    pub limit: f64,
    pub feasible: Vec<String>,
    pub infeasible: Vec<String>,
    pub unmeasured: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionSummary {
    pub agent_id: String,
    pub violations: Vec<LimitViolation>,
}

/// Per-constraint feasibility results.
///
/// `recommendation` is `None` exactly when no record satisfies every limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSummary {
    pub budget: String,
    pub limits: Vec<LimitSummary>,
    pub feasible: Vec<String>,
    pub feasible_frontier: Vec<String>,
    pub excluded: Vec<ExclusionSummary>,
    pub advisories: Vec<Advisory>,
    pub recommendation: Option<KneeSummary>,
}

fn ids(records: &[&MetricRecord]) -> Vec<String> {
    records.iter().map(|r| r.agent_id().to_string()).collect()
}

impl From<&ComprehensiveAnalysis<'_>> for ConstraintSummary {
    fn from(analysis: &ComprehensiveAnalysis<'_>) -> Self {
        Self {
            budget: analysis.budget.clone(),
            limits: analysis
                .evaluations
                .iter()
                .map(|e| LimitSummary {
                    dimension: e.dimension.clone(),
                    limit: e.limit,
                    feasible: ids(&e.feasible),
                    infeasible: ids(&e.infeasible),
                    unmeasured: ids(&e.unmeasured),
                })
                .collect(),
            feasible: ids(&analysis.feasible),
            feasible_frontier: ids(&analysis.feasible_frontier),
            excluded: analysis
                .exclusions
                .iter()
                .map(|x| ExclusionSummary {
                    agent_id: x.record.agent_id().to_string(),
                    violations: x.violations.clone(),
                })
                .collect(),
            advisories: analysis.advisories.clone(),
            recommendation: analysis.recommendation.knee().map(KneeSummary::from),
        }
    }
}

/// Everything the reporting collaborators consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub schema_version: u32,
    pub total_records: usize,
    /// Registry order.
    pub dimensions: Vec<String>,
    /// Input order.
    pub frontier: Vec<String>,
    /// Tier index → agent ids in input order.
    pub ranks: BTreeMap<usize, Vec<String>>,
    pub knee_point: Option<KneeSummary>,
    /// Present when the config carries a budget.
    pub constraints: Option<ConstraintSummary>,
    pub projections: Vec<Projection>,
}

/// Run every stage over `records` and assemble the report.
///
/// # Errors
///
/// Duplicate agent ids, or a budget / projection that does not match the
/// registry.
pub fn build_report(
    registry: &DimensionRegistry,
    records: &[MetricRecord],
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    ensure_unique_ids(records)?;
    config.parallel.validate()?;

    let refs: Vec<&MetricRecord> = records.iter().collect();
    let frontier = compute_frontier_with(registry, refs.iter().copied(), &config.parallel);
    let ranking = rank_by_dominance(registry, refs.iter().copied());
    let knee = get_knee_point(registry, &frontier);

    let constraints = match &config.budget {
        Some(budget) => {
            let analysis = comprehensive_analysis(registry, &refs, budget)?;
            Some(ConstraintSummary::from(&analysis))
        }
        None => None,
    };

    let projections = project_all(registry, &refs, &config.projection_specs())?;

    let report = AnalysisReport {
        schema_version: REPORT_SCHEMA_VERSION,
        total_records: records.len(),
        dimensions: registry.names(),
        frontier: ids(&frontier),
        ranks: ranking.to_id_map(),
        knee_point: knee.as_ref().map(KneeSummary::from),
        constraints,
        projections,
    };

    METRICS.inc_reports();
    obs::emit_report_built(
        report.total_records,
        report.frontier.len(),
        report.knee_point.as_ref().map(|k| k.agent_id.as_str()),
    );
    Ok(report)
}

/// SHA-256 hex digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest of the report's canonical JSON encoding.
pub fn report_digest(report: &AnalysisReport) -> Result<String> {
    let json = serde_json::to_vec(report)?;
    Ok(sha256_hex(&json))
}

/// Report plus provenance, as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub greenbench_version: String,
    pub generated_at: DateTime<Utc>,
    pub report: AnalysisReport,
}

impl ReportArtifact {
    pub fn new(report: AnalysisReport) -> Self {
        Self {
            greenbench_version: crate::VERSION.to_string(),
            generated_at: Utc::now(),
            report,
        }
    }
}

/// Persist `<dir>/report.json` and `<dir>/report.digest`.
pub fn write_report_artifact(artifact: &ReportArtifact, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = dir.join(REPORT_FILE);
    let digest_path = dir.join(DIGEST_FILE);
    let json = serde_json::to_vec_pretty(artifact)?;
    let digest = sha256_hex(&json);

    std::fs::write(&path, &json)?;
    std::fs::write(&digest_path, digest.as_bytes())?;

    tracing::debug!(path = %path.display(), digest = %digest, "report artifact written");
    Ok(path)
}

/// Read `<dir>/report.json` and verify it against `<dir>/report.digest`.
pub fn read_report_artifact(dir: &Path) -> Result<ReportArtifact> {
    let json = std::fs::read(dir.join(REPORT_FILE))?;
    let digest = std::fs::read_to_string(dir.join(DIGEST_FILE))?;
    let actual = sha256_hex(&json);
    if digest.trim() != actual {
        return Err(GreenbenchError::DigestMismatch {
            expected: digest.trim().to_string(),
            actual,
        });
    }
    let artifact: ReportArtifact = serde_json::from_slice(&json)?;
    Ok(artifact)
}
