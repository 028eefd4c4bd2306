//! Greenbench - multi-objective comparison of agent runs
//!
//! The `greenbench` command reads metric records and execution traces as
//! JSON, an optional TOML analysis config, and prints text or JSON results.
//!
//! ## Commands
//!
//! - `analyze`: Full report (frontier, ranks, knee, constraints, projections)
//! - `frontier`: Non-dominated records, optionally over a subset of dimensions
//! - `rank`: Dominance tiers
//! - `compare`: Pairwise relation with per-dimension deltas
//! - `complexity`: Task complexity of one trace or a batch of traces
//! - `constraints`: Budget feasibility and recommendation
//! - `project`: 2-D view of two dimensions

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, Level};

use greenbench_core::complexity::{BatchSummary, ComplexityAnalysis};
use greenbench_core::{
    build_report, compare, comprehensive_analysis, compute_frontier_with, init_tracing,
    project_2d, rank_by_dominance, validate_records, write_report_artifact, AnalysisConfig,
    AnalysisReport, AnalysisSpan, Comparison, ComprehensiveAnalysis, DimensionRegistry,
    ExecutionTrace, LogFormat, MetricRecord, Projection, ProjectionSpec, RawMetricRecord,
    Ranking, Recommendation, ReportArtifact, METRICS,
};

#[derive(Parser)]
#[command(name = "greenbench")]
#[command(author = "Greenbench Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-objective comparison of agent runs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage and print the analysis report
    Analyze {
        /// Metric records (JSON array)
        #[arg(short, long)]
        records: PathBuf,

        /// Analysis config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Also write report.json + report.digest into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the non-dominated records
    Frontier {
        #[arg(short, long)]
        records: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Restrict dominance to these dimensions (comma separated)
        #[arg(long, value_delimiter = ',')]
        dims: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Partition records into dominance tiers
    Rank {
        #[arg(short, long)]
        records: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Compare two agents dimension by dimension
    Compare {
        #[arg(short, long)]
        records: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// First agent id
        a: String,

        /// Second agent id
        b: String,

        #[arg(long)]
        json: bool,
    },

    /// Analyze task complexity of a trace (object) or a batch of traces (array)
    Complexity {
        #[arg(short, long)]
        trace: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Check records against the budget in the config
    Constraints {
        #[arg(short, long)]
        records: PathBuf,

        /// Analysis config with a [budget] section
        #[arg(short, long)]
        config: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Project records onto two dimensions
    Project {
        #[arg(short, long)]
        records: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// X-axis dimension
        #[arg(long)]
        x: String,

        /// Y-axis dimension
        #[arg(long)]
        y: String,

        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn label(&self) -> &'static str {
        match self {
            Commands::Analyze { .. } => "analyze",
            Commands::Frontier { .. } => "frontier",
            Commands::Rank { .. } => "rank",
            Commands::Compare { .. } => "compare",
            Commands::Complexity { .. } => "complexity",
            Commands::Constraints { .. } => "constraints",
            Commands::Project { .. } => "project",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(LogFormat::from_json_flag(cli.log_json), level);

    let _span = AnalysisSpan::enter(cli.command.label());
    let result = match cli.command {
        Commands::Analyze {
            records,
            config,
            json,
            out,
        } => cmd_analyze(&records, config.as_deref(), json, out.as_deref()),
        Commands::Frontier {
            records,
            config,
            dims,
            json,
        } => cmd_frontier(&records, config.as_deref(), &dims, json),
        Commands::Rank {
            records,
            config,
            json,
        } => cmd_rank(&records, config.as_deref(), json),
        Commands::Compare {
            records,
            config,
            a,
            b,
            json,
        } => cmd_compare(&records, config.as_deref(), &a, &b, json),
        Commands::Complexity {
            trace,
            config,
            json,
        } => cmd_complexity(&trace, config.as_deref(), json),
        Commands::Constraints {
            records,
            config,
            json,
        } => cmd_constraints(&records, &config, json),
        Commands::Project {
            records,
            config,
            x,
            y,
            json,
        } => cmd_project(&records, config.as_deref(), &x, &y, json),
    };

    METRICS.flush();
    result
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(p) => AnalysisConfig::load(p)
            .with_context(|| format!("Failed to load config: {:?}", p)),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_records(path: &Path, registry: &DimensionRegistry) -> Result<Vec<MetricRecord>> {
    let raw: Vec<RawMetricRecord> = read_json_file(path)?;
    let records = validate_records(registry, raw)
        .with_context(|| format!("Invalid metric record in {:?}", path))?;
    info!(records = records.len(), path = ?path, "records loaded");
    Ok(records)
}

fn find<'a>(records: &'a [MetricRecord], agent_id: &str) -> Result<&'a MetricRecord> {
    match records.iter().find(|r| r.agent_id() == agent_id) {
        Some(r) => Ok(r),
        None => bail!("No record with agent_id '{}'", agent_id),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_analyze(
    records: &Path,
    config: Option<&Path>,
    json: bool,
    out: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let registry = config.registry()?;
    let records = load_records(records, &registry)?;
    let report = build_report(&registry, &records, &config)?;

    if let Some(dir) = out {
        let path = write_report_artifact(&ReportArtifact::new(report.clone()), dir)
            .with_context(|| format!("Failed to write report artifact to {:?}", dir))?;
        info!(path = %path.display(), "report artifact written");
    }

    if json {
        print_json(&report)
    } else {
        println!("{}", render_report_text(&report));
        Ok(())
    }
}

fn cmd_frontier(records: &Path, config: Option<&Path>, dims: &[String], json: bool) -> Result<()> {
    let config = load_config(config)?;
    let full = config.registry()?;
    let records = load_records(records, &full)?;
    let registry = if dims.is_empty() {
        full
    } else {
        let names: Vec<&str> = dims.iter().map(String::as_str).collect();
        full.project(&names)?
    };
    let frontier = compute_frontier_with(&registry, &records, &config.parallel);

    if json {
        print_json(&frontier)
    } else {
        println!("{}", render_frontier_text(&registry, &frontier, records.len()));
        Ok(())
    }
}

fn cmd_rank(records: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let registry = config.registry()?;
    let records = load_records(records, &registry)?;
    let ranking = rank_by_dominance(&registry, &records);

    if json {
        print_json(&ranking.to_id_map())
    } else {
        println!("{}", render_ranking_text(&ranking));
        Ok(())
    }
}

fn cmd_compare(records: &Path, config: Option<&Path>, a: &str, b: &str, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let registry = config.registry()?;
    let records = load_records(records, &registry)?;
    let cmp = compare(&registry, find(&records, a)?, find(&records, b)?);

    if json {
        print_json(&cmp)
    } else {
        println!("{}", render_comparison_text(&cmp));
        Ok(())
    }
}

fn cmd_complexity(trace: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let model = &config.complexity;
    let value: Value = read_json_file(trace)?;

    match value {
        Value::Array(items) => {
            let traces: Vec<ExecutionTrace> =
                items.iter().map(ExecutionTrace::from_value).collect();
            let summary = model.batch_analyze(&traces);
            if json {
                print_json(&summary)
            } else {
                println!("{}", render_batch_text(&summary));
                Ok(())
            }
        }
        other => {
            let analysis = model.analyze(&ExecutionTrace::from_value(&other));
            if json {
                print_json(&analysis)
            } else {
                println!("{}", render_complexity_text(&analysis));
                Ok(())
            }
        }
    }
}

fn cmd_constraints(records: &Path, config: &Path, json: bool) -> Result<()> {
    let config = load_config(Some(config))?;
    let Some(budget) = config.budget.as_ref() else {
        bail!("Config has no [budget] section");
    };
    let registry = config.registry()?;
    let records = load_records(records, &registry)?;
    let refs: Vec<&MetricRecord> = records.iter().collect();
    let analysis = comprehensive_analysis(&registry, &refs, budget)?;

    if json {
        print_json(&analysis)
    } else {
        println!("{}", render_constraints_text(&analysis));
        Ok(())
    }
}

fn cmd_project(records: &Path, config: Option<&Path>, x: &str, y: &str, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let registry = config.registry()?;
    let records = load_records(records, &registry)?;
    let projection = project_2d(&registry, &records, &ProjectionSpec::new(x, y))?;

    if json {
        print_json(&projection)
    } else {
        println!("{}", render_projection_text(&projection));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn format_values(registry: &DimensionRegistry, record: &MetricRecord) -> String {
    registry
        .iter()
        .filter_map(|spec| record.get(&spec.name).map(|v| format!("{}={}", spec.name, v)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_frontier_text(
    registry: &DimensionRegistry,
    frontier: &[&MetricRecord],
    total: usize,
) -> String {
    let mut out = format!("Frontier: {} of {} records\n", frontier.len(), total);
    for record in frontier {
        let _ = writeln!(out, "  {:<20} {}", record.agent_id(), format_values(registry, record));
    }
    out.trim_end().to_string()
}

fn render_ranking_text(ranking: &Ranking<'_>) -> String {
    if ranking.is_empty() {
        return "No records".to_string();
    }
    let mut out = String::new();
    for (k, tier) in ranking.tiers().iter().enumerate() {
        let ids: Vec<&str> = tier.iter().map(|r| r.agent_id()).collect();
        let _ = writeln!(out, "Tier {}: {}", k, ids.join(", "));
    }
    out.trim_end().to_string()
}

fn render_comparison_text(cmp: &Comparison) -> String {
    let mut out = format!("{} vs {}: {:?}\n", cmp.a, cmp.b, cmp.relation);
    for d in &cmp.deltas {
        let _ = writeln!(
            out,
            "  {:<16} {:>12} {:>12}  delta={:+} favors={:?}",
            d.dimension, d.a, d.b, d.delta, d.favors
        );
    }
    out.trim_end().to_string()
}

fn render_complexity_text(analysis: &ComplexityAnalysis) -> String {
    let c = &analysis.complexity;
    let over = &analysis.over_reasoning;
    let mut out = String::new();
    let _ = writeln!(out, "Score: {:.4} ({})", analysis.score, analysis.tier);
    let _ = writeln!(
        out,
        "  prompt_length={} reasoning_steps={} tool_calls={} wall_clock_ms={} context_size={}",
        c.prompt_length, c.reasoning_steps, c.tool_calls, c.wall_clock_ms, c.context_size
    );
    let _ = write!(
        out,
        "  reasoning ratio {:.2} vs baseline {} (threshold {}): {}",
        over.ratio,
        over.expected_steps,
        over.threshold,
        if over.over_reasoning {
            "OVER-REASONING"
        } else {
            "ok"
        }
    );
    out
}

fn render_batch_text(summary: &BatchSummary) -> String {
    let s = &summary.scores;
    let mut out = format!("Tasks: {}\n", summary.total_tasks);
    let _ = writeln!(
        out,
        "  score mean={:.4} std={:.4} min={:.4} median={:.4} max={:.4}",
        s.mean, s.std, s.min, s.median, s.max
    );
    for (tier, count) in &summary.tier_distribution {
        let _ = writeln!(out, "  {:<10} {}", tier.as_str(), count);
    }
    let _ = write!(out, "  over-reasoning: {}", summary.over_reasoning_count);
    out
}

fn render_constraints_text(analysis: &ComprehensiveAnalysis<'_>) -> String {
    let mut out = format!("Budget: {}\n", analysis.budget);
    for e in &analysis.evaluations {
        let _ = writeln!(
            out,
            "  {:<16} limit={} feasible={} infeasible={} unmeasured={}",
            e.dimension,
            e.limit,
            e.feasible.len(),
            e.infeasible.len(),
            e.unmeasured.len()
        );
    }
    for x in &analysis.exclusions {
        let reasons: Vec<String> = x
            .violations
            .iter()
            .map(|v| match v.value {
                Some(value) => format!("{}={} (limit {})", v.dimension, value, v.limit),
                None => format!("{} unmeasured", v.dimension),
            })
            .collect();
        let _ = writeln!(out, "  excluded {}: {}", x.record.agent_id(), reasons.join(", "));
    }
    match &analysis.recommendation {
        Recommendation::Feasible { knee } => {
            let _ = write!(
                out,
                "Recommendation: {} (distance {:.4})",
                knee.agent_id(),
                knee.distance
            );
        }
        Recommendation::NoFeasibleCandidate { evaluated, .. } => {
            let _ = write!(out, "No feasible candidate among {} records", evaluated);
        }
    }
    out
}

fn render_projection_text(projection: &Projection) -> String {
    let mut out = format!("{} ({} x {})\n", projection.name, projection.x_dim, projection.y_dim);
    for p in &projection.points {
        let marker = if p.is_frontier { "*" } else { " " };
        let _ = writeln!(out, "  {} {:<20} {:>12} {:>12}", marker, p.agent_id, p.x, p.y);
    }
    out.trim_end().to_string()
}

fn render_report_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Records:  {}", report.total_records);
    let _ = writeln!(out, "Frontier: {}", report.frontier.join(", "));
    for (k, ids) in &report.ranks {
        let _ = writeln!(out, "Tier {}:   {}", k, ids.join(", "));
    }
    match &report.knee_point {
        Some(knee) => {
            let _ = writeln!(out, "Knee:     {} (distance {:.4})", knee.agent_id, knee.distance);
        }
        None => {
            let _ = writeln!(out, "Knee:     -");
        }
    }
    if let Some(c) = &report.constraints {
        let pick = c
            .recommendation
            .as_ref()
            .map_or("no feasible candidate", |k| k.agent_id.as_str());
        let _ = writeln!(
            out,
            "Budget {}: {} feasible, recommendation {}",
            c.budget,
            c.feasible.len(),
            pick
        );
    }
    for p in &report.projections {
        let _ = writeln!(out, "View {}: frontier {}", p.name, p.frontier_ids().join(", "));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenbench_core::{Budget, ACCURACY, CARBON_KG, ENERGY_KWH, LATENCY_MS};

    const RECORDS: &str = r#"[
        {"agent_id": "A", "accuracy": 0.95, "energy_kwh": 0.005, "carbon_kg": 0.002, "latency_ms": 100},
        {"agent_id": "B", "accuracy": 0.90, "energy_kwh": 0.002, "carbon_kg": 0.001, "latency_ms": 100},
        {"agent_id": "C", "accuracy": 0.80, "energy_kwh": 0.008, "carbon_kg": 0.004, "latency_ms": 100}
    ]"#;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn load_records_validates_against_registry() {
        let dir = tempfile::tempdir().unwrap();
        let reg = DimensionRegistry::standard();

        let ok = write(dir.path(), "ok.json", RECORDS);
        assert_eq!(load_records(&ok, &reg).unwrap().len(), 3);

        let bad = write(
            dir.path(),
            "bad.json",
            r#"[{"agent_id": "x", "accuracy": 1.5, "energy_kwh": 0, "carbon_kg": 0, "latency_ms": 1}]"#,
        );
        let err = load_records(&bad, &reg).unwrap_err();
        assert!(format!("{err:#}").contains("accuracy"));

        let missing = dir.path().join("absent.json");
        assert!(load_records(&missing, &reg).is_err());
    }

    #[test]
    fn frontier_text_lists_members() {
        let reg = DimensionRegistry::standard();
        let raw: Vec<RawMetricRecord> = serde_json::from_str(RECORDS).unwrap();
        let records = validate_records(&reg, raw).unwrap();
        let frontier = compute_frontier_with(&reg, &records, &Default::default());

        let text = render_frontier_text(&reg, &frontier, records.len());
        assert!(text.starts_with("Frontier: 2 of 3 records"));
        assert!(text.contains("A"));
        assert!(text.contains("B"));
        assert!(!text.contains("C "));
    }

    #[test]
    fn ranking_and_comparison_text() {
        let reg = DimensionRegistry::standard();
        let raw: Vec<RawMetricRecord> = serde_json::from_str(RECORDS).unwrap();
        let records = validate_records(&reg, raw).unwrap();

        let text = render_ranking_text(&rank_by_dominance(&reg, &records));
        assert_eq!(text, "Tier 0: A, B\nTier 1: C");

        let cmp = compare(&reg, find(&records, "B").unwrap(), find(&records, "C").unwrap());
        let text = render_comparison_text(&cmp);
        assert!(text.starts_with("B vs C: ADominates"));
        assert!(text.contains(ACCURACY));
        assert!(text.contains(LATENCY_MS));

        assert!(find(&records, "nobody").is_err());
    }

    #[test]
    fn constraints_text_reports_missing_candidate() {
        let reg = DimensionRegistry::standard();
        let raw: Vec<RawMetricRecord> = serde_json::from_str(RECORDS).unwrap();
        let records = validate_records(&reg, raw).unwrap();
        let refs: Vec<&MetricRecord> = records.iter().collect();

        let budget = Budget::new("strict").with_limit(ENERGY_KWH, 0.0001);
        let analysis = comprehensive_analysis(&reg, &refs, &budget).unwrap();
        let text = render_constraints_text(&analysis);
        assert!(text.contains("No feasible candidate among 3 records"));
        assert!(text.contains("excluded A"));

        let budget = Budget::new("carbon").with_limit(CARBON_KG, 0.0015);
        let analysis = comprehensive_analysis(&reg, &refs, &budget).unwrap();
        assert!(render_constraints_text(&analysis).contains("Recommendation: B"));
    }

    #[test]
    fn analyze_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let records = write(dir.path(), "records.json", RECORDS);
        let out = dir.path().join("out");

        cmd_analyze(&records, None, true, Some(&out)).unwrap();
        let artifact = greenbench_core::read_report_artifact(&out).unwrap();
        assert_eq!(artifact.report.frontier, vec!["A", "B"]);
    }

    #[test]
    fn complexity_accepts_object_and_array() {
        let dir = tempfile::tempdir().unwrap();
        let single = write(
            dir.path(),
            "trace.json",
            r#"{"prompt": "sum these numbers", "reasoning": ["add"], "execution_time_ms": 12.5}"#,
        );
        let batch = write(
            dir.path(),
            "traces.json",
            r#"[{"prompt": "a"}, {"reasoning": "One. Two."}]"#,
        );
        cmd_complexity(&single, None, false).unwrap();
        cmd_complexity(&batch, None, true).unwrap();
    }

    #[test]
    fn constraints_requires_budget_section() {
        let dir = tempfile::tempdir().unwrap();
        let records = write(dir.path(), "records.json", RECORDS);
        let config = write(dir.path(), "empty.toml", "");
        let err = cmd_constraints(&records, &config, false).unwrap_err();
        assert!(err.to_string().contains("[budget]"));
    }

    #[test]
    fn project_text_marks_frontier() {
        let reg = DimensionRegistry::standard();
        let raw: Vec<RawMetricRecord> = serde_json::from_str(RECORDS).unwrap();
        let records = validate_records(&reg, raw).unwrap();
        let view = project_2d(&reg, &records, &ProjectionSpec::new(ACCURACY, ENERGY_KWH)).unwrap();
        let text = render_projection_text(&view);
        assert!(text.starts_with("accuracy_vs_energy_kwh"));
        assert_eq!(text.matches('*').count(), 2);
    }
}
