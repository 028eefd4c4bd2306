use greenbench_core::report::report_digest;
use greenbench_core::{
    build_report, read_report_artifact, write_report_artifact, AnalysisConfig, Budget,
    DimensionRegistry, GreenbenchError, MetricRecord, RawMetricRecord, ReportArtifact,
};
use tempfile::tempdir;

const RECORDS: &str = r#"[
    {"agent_id": "A", "accuracy": 0.95, "energy_kwh": 0.005, "carbon_kg": 0.0025, "latency_ms": 120, "memory_mb": 700},
    {"agent_id": "B", "accuracy": 0.90, "energy_kwh": 0.002, "carbon_kg": 0.0010, "latency_ms": 140, "memory_mb": 300},
    {"agent_id": "C", "accuracy": 0.80, "energy_kwh": 0.008, "carbon_kg": 0.0040, "latency_ms": 160, "memory_mb": 350}
]"#;

fn load(reg: &DimensionRegistry) -> Vec<MetricRecord> {
    let raw: Vec<RawMetricRecord> = serde_json::from_str(RECORDS).unwrap();
    greenbench_core::validate_records(reg, raw).unwrap()
}

fn config() -> AnalysisConfig {
    AnalysisConfig {
        budget: Some(Budget::new("edge").with_max_memory_mb(512.0)),
        ..AnalysisConfig::default()
    }
}

#[test]
fn report_contains_every_section() {
    let reg = DimensionRegistry::standard();
    let records = load(&reg);
    let report = build_report(&reg, &records, &config()).unwrap();

    assert_eq!(report.frontier, vec!["A", "B"]);
    assert_eq!(report.ranks.len(), 2);
    assert_eq!(report.ranks[&0], vec!["A", "B"]);
    assert_eq!(report.ranks[&1], vec!["C"]);
    assert!(report.knee_point.is_some());

    let constraints = report.constraints.as_ref().unwrap();
    assert_eq!(constraints.feasible, vec!["B", "C"]);
    assert_eq!(constraints.feasible_frontier, vec!["B"]);
    assert_eq!(
        constraints.recommendation.as_ref().map(|k| k.agent_id.as_str()),
        Some("B")
    );

    let names: Vec<&str> = report.projections.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "accuracy_vs_carbon_kg",
            "latency_ms_vs_energy_kwh",
            "carbon_kg_vs_energy_kwh"
        ]
    );
    assert!(report.projections.iter().all(|p| p.points.len() == 3));
}

#[test]
fn report_is_stable_under_repeated_calls() {
    let reg = DimensionRegistry::standard();
    let records = load(&reg);
    let first = build_report(&reg, &records, &config()).unwrap();
    let second = build_report(&reg, &records, &config()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
    assert_eq!(report_digest(&first).unwrap(), report_digest(&second).unwrap());
}

#[test]
fn artifact_round_trip() {
    let reg = DimensionRegistry::standard();
    let records = load(&reg);
    let report = build_report(&reg, &records, &config()).unwrap();
    let artifact = ReportArtifact::new(report);

    let dir = tempdir().unwrap();
    let path = write_report_artifact(&artifact, dir.path()).unwrap();
    assert!(path.ends_with("report.json"));
    assert!(dir.path().join("report.digest").exists());

    let loaded = read_report_artifact(dir.path()).unwrap();
    assert_eq!(loaded.greenbench_version, greenbench_core::VERSION);
    assert_eq!(loaded.generated_at, artifact.generated_at);
    assert_eq!(loaded.report.frontier, artifact.report.frontier);
    assert_eq!(loaded.report.ranks, artifact.report.ranks);
}

#[test]
fn tampered_artifact_is_rejected() {
    let reg = DimensionRegistry::standard();
    let records = load(&reg);
    let artifact = ReportArtifact::new(build_report(&reg, &records, &config()).unwrap());

    let dir = tempdir().unwrap();
    let path = write_report_artifact(&artifact, dir.path()).unwrap();
    let original = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, original.replace("\"C\"", "\"Z\"")).unwrap();

    let err = read_report_artifact(dir.path()).unwrap_err();
    assert!(matches!(err, GreenbenchError::DigestMismatch { .. }));
}

#[test]
fn missing_artifact_is_io_error() {
    let dir = tempdir().unwrap();
    let err = read_report_artifact(dir.path()).unwrap_err();
    assert!(matches!(err, GreenbenchError::Io(_)));
}
