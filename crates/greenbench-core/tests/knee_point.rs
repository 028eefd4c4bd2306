use greenbench_core::{
    compute_frontier, get_knee_point, DimensionRegistry, Direction, MetricRecord, ValueDomain,
    ACCURACY, CARBON_KG, ENERGY_KWH, LATENCY_MS, MEMORY_MB,
};

fn record(
    reg: &DimensionRegistry,
    id: &str,
    accuracy: f64,
    energy_kwh: f64,
    latency_ms: f64,
) -> MetricRecord {
    MetricRecord::new(
        reg,
        id,
        [
            (ACCURACY, accuracy),
            (ENERGY_KWH, energy_kwh),
            (CARBON_KG, 0.002),
            (LATENCY_MS, latency_ms),
        ],
    )
    .expect("valid record")
}

#[test]
fn knee_balances_the_frontier() {
    let reg = DimensionRegistry::standard();
    let records = vec![
        record(&reg, "max_accuracy", 0.99, 0.020, 400.0),
        record(&reg, "min_energy", 0.70, 0.001, 380.0),
        record(&reg, "balanced", 0.93, 0.004, 120.0),
        record(&reg, "dominated", 0.90, 0.005, 150.0),
    ];

    let frontier = compute_frontier(&reg, &records);
    assert_eq!(frontier.len(), 3);

    let knee = get_knee_point(&reg, &frontier).expect("non-empty frontier");
    assert_eq!(knee.agent_id(), "balanced");
    assert!(knee.distance > 0.0);
    // best latency on the frontier
    assert_eq!(knee.normalized[LATENCY_MS], 1.0);
    assert!(knee.normalized.values().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn knee_is_deterministic_across_calls() {
    let reg = DimensionRegistry::standard();
    let records = vec![
        record(&reg, "a", 1.0, 0.010, 100.0),
        record(&reg, "b", 0.5, 0.001, 100.0),
        record(&reg, "c", 0.8, 0.004, 100.0),
    ];
    let frontier = compute_frontier(&reg, &records);
    let first = get_knee_point(&reg, &frontier).unwrap();
    for _ in 0..10 {
        let again = get_knee_point(&reg, &frontier).unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn custom_maximized_dimension_is_respected() {
    let reg = DimensionRegistry::standard()
        .with_dimension("throughput", Direction::Maximize, ValueDomain::NonNegative)
        .unwrap();
    let build = |id: &str, acc: f64, throughput: f64| {
        MetricRecord::new(
            &reg,
            id,
            [
                (ACCURACY, acc),
                (ENERGY_KWH, 0.002),
                (CARBON_KG, 0.001),
                (LATENCY_MS, 100.0),
                ("throughput", throughput),
            ],
        )
        .unwrap()
    };
    let records = vec![
        build("fast", 0.80, 100.0),
        build("careful", 0.95, 10.0),
        build("both", 0.9, 80.0),
    ];

    let frontier = compute_frontier(&reg, &records);
    let knee = get_knee_point(&reg, &frontier).unwrap();
    assert_eq!(knee.agent_id(), "both");
    assert_eq!(knee.normalized["throughput"], 0.7777777777777778);
}

#[test]
fn partially_measured_dimensions_are_ignored() {
    let reg = DimensionRegistry::standard();
    let with_memory = MetricRecord::new(
        &reg,
        "with_memory",
        [
            (ACCURACY, 0.9),
            (ENERGY_KWH, 0.002),
            (CARBON_KG, 0.002),
            (LATENCY_MS, 100.0),
            (MEMORY_MB, 256.0),
        ],
    )
    .unwrap();
    let without = record(&reg, "without", 0.8, 0.001, 100.0);

    let knee = get_knee_point(&reg, &[&with_memory, &without]).unwrap();
    assert!(!knee.normalized.contains_key(MEMORY_MB));
}
