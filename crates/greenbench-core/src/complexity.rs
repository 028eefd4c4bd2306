//! Task complexity normalization.
//!
//! Derives a [`TaskComplexity`] from an [`ExecutionTrace`], folds it into a
//! composite score, places the score in a tier and divides raw cost metrics
//! by the score so tasks of unequal difficulty can be compared.
//!
//! Each field enters the composite score as `ln(1 + x)`, so a single large
//! field (wall clock in milliseconds, say) cannot swamp the others.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ConfigError, DimensionRegistry, Direction, ExecutionTrace, MetricRecord};

/// Floor applied to the composite score before dividing by it.
pub const SCORE_EPSILON: f64 = 1e-6;

/// Allowed deviation of a weight vector's sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

pub const DEFAULT_OVER_REASONING_THRESHOLD: f64 = 2.0;

const FIELDS: [&str; 5] = [
    "prompt_length",
    "reasoning_steps",
    "tool_calls",
    "wall_clock_ms",
    "context_size",
];

// ---------------------------------------------------------------------------
// Task complexity
// ---------------------------------------------------------------------------

/// Difficulty signals extracted from one execution trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskComplexity {
    /// Whitespace-separated words in the prompt.
    pub prompt_length: u64,
    pub reasoning_steps: u64,
    pub tool_calls: u64,
    pub wall_clock_ms: f64,
    pub context_size: u64,
}

impl TaskComplexity {
    /// Extract complexity from a trace. Missing fields count as zero.
    pub fn analyze_from_trace(trace: &ExecutionTrace) -> Self {
        Self {
            prompt_length: trace
                .prompt
                .as_deref()
                .map_or(0, |p| p.split_whitespace().count() as u64),
            reasoning_steps: trace.reasoning.len() as u64,
            tool_calls: trace.tool_calls.len() as u64,
            wall_clock_ms: trace.execution_time_ms.unwrap_or(0.0),
            context_size: trace.context_tokens.unwrap_or(0),
        }
    }

    /// Log-scaled field values in [`FIELDS`] order.
    fn scaled(&self) -> [f64; 5] {
        [
            (self.prompt_length as f64).ln_1p(),
            (self.reasoning_steps as f64).ln_1p(),
            (self.tool_calls as f64).ln_1p(),
            self.wall_clock_ms.max(0.0).ln_1p(),
            (self.context_size as f64).ln_1p(),
        ]
    }

    /// Weighted composite score.
    ///
    /// # Errors
    ///
    /// Fails with a [`ConfigError`] if `weights` are negative or do not sum
    /// to 1.0 within [`WEIGHT_TOLERANCE`]; nothing is scored in that case.
    pub fn compute_composite_score(&self, weights: &ComplexityWeights) -> Result<f64, ConfigError> {
        weights.validate()?;
        Ok(self.weighted(weights))
    }

    /// Composite score under the default equal weights.
    pub fn composite_score(&self) -> f64 {
        self.weighted(&ComplexityWeights::default())
    }

    fn weighted(&self, weights: &ComplexityWeights) -> f64 {
        self.scaled()
            .iter()
            .zip(weights.as_array())
            .map(|(x, w)| x * w)
            .sum()
    }

    /// Signed per-field difference `self - other`.
    fn field_deltas(&self, other: &Self) -> BTreeMap<String, f64> {
        let a = self.raw();
        let b = other.raw();
        FIELDS
            .iter()
            .zip(a.iter().zip(b.iter()))
            .map(|(name, (x, y))| (name.to_string(), x - y))
            .collect()
    }

    fn raw(&self) -> [f64; 5] {
        [
            self.prompt_length as f64,
            self.reasoning_steps as f64,
            self.tool_calls as f64,
            self.wall_clock_ms,
            self.context_size as f64,
        ]
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// One non-negative weight per complexity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplexityWeights {
    pub prompt_length: f64,
    pub reasoning_steps: f64,
    pub tool_calls: f64,
    pub wall_clock_ms: f64,
    pub context_size: f64,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self {
            prompt_length: 0.2,
            reasoning_steps: 0.2,
            tool_calls: 0.2,
            wall_clock_ms: 0.2,
            context_size: 0.2,
        }
    }
}

impl ComplexityWeights {
    /// Build from a name → weight map. Fields left out weigh zero.
    pub fn from_map(map: &BTreeMap<String, f64>) -> Result<Self, ConfigError> {
        if let Some(unknown) = map.keys().find(|k| !FIELDS.contains(&k.as_str())) {
            return Err(ConfigError::UnknownWeight(unknown.clone()));
        }
        let get = |name: &str| map.get(name).copied().unwrap_or(0.0);
        let weights = Self {
            prompt_length: get("prompt_length"),
            reasoning_steps: get("reasoning_steps"),
            tool_calls: get("tool_calls"),
            wall_clock_ms: get("wall_clock_ms"),
            context_size: get("context_size"),
        };
        weights.validate()?;
        Ok(weights)
    }

    fn as_array(&self) -> [f64; 5] {
        [
            self.prompt_length,
            self.reasoning_steps,
            self.tool_calls,
            self.wall_clock_ms,
            self.context_size,
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in FIELDS.iter().zip(self.as_array()) {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    field: field.to_string(),
                    value,
                });
            }
        }
        let sum: f64 = self.as_array().iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSum {
                sum,
                tolerance: WEIGHT_TOLERANCE,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Trivial,
    Simple,
    Moderate,
    Complex,
    Extreme,
}

impl ComplexityTier {
    pub const ALL: [ComplexityTier; 5] = [
        ComplexityTier::Trivial,
        ComplexityTier::Simple,
        ComplexityTier::Moderate,
        ComplexityTier::Complex,
        ComplexityTier::Extreme,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComplexityTier::Trivial => "trivial",
            ComplexityTier::Simple => "simple",
            ComplexityTier::Moderate => "moderate",
            ComplexityTier::Complex => "complex",
            ComplexityTier::Extreme => "extreme",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Weights, tier boundaries and reasoning baselines.
///
/// `cut_points[i]` is the exclusive upper bound of tier `i`; scores at or
/// above the last cut point are `Extreme`. `expected_steps[i]` is the
/// reasoning-step baseline for tier `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityModel {
    #[serde(default)]
    pub weights: ComplexityWeights,
    #[serde(default = "ComplexityModel::default_cut_points")]
    pub cut_points: [f64; 4],
    #[serde(default = "ComplexityModel::default_expected_steps")]
    pub expected_steps: [f64; 5],
    #[serde(default = "ComplexityModel::default_threshold")]
    pub over_reasoning_threshold: f64,
}

impl Default for ComplexityModel {
    fn default() -> Self {
        Self {
            weights: ComplexityWeights::default(),
            cut_points: Self::default_cut_points(),
            expected_steps: Self::default_expected_steps(),
            over_reasoning_threshold: Self::default_threshold(),
        }
    }
}

impl ComplexityModel {
    fn default_cut_points() -> [f64; 4] {
        [1.0, 2.0, 4.0, 8.0]
    }

    fn default_expected_steps() -> [f64; 5] {
        [1.0, 2.0, 4.0, 8.0, 16.0]
    }

    fn default_threshold() -> f64 {
        DEFAULT_OVER_REASONING_THRESHOLD
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;

        let cuts = &self.cut_points;
        let ascending = cuts.windows(2).all(|w| w[0] < w[1]);
        if !ascending || cuts.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::CutPoints(cuts.to_vec()));
        }
        if self
            .expected_steps
            .iter()
            .any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err(ConfigError::ExpectedSteps(self.expected_steps.to_vec()));
        }
        let t = self.over_reasoning_threshold;
        if !t.is_finite() || t <= 0.0 {
            return Err(ConfigError::Threshold(t));
        }
        Ok(())
    }

    /// Composite score of `complexity` under this model's weights.
    pub fn score(&self, complexity: &TaskComplexity) -> f64 {
        complexity.weighted(&self.weights)
    }

    pub fn categorize_complexity(&self, score: f64) -> ComplexityTier {
        self.cut_points
            .iter()
            .position(|&cut| score < cut)
            .map_or(ComplexityTier::Extreme, |i| ComplexityTier::ALL[i])
    }

    pub fn expected_steps_for(&self, tier: ComplexityTier) -> f64 {
        self.expected_steps[tier.index()]
    }

    /// Compare actual reasoning steps against the baseline of the task's tier.
    pub fn detect_over_reasoning(
        &self,
        complexity: &TaskComplexity,
        threshold: f64,
    ) -> OverReasoningReport {
        let score = self.score(complexity);
        let tier = self.categorize_complexity(score);
        let expected_steps = self.expected_steps_for(tier);
        let ratio = complexity.reasoning_steps as f64 / expected_steps.max(SCORE_EPSILON);
        let over_reasoning = ratio > threshold;
        if over_reasoning {
            tracing::debug!(
                tier = %tier,
                steps = complexity.reasoning_steps,
                ratio = ratio,
                "over-reasoning detected"
            );
        }
        OverReasoningReport {
            tier,
            score,
            expected_steps,
            actual_steps: complexity.reasoning_steps,
            ratio,
            threshold,
            over_reasoning,
        }
    }

    /// Full analysis of one trace under this model.
    pub fn analyze(&self, trace: &ExecutionTrace) -> ComplexityAnalysis {
        let complexity = TaskComplexity::analyze_from_trace(trace);
        let over = self.detect_over_reasoning(&complexity, self.over_reasoning_threshold);
        ComplexityAnalysis {
            complexity,
            score: over.score,
            tier: over.tier,
            over_reasoning: over,
        }
    }

    pub fn compare_complexities(
        &self,
        a: &TaskComplexity,
        b: &TaskComplexity,
    ) -> ComplexityComparison {
        let score_a = self.score(a);
        let score_b = self.score(b);
        let more_complex = match score_a.partial_cmp(&score_b) {
            Some(std::cmp::Ordering::Greater) => MoreComplex::A,
            Some(std::cmp::Ordering::Less) => MoreComplex::B,
            _ => MoreComplex::Equal,
        };
        ComplexityComparison {
            score_diff: score_a - score_b,
            more_complex,
            tier_a: self.categorize_complexity(score_a),
            tier_b: self.categorize_complexity(score_b),
            field_deltas: a.field_deltas(b),
        }
    }

    /// Summary statistics over many traces. Empty input gives zeroed stats.
    pub fn batch_analyze(&self, traces: &[ExecutionTrace]) -> BatchSummary {
        let analyses: Vec<ComplexityAnalysis> = traces.iter().map(|t| self.analyze(t)).collect();

        let mut tier_distribution: BTreeMap<ComplexityTier, usize> = BTreeMap::new();
        for a in &analyses {
            *tier_distribution.entry(a.tier).or_default() += 1;
        }

        let scores: Vec<f64> = analyses.iter().map(|a| a.score).collect();
        let over_reasoning_count = analyses
            .iter()
            .filter(|a| a.over_reasoning.over_reasoning)
            .count();

        BatchSummary {
            total_tasks: analyses.len(),
            scores: ScoreStats::from_scores(&scores),
            tier_distribution,
            over_reasoning_count,
            analyses,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverReasoningReport {
    pub tier: ComplexityTier,
    pub score: f64,
    pub expected_steps: f64,
    pub actual_steps: u64,
    pub ratio: f64,
    pub threshold: f64,
    pub over_reasoning: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityAnalysis {
    pub complexity: TaskComplexity,
    pub score: f64,
    pub tier: ComplexityTier,
    pub over_reasoning: OverReasoningReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoreComplex {
    A,
    B,
    Equal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityComparison {
    /// `score(a) - score(b)`.
    pub score_diff: f64,
    pub more_complex: MoreComplex,
    pub tier_a: ComplexityTier,
    pub tier_b: ComplexityTier,
    pub field_deltas: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

impl ScoreStats {
    fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            mean,
            std: var.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_tasks: usize,
    pub scores: ScoreStats,
    pub tier_distribution: BTreeMap<ComplexityTier, usize>,
    pub over_reasoning_count: usize,
    pub analyses: Vec<ComplexityAnalysis>,
}

// ---------------------------------------------------------------------------
// Efficiency normalization
// ---------------------------------------------------------------------------

/// `value / max(score, SCORE_EPSILON)`.
pub fn complexity_normalized(value: f64, score: f64) -> f64 {
    value / score.max(SCORE_EPSILON)
}

/// Complexity-adjusted value of every cost dimension `record` measures.
pub fn normalize_efficiency(
    registry: &DimensionRegistry,
    record: &MetricRecord,
    score: f64,
) -> BTreeMap<String, f64> {
    registry
        .iter()
        .filter(|spec| spec.direction == Direction::Minimize)
        .filter_map(|spec| {
            record
                .get(&spec.name)
                .map(|v| (spec.name.clone(), complexity_normalized(v, score)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complexity(prompt: u64, steps: u64, tools: u64) -> TaskComplexity {
        TaskComplexity {
            prompt_length: prompt,
            reasoning_steps: steps,
            tool_calls: tools,
            ..TaskComplexity::default()
        }
    }

    #[test]
    fn empty_trace_is_zero_complexity() {
        let c = TaskComplexity::analyze_from_trace(&ExecutionTrace::default());
        assert_eq!(c, TaskComplexity::default());
        assert_eq!(c.composite_score(), 0.0);
    }

    #[test]
    fn trace_fields_are_counted() {
        let trace = ExecutionTrace::from_value(&json!({
            "prompt": "classify the image below",
            "reasoning": ["load", "preprocess", "predict"],
            "tool_calls": [{"tool": "vision"}],
            "execution_time_ms": 1500.0,
            "context_tokens": 512
        }));
        let c = TaskComplexity::analyze_from_trace(&trace);
        assert_eq!(c.prompt_length, 4);
        assert_eq!(c.reasoning_steps, 3);
        assert_eq!(c.tool_calls, 1);
        assert_eq!(c.wall_clock_ms, 1500.0);
        assert_eq!(c.context_size, 512);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let c = complexity(10, 3, 1);
        let bad = ComplexityWeights {
            prompt_length: 0.5,
            ..ComplexityWeights::default()
        };
        assert!(matches!(
            c.compute_composite_score(&bad),
            Err(ConfigError::WeightSum { .. })
        ));

        let negative = ComplexityWeights {
            prompt_length: 0.6,
            reasoning_steps: -0.2,
            ..ComplexityWeights::default()
        };
        assert!(matches!(
            c.compute_composite_score(&negative),
            Err(ConfigError::InvalidWeight { .. })
        ));

        let ok = c.compute_composite_score(&ComplexityWeights::default()).unwrap();
        assert!((ok - c.composite_score()).abs() < 1e-12);
    }

    #[test]
    fn weights_from_map() {
        let mut map = BTreeMap::new();
        map.insert("reasoning_steps".to_string(), 1.0);
        let w = ComplexityWeights::from_map(&map).unwrap();
        assert_eq!(w.reasoning_steps, 1.0);
        assert_eq!(w.prompt_length, 0.0);

        map.insert("vibes".to_string(), 0.0);
        assert_eq!(
            ComplexityWeights::from_map(&map),
            Err(ConfigError::UnknownWeight("vibes".to_string()))
        );
    }

    #[test]
    fn tiers_follow_cut_points() {
        let model = ComplexityModel::default();
        assert_eq!(model.categorize_complexity(0.0), ComplexityTier::Trivial);
        assert_eq!(model.categorize_complexity(0.99), ComplexityTier::Trivial);
        assert_eq!(model.categorize_complexity(1.0), ComplexityTier::Simple);
        assert_eq!(model.categorize_complexity(3.9), ComplexityTier::Moderate);
        assert_eq!(model.categorize_complexity(4.0), ComplexityTier::Complex);
        assert_eq!(model.categorize_complexity(8.0), ComplexityTier::Extreme);
        assert_eq!(model.categorize_complexity(1e9), ComplexityTier::Extreme);
    }

    #[test]
    fn model_validation() {
        assert!(ComplexityModel::default().validate().is_ok());

        let unsorted = ComplexityModel {
            cut_points: [1.0, 4.0, 2.0, 8.0],
            ..ComplexityModel::default()
        };
        assert!(matches!(unsorted.validate(), Err(ConfigError::CutPoints(_))));

        let zero_baseline = ComplexityModel {
            expected_steps: [0.0, 2.0, 4.0, 8.0, 16.0],
            ..ComplexityModel::default()
        };
        assert!(matches!(
            zero_baseline.validate(),
            Err(ConfigError::ExpectedSteps(_))
        ));

        let bad_threshold = ComplexityModel {
            over_reasoning_threshold: -1.0,
            ..ComplexityModel::default()
        };
        assert_eq!(bad_threshold.validate(), Err(ConfigError::Threshold(-1.0)));
    }

    #[test]
    fn over_reasoning_uses_tier_baseline() {
        let model = ComplexityModel::default();
        // 0.2 * (ln 4 + ln 11 + ln 4) ≈ 1.03 → simple, baseline 2
        let c = complexity(3, 10, 3);
        let report = model.detect_over_reasoning(&c, 2.0);
        assert_eq!(report.tier, ComplexityTier::Simple);
        assert_eq!(report.expected_steps, 2.0);
        assert_eq!(report.ratio, 5.0);
        assert!(report.over_reasoning);

        let calm = model.detect_over_reasoning(&complexity(3, 2, 3), 2.0);
        assert!(!calm.over_reasoning);
    }

    #[test]
    fn zero_score_is_floored() {
        assert_eq!(complexity_normalized(2.0, 0.0), 2.0 / SCORE_EPSILON);
        assert!(complexity_normalized(2.0, 0.0).is_finite());
        assert_eq!(complexity_normalized(2.0, 4.0), 0.5);
    }

    #[test]
    fn compare_and_batch() {
        let model = ComplexityModel::default();
        let big = complexity(500, 20, 5);
        let small = complexity(5, 1, 0);
        let cmp = model.compare_complexities(&big, &small);
        assert_eq!(cmp.more_complex, MoreComplex::A);
        assert!(cmp.score_diff > 0.0);
        assert_eq!(cmp.field_deltas["prompt_length"], 495.0);
        assert_eq!(model.compare_complexities(&small, &small).more_complex, MoreComplex::Equal);

        let summary = model.batch_analyze(&[]);
        assert_eq!(summary.total_tasks, 0);
        assert_eq!(summary.scores, ScoreStats::default());

        let traces = vec![
            ExecutionTrace::default(),
            ExecutionTrace::from_value(&json!({"reasoning": ["a", "b"], "prompt": "x y z"})),
            ExecutionTrace::from_value(&json!({"execution_time_ms": 5000.0})),
        ];
        let summary = model.batch_analyze(&traces);
        assert_eq!(summary.total_tasks, 3);
        assert_eq!(summary.scores.min, 0.0);
        assert!(summary.scores.max >= summary.scores.median);
        assert_eq!(summary.tier_distribution.values().sum::<usize>(), 3);
    }
}
