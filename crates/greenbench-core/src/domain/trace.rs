//! Execution traces consumed by the complexity normalizer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One task-execution trace.
///
/// Every field is optional; absence means zero/empty. Use
/// [`ExecutionTrace::from_value`] for harness output whose field types
/// cannot be trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    #[serde(default)]
    pub prompt: Option<String>,
    /// Ordered reasoning step entries.
    #[serde(default)]
    pub reasoning: Vec<Value>,
    /// Ordered tool invocation entries.
    #[serde(default)]
    pub tool_calls: Vec<Value>,
    #[serde(default)]
    pub execution_time_ms: Option<f64>,
    #[serde(default)]
    pub context_tokens: Option<u64>,
}

impl ExecutionTrace {
    /// Lenient extraction from arbitrary JSON. Never fails.
    ///
    /// Fields with an unexpected type fall back to empty/zero. A string
    /// `reasoning` field is split into one entry per sentence terminator
    /// (`.`, `!`, `?`).
    pub fn from_value(value: &Value) -> Self {
        let prompt = value
            .get("prompt")
            .and_then(Value::as_str)
            .map(str::to_string);

        let reasoning = match value.get("reasoning") {
            Some(Value::Array(steps)) => steps.clone(),
            Some(Value::String(text)) => text
                .split_inclusive(['.', '!', '?'])
                .filter(|s| s.ends_with(['.', '!', '?']))
                .map(|s| Value::String(s.trim().to_string()))
                .collect(),
            _ => Vec::new(),
        };

        let tool_calls = match value.get("tool_calls") {
            Some(Value::Array(calls)) => calls.clone(),
            _ => Vec::new(),
        };

        let execution_time_ms = value
            .get("execution_time_ms")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite() && *v >= 0.0);

        let context_tokens = value.get("context_tokens").and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
        });

        Self {
            prompt,
            reasoning,
            tool_calls,
            execution_time_ms,
            context_tokens,
        }
    }
}
