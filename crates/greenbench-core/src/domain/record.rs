//! Metric records: one agent's measured performance, validated once at
//! construction and immutable afterwards.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::dimension::DimensionRegistry;
use super::error::ValidationError;

/// Unvalidated record as produced by the execution harness.
///
/// JSON shape is flat: `{"agent_id": "a", "accuracy": 0.9, "energy_kwh": 0.01, ...}`.
/// A `null` value is treated as "not measured".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetricRecord {
    pub agent_id: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

/// Immutable snapshot of one agent's measured performance.
///
/// Construction goes through [`MetricRecord::new`] or
/// [`MetricRecord::from_raw`], which check every value against the
/// registry. There is no way to mutate a record afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    agent_id: String,
    #[serde(flatten)]
    values: BTreeMap<String, f64>,
}

impl MetricRecord {
    /// Validate and build a record.
    ///
    /// # Errors
    ///
    /// - `EmptyAgentId`: `agent_id` is blank.
    /// - `UnknownDimension`: a key is not declared in `registry`.
    /// - `NonFinite`: a value is NaN or infinite.
    /// - `OutOfDomain`: a value is outside the dimension's domain.
    /// - `MissingDimension`: a required dimension is absent.
    pub fn new<I, S>(
        registry: &DimensionRegistry,
        agent_id: &str,
        values: I,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        if agent_id.trim().is_empty() {
            return Err(ValidationError::EmptyAgentId);
        }

        let mut checked = BTreeMap::new();
        for (name, value) in values {
            let name = name.into();
            let spec = registry
                .get(&name)
                .ok_or_else(|| ValidationError::UnknownDimension {
                    agent_id: agent_id.to_string(),
                    dimension: name.clone(),
                })?;
            if !value.is_finite() {
                return Err(ValidationError::NonFinite {
                    agent_id: agent_id.to_string(),
                    dimension: name,
                });
            }
            if !spec.domain.contains(value) {
                return Err(ValidationError::OutOfDomain {
                    agent_id: agent_id.to_string(),
                    dimension: name,
                    value,
                    domain: spec.domain.describe().to_string(),
                });
            }
            checked.insert(name, value);
        }

        if let Some(missing) = registry
            .iter()
            .find(|s| s.required && !checked.contains_key(&s.name))
        {
            return Err(ValidationError::MissingDimension {
                agent_id: agent_id.to_string(),
                dimension: missing.name.clone(),
            });
        }

        Ok(Self {
            agent_id: agent_id.to_string(),
            values: checked,
        })
    }

    /// Validate a raw harness record. `null` values count as absent.
    pub fn from_raw(
        registry: &DimensionRegistry,
        raw: RawMetricRecord,
    ) -> Result<Self, ValidationError> {
        let present = raw
            .values
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)));
        Self::new(registry, &raw.agent_id, present)
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Value of `dimension`, if measured.
    pub fn get(&self, dimension: &str) -> Option<f64> {
        self.values.get(dimension).copied()
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }
}

/// Reject comparison sets in which two records share an `agent_id`.
pub fn ensure_unique_ids<'a, I>(records: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.agent_id()) {
            return Err(ValidationError::DuplicateAgentId {
                agent_id: record.agent_id().to_string(),
            });
        }
    }
    Ok(())
}

/// Validate a batch of raw records into a comparison set with unique ids.
pub fn validate_records(
    registry: &DimensionRegistry,
    raw: Vec<RawMetricRecord>,
) -> Result<Vec<MetricRecord>, ValidationError> {
    let records = raw
        .into_iter()
        .map(|r| MetricRecord::from_raw(registry, r))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique_ids(&records)?;
    Ok(records)
}

/// `serialize_with` helpers that write borrowed records as their agent ids.
pub mod as_ids {
    use serde::ser::SerializeSeq;
    use serde::Serializer;

    use super::MetricRecord;

    pub fn serialize<S: Serializer>(records: &[&MetricRecord], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(records.len()))?;
        for record in records {
            seq.serialize_element(record.agent_id())?;
        }
        seq.end()
    }

    pub fn serialize_opt<S: Serializer>(
        record: &Option<&MetricRecord>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match record {
            Some(r) => s.serialize_some(r.agent_id()),
            None => s.serialize_none(),
        }
    }

    pub fn serialize_one<S: Serializer>(record: &&MetricRecord, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(record.agent_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dimension::{ACCURACY, CARBON_KG, ENERGY_KWH, LATENCY_MS, MEMORY_MB};

    fn core(acc: f64, energy: f64) -> Vec<(&'static str, f64)> {
        vec![
            (ACCURACY, acc),
            (ENERGY_KWH, energy),
            (CARBON_KG, 0.001),
            (LATENCY_MS, 120.0),
        ]
    }

    #[test]
    fn valid_record_builds() {
        let reg = DimensionRegistry::standard();
        let rec = MetricRecord::new(&reg, "agent_a", core(0.95, 0.003)).unwrap();
        assert_eq!(rec.agent_id(), "agent_a");
        assert_eq!(rec.get(ACCURACY), Some(0.95));
        assert_eq!(rec.get(MEMORY_MB), None);
    }

    #[test]
    fn negative_energy_is_rejected_not_clamped() {
        let reg = DimensionRegistry::standard();
        let err = MetricRecord::new(&reg, "bad", core(0.9, -0.001)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfDomain { ref dimension, .. } if dimension == ENERGY_KWH
        ));
    }

    #[test]
    fn accuracy_outside_unit_interval_is_rejected() {
        let reg = DimensionRegistry::standard();
        let err = MetricRecord::new(&reg, "bad", core(1.2, 0.001)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfDomain { .. }));
    }

    #[test]
    fn missing_required_dimension_is_rejected() {
        let reg = DimensionRegistry::standard();
        let err = MetricRecord::new(&reg, "a", vec![(ACCURACY, 0.9)]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingDimension {
                agent_id: "a".to_string(),
                dimension: ENERGY_KWH.to_string(),
            }
        );
    }

    #[test]
    fn unknown_dimension_is_rejected() {
        let reg = DimensionRegistry::standard();
        let mut values = core(0.9, 0.001);
        values.push(("gpu_util", 0.5));
        let err = MetricRecord::new(&reg, "a", values).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownDimension { .. }));
    }

    #[test]
    fn nan_is_rejected() {
        let reg = DimensionRegistry::standard();
        let err = MetricRecord::new(&reg, "a", core(0.9, f64::NAN)).unwrap_err();
        assert!(matches!(err, ValidationError::NonFinite { .. }));
    }

    #[test]
    fn raw_json_with_null_optional_parses() {
        let reg = DimensionRegistry::standard();
        let raw: RawMetricRecord = serde_json::from_str(
            r#"{"agent_id":"a","accuracy":0.9,"energy_kwh":0.01,"carbon_kg":0.002,"latency_ms":80,"memory_mb":null}"#,
        )
        .unwrap();
        let rec = MetricRecord::from_raw(&reg, raw).unwrap();
        assert_eq!(rec.get(MEMORY_MB), None);
        assert_eq!(rec.get(LATENCY_MS), Some(80.0));
    }

    #[test]
    fn record_serializes_flat() {
        let reg = DimensionRegistry::standard();
        let rec = MetricRecord::new(&reg, "a", core(0.9, 0.01)).unwrap();
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["agent_id"], "a");
        assert_eq!(v["accuracy"], 0.9);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let reg = DimensionRegistry::standard();
        let a = MetricRecord::new(&reg, "a", core(0.9, 0.01)).unwrap();
        let b = MetricRecord::new(&reg, "a", core(0.8, 0.02)).unwrap();
        let err = ensure_unique_ids([&a, &b]).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateAgentId { .. }));
    }
}
