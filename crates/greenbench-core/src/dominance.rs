//! Pairwise dominance between metric records.
//!
//! `a` dominates `b` when it is at least as good on every shared dimension
//! and strictly better on at least one. Records equal on every shared
//! dimension are tied: neither dominates.
//!
//! Collection scans in [`crate::frontier`] pass a registry narrowed to the
//! dimensions all scanned records measure, so a pair never gets compared
//! on a dimension that a third record lacks.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::{DimensionRegistry, Direction, MetricRecord};

/// Outcome of comparing two records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    ADominates,
    BDominates,
    NonComparable,
}

/// Which side a single dimension favors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Favors {
    A,
    B,
    Tie,
}

/// Per-dimension explanation of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDelta {
    pub dimension: String,
    pub direction: Direction,
    pub a: f64,
    pub b: f64,
    /// Raw `a - b`.
    pub delta: f64,
    /// Direction-aware difference; positive when `a` is better.
    pub advantage: f64,
    pub favors: Favors,
}

/// Relation plus the per-dimension deltas that justify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub a: String,
    pub b: String,
    pub relation: Relation,
    pub deltas: Vec<DimensionDelta>,
}

impl Comparison {
    /// True when the records are equal on every shared dimension.
    pub fn is_tie(&self) -> bool {
        self.deltas.iter().all(|d| d.favors == Favors::Tie)
    }
}

/// Iterate `(direction, a_value, b_value)` over dimensions both records measure.
fn shared<'r>(
    registry: &'r DimensionRegistry,
    a: &'r MetricRecord,
    b: &'r MetricRecord,
) -> impl Iterator<Item = (&'r str, Direction, f64, f64)> + 'r {
    registry.iter().filter_map(move |spec| {
        let av = a.get(&spec.name)?;
        let bv = b.get(&spec.name)?;
        Some((spec.name.as_str(), spec.direction, av, bv))
    })
}

/// Whether `a` dominates `b` over the dimensions of `registry`.
pub fn dominates(registry: &DimensionRegistry, a: &MetricRecord, b: &MetricRecord) -> bool {
    let mut strictly_better = false;
    for (_, direction, av, bv) in shared(registry, a, b) {
        match direction.preference(av, bv) {
            Ordering::Less => return false,
            Ordering::Greater => strictly_better = true,
            Ordering::Equal => {}
        }
    }
    strictly_better
}

/// Compare two records and explain the result dimension by dimension.
pub fn compare(registry: &DimensionRegistry, a: &MetricRecord, b: &MetricRecord) -> Comparison {
    let mut a_better = false;
    let mut b_better = false;

    let deltas: Vec<DimensionDelta> = shared(registry, a, b)
        .map(|(name, direction, av, bv)| {
            let favors = match direction.preference(av, bv) {
                Ordering::Greater => {
                    a_better = true;
                    Favors::A
                }
                Ordering::Less => {
                    b_better = true;
                    Favors::B
                }
                Ordering::Equal => Favors::Tie,
            };
            DimensionDelta {
                dimension: name.to_string(),
                direction,
                a: av,
                b: bv,
                delta: av - bv,
                advantage: direction.advantage(av, bv),
                favors,
            }
        })
        .collect();

    let relation = match (a_better, b_better) {
        (true, false) => Relation::ADominates,
        (false, true) => Relation::BDominates,
        _ => Relation::NonComparable,
    };

    Comparison {
        a: a.agent_id().to_string(),
        b: b.agent_id().to_string(),
        relation,
        deltas,
    }
}
