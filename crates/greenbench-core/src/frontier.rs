//! Frontier computation and layered dominance ranking.
//!
//! Both operate on borrowed records and return references into the input,
//! preserving input order. Dominance within one scan is decided on the
//! dimensions every scanned record measures
//! ([`DimensionRegistry::common_to`]). The scan is the plain O(n²) pairwise check;
//! [`compute_frontier_partitioned`] splits the candidate list across rayon
//! workers and merges the survivors by union, which yields exactly the
//! serial result because dominance exclusion is decided per candidate.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{ConfigError, DimensionRegistry, MetricRecord};
use crate::dominance::dominates;
use crate::metrics::METRICS;
use crate::obs;

/// When and how to use the partitioned scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Use the partitioned scan at or above this many records.
    #[serde(default = "ParallelConfig::default_min_records")]
    pub min_records: usize,
    /// Candidates per worker chunk.
    #[serde(default = "ParallelConfig::default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            min_records: Self::default_min_records(),
            chunk_size: Self::default_chunk_size(),
        }
    }
}

impl ParallelConfig {
    fn default_min_records() -> usize {
        512
    }

    fn default_chunk_size() -> usize {
        64
    }

    /// Never partition.
    pub fn serial() -> Self {
        Self {
            min_records: usize::MAX,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ChunkSize);
        }
        Ok(())
    }
}

fn is_dominated(registry: &DimensionRegistry, items: &[&MetricRecord], i: usize) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(j, other)| j != i && dominates(registry, other, items[i]))
}

fn pair_count(n: usize) -> u64 {
    (n as u64).saturating_mul(n.saturating_sub(1) as u64)
}

/// Indices of non-dominated items, ascending.
fn frontier_indices(registry: &DimensionRegistry, items: &[&MetricRecord]) -> Vec<usize> {
    let common = registry.common_to(items);
    METRICS.add_comparisons(pair_count(items.len()));
    (0..items.len())
        .filter(|&i| !is_dominated(&common, items, i))
        .collect()
}

/// Non-dominated subset of `records`, in input order.
///
/// Empty input yields an empty frontier. Records tied on every dimension
/// do not exclude each other.
pub fn compute_frontier<'a, I>(registry: &DimensionRegistry, records: I) -> Vec<&'a MetricRecord>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let items: Vec<&MetricRecord> = records.into_iter().collect();
    let frontier: Vec<&MetricRecord> = frontier_indices(registry, &items)
        .into_iter()
        .map(|i| items[i])
        .collect();

    METRICS.inc_frontiers();
    obs::emit_frontier_computed(items.len(), frontier.len(), false);
    frontier
}

/// Same result as [`compute_frontier`], with candidates checked in
/// parallel chunks of `chunk_size` (minimum 1).
pub fn compute_frontier_partitioned<'a, I>(
    registry: &DimensionRegistry,
    records: I,
    chunk_size: usize,
) -> Vec<&'a MetricRecord>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let items: Vec<&MetricRecord> = records.into_iter().collect();
    let common = registry.common_to(&items);
    let candidates: Vec<usize> = (0..items.len()).collect();
    METRICS.add_comparisons(pair_count(items.len()));

    let survivors: Vec<Vec<usize>> = candidates
        .par_chunks(chunk_size.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .copied()
                .filter(|&i| !is_dominated(&common, &items, i))
                .collect::<Vec<usize>>()
        })
        .collect();

    let frontier: Vec<&MetricRecord> = survivors
        .into_iter()
        .flatten()
        .map(|i| items[i])
        .collect();

    METRICS.inc_frontiers();
    obs::emit_frontier_computed(items.len(), frontier.len(), true);
    frontier
}

/// Pick the serial or partitioned scan according to `parallel`.
pub fn compute_frontier_with<'a, I>(
    registry: &DimensionRegistry,
    records: I,
    parallel: &ParallelConfig,
) -> Vec<&'a MetricRecord>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let items: Vec<&MetricRecord> = records.into_iter().collect();
    if items.len() >= parallel.min_records {
        compute_frontier_partitioned(registry, items, parallel.chunk_size)
    } else {
        compute_frontier(registry, items)
    }
}

/// Records partitioned into dominance tiers.
///
/// Tier 0 is the frontier of the whole input; tier k is the frontier of
/// what remains after removing tiers 0..k. Every input record appears in
/// exactly one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<'a> {
    tiers: Vec<Vec<&'a MetricRecord>>,
}

impl<'a> Ranking<'a> {
    pub fn tiers(&self) -> &[Vec<&'a MetricRecord>] {
        &self.tiers
    }

    pub fn tier(&self, k: usize) -> Option<&[&'a MetricRecord]> {
        self.tiers.get(k).map(Vec::as_slice)
    }

    /// Tier index holding `agent_id`.
    pub fn tier_of(&self, agent_id: &str) -> Option<usize> {
        self.tiers
            .iter()
            .position(|tier| tier.iter().any(|r| r.agent_id() == agent_id))
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Total records across all tiers.
    pub fn record_count(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    /// `tier -> [agent_id]` view used by the analysis report.
    pub fn to_id_map(&self) -> BTreeMap<usize, Vec<String>> {
        self.tiers
            .iter()
            .enumerate()
            .map(|(k, tier)| (k, tier.iter().map(|r| r.agent_id().to_string()).collect()))
            .collect()
    }
}

/// Peel successive frontiers off `records` until none remain.
pub fn rank_by_dominance<'a, I>(registry: &DimensionRegistry, records: I) -> Ranking<'a>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let mut remaining: Vec<&MetricRecord> = records.into_iter().collect();
    let total = remaining.len();
    let mut tiers = Vec::new();

    while !remaining.is_empty() {
        let front = frontier_indices(registry, &remaining);
        if front.is_empty() {
            tiers.push(std::mem::take(&mut remaining));
            break;
        }

        let mut tier = Vec::with_capacity(front.len());
        let mut rest = Vec::with_capacity(remaining.len() - front.len());
        let mut next = front.iter().peekable();
        for (i, record) in remaining.into_iter().enumerate() {
            if next.peek() == Some(&&i) {
                next.next();
                tier.push(record);
            } else {
                rest.push(record);
            }
        }
        tiers.push(tier);
        remaining = rest;
    }

    METRICS.add_tiers(tiers.len() as u64);
    obs::emit_ranking_computed(total, tiers.len());
    Ranking { tiers }
}
