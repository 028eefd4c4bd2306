//! Global atomic counters for greenbench observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a CLI command). They never
//! feed back into any analysis result.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, safe to bump from rayon workers.
pub struct Metrics {
    comparisons: AtomicU64,
    frontiers_computed: AtomicU64,
    tiers_peeled: AtomicU64,
    knees_selected: AtomicU64,
    reports_built: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            comparisons: AtomicU64::new(0),
            frontiers_computed: AtomicU64::new(0),
            tiers_peeled: AtomicU64::new(0),
            knees_selected: AtomicU64::new(0),
            reports_built: AtomicU64::new(0),
        }
    }

    /// Add `n` pairwise dominance checks.
    pub fn add_comparisons(&self, n: u64) {
        self.comparisons.fetch_add(n, Ordering::Relaxed);
    }

    /// Increment the frontiers-computed counter by one.
    pub fn inc_frontiers(&self) {
        self.frontiers_computed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "frontiers_computed", "counter incremented");
    }

    /// Add `n` dominance tiers produced by a ranking.
    pub fn add_tiers(&self, n: u64) {
        self.tiers_peeled.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_knees(&self) {
        self.knees_selected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "knees_selected", "counter incremented");
    }

    /// Increment the reports-built counter by one.
    pub fn inc_reports(&self) {
        self.reports_built.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "reports_built", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            comparisons = self.comparisons(),
            frontiers_computed = self.frontiers_computed(),
            tiers_peeled = self.tiers_peeled(),
            knees_selected = self.knees_selected(),
            reports_built = self.reports_built(),
        );
    }

    pub fn comparisons(&self) -> u64 {
        self.comparisons.load(Ordering::Relaxed)
    }

    pub fn frontiers_computed(&self) -> u64 {
        self.frontiers_computed.load(Ordering::Relaxed)
    }

    pub fn tiers_peeled(&self) -> u64 {
        self.tiers_peeled.load(Ordering::Relaxed)
    }

    pub fn knees_selected(&self) -> u64 {
        self.knees_selected.load(Ordering::Relaxed)
    }

    pub fn reports_built(&self) -> u64 {
        self.reports_built.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.comparisons.store(0, Ordering::Relaxed);
        self.frontiers_computed.store(0, Ordering::Relaxed);
        self.tiers_peeled.store(0, Ordering::Relaxed);
        self.knees_selected.store(0, Ordering::Relaxed);
        self.reports_built.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.comparisons(), 0);
        m.add_comparisons(6);
        m.add_comparisons(2);
        assert_eq!(m.comparisons(), 8);

        m.inc_frontiers();
        assert_eq!(m.frontiers_computed(), 1);

        m.add_tiers(3);
        assert_eq!(m.tiers_peeled(), 3);

        m.inc_knees();
        assert_eq!(m.knees_selected(), 1);

        m.inc_reports();
        m.inc_reports();
        assert_eq!(m.reports_built(), 2);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.add_comparisons(3);
        m.inc_frontiers();
        m.add_tiers(2);
        m.inc_knees();
        m.inc_reports();
        m.reset();
        assert_eq!(m.comparisons(), 0);
        assert_eq!(m.frontiers_computed(), 0);
        assert_eq!(m.tiers_peeled(), 0);
        assert_eq!(m.knees_selected(), 0);
        assert_eq!(m.reports_built(), 0);
    }
}
