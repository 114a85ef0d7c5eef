//! Deduplication and aggregation (C3). Two independent layers: an
//! exact-fingerprint cache that drops true repeats, and a sliding
//! aggregation window that folds bursts of distinct-but-related
//! alerts into one occurrence count.

pub mod aggregation;
pub mod cache;
pub mod fingerprint;

pub use aggregation::{AggregationOutcome, AggregationWindow};
pub use cache::FingerprintCache;

use std::time::Duration;

use aegis_common::CanonicalAlert;

/// Decision C3 hands to the caller for one incoming alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    /// Exact repeat of an already-seen `(source, alert_id)` — drop.
    Duplicate,
    /// Folded into a running burst of the same `(source_ip, alert_type)`.
    Aggregated {
        base_alert_id: String,
        occurrence_count: u32,
    },
    /// Neither a duplicate nor part of a burst — proceed to scoring.
    Fresh,
}

/// Ties the fingerprint cache and the aggregation window together
/// behind one entry point so callers evaluate both layers in the
/// correct order: an exact duplicate is dropped before it ever
/// reaches aggregation.
pub struct DedupEngine {
    fingerprints: FingerprintCache,
    aggregation: AggregationWindow,
}

impl DedupEngine {
    pub fn new(capacity: u64, lookback: Duration, window: Duration, max_group_size: u32) -> Self {
        Self {
            fingerprints: FingerprintCache::new(capacity, lookback),
            aggregation: AggregationWindow::new(window, max_group_size),
        }
    }

    /// Current fingerprint-cache occupancy, surfaced on the
    /// coordinator's `/metrics` endpoint (§6.7).
    pub fn cache_occupancy(&self) -> u64 {
        self.fingerprints.len()
    }

    pub fn evaluate(&self, alert: &CanonicalAlert) -> DedupDecision {
        let (source, alert_id) = alert.identity();
        let fp = fingerprint::compute(source, alert_id);
        if self.fingerprints.mark(&fp) {
            return DedupDecision::Duplicate;
        }

        let Some(source_ip) = alert.source_ip.as_deref() else {
            return DedupDecision::Fresh;
        };

        match self.aggregation.evaluate(source_ip, alert.alert_type, alert_id) {
            AggregationOutcome::Fresh => DedupDecision::Fresh,
            AggregationOutcome::Aggregated {
                base_alert_id,
                occurrence_count,
            } => DedupDecision::Aggregated {
                base_alert_id,
                occurrence_count,
            },
        }
    }
}

impl Default for DedupEngine {
    fn default() -> Self {
        Self::new(
            cache::DEFAULT_CAPACITY,
            cache::DEFAULT_LOOKBACK,
            aggregation::DEFAULT_WINDOW,
            aggregation::AGGREGATION_MAX_SIZE,
        )
    }
}
