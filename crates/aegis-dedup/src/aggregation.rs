//! Sliding-window aggregation (§4.3). Distinct alerts that share
//! `(source_ip, alert_type)` within a short window are collapsed into
//! one occurrence count instead of triggering a separate triage cycle
//! each, backed by a `DashMap`-based concurrent index keyed by group.

use std::time::Duration;

use aegis_common::AlertType;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30);
pub const AGGREGATION_MAX_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AggKey {
    source_ip: String,
    alert_type: AlertType,
}

struct WindowEntry {
    base_alert_id: String,
    window_start: DateTime<Utc>,
    occurrence_count: u32,
}

/// Outcome of evaluating one alert against the aggregation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationOutcome {
    /// Starts (or restarts, after the window expired) a new group.
    Fresh,
    /// Folded into an existing group; carries the running count and
    /// the id of the alert that opened the group.
    Aggregated {
        base_alert_id: String,
        occurrence_count: u32,
    },
}

/// Keyed sliding-window aggregator. One process-wide instance is
/// shared across all alerts flowing through C3.
pub struct AggregationWindow {
    window: Duration,
    max_size: u32,
    groups: DashMap<AggKey, WindowEntry>,
}

impl AggregationWindow {
    pub fn new(window: Duration, max_size: u32) -> Self {
        Self {
            window,
            max_size,
            groups: DashMap::new(),
        }
    }

    /// Evaluate `alert_id` under `(source_ip, alert_type)`. Groups
    /// that have aged out of the window are treated as if they never
    /// existed; groups that have hit `max_size` stop counting further
    /// occurrences and fall through to `Fresh` so the burst is not
    /// silently dropped once the cap is reached (§4.3 "a capped group
    /// never discards the alert that overflowed it").
    pub fn evaluate(&self, source_ip: &str, alert_type: AlertType, alert_id: &str) -> AggregationOutcome {
        let key = AggKey {
            source_ip: source_ip.to_string(),
            alert_type,
        };
        let now = Utc::now();

        let mut entry = self.groups.entry(key).or_insert_with(|| WindowEntry {
            base_alert_id: alert_id.to_string(),
            window_start: now,
            occurrence_count: 0,
        });

        let age = now.signed_duration_since(entry.window_start);
        if age.to_std().unwrap_or(Duration::MAX) > self.window {
            entry.base_alert_id = alert_id.to_string();
            entry.window_start = now;
            entry.occurrence_count = 1;
            return AggregationOutcome::Fresh;
        }

        if entry.occurrence_count >= self.max_size {
            return AggregationOutcome::Fresh;
        }

        entry.occurrence_count += 1;
        if entry.occurrence_count == 1 {
            AggregationOutcome::Fresh
        } else {
            AggregationOutcome::Aggregated {
                base_alert_id: entry.base_alert_id.clone(),
                occurrence_count: entry.occurrence_count,
            }
        }
    }
}

impl Default for AggregationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, AGGREGATION_MAX_SIZE)
    }
}
