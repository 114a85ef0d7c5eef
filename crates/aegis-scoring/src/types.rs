//! Inputs `RiskScoringEngine::score` needs beyond the alert itself —
//! context the engine depends on but does not compute (asset
//! criticality lookup and historical-occurrence counting belong to
//! the repository seams in `aegis_common::repo`).

use aegis_common::{AggregatedIntel, CanonicalAlert};

/// Business criticality of the asset the alert concerns (§4.5
/// `ASSET_CRITICALITY_SCORES`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCriticality {
    Critical,
    High,
    Medium,
    Low,
}

impl Default for AssetCriticality {
    fn default() -> Self {
        AssetCriticality::Medium
    }
}

/// Everything `score()` needs for one alert.
pub struct ScoringInput<'a> {
    pub alert: &'a CanonicalAlert,
    pub intel: &'a [AggregatedIntel],
    pub asset_criticality: AssetCriticality,
    /// Count of similar past alerts within the lookback window (§4.5
    /// historical multiplier), sourced from `HistoryRepository::similar`.
    pub historical_count: u32,
}
