//! Per-alert state machine (C7, §4.6): `received → scored →
//! intel-queried → composed → emitted | fallback`. One call to
//! [`Coordinator::process`] carries a single alert through every
//! stage; the caller (the consumer loop in the binary) is responsible
//! for the per-alert budget timeout and for sequencing the publish
//! before the ack (§5).

use std::sync::Arc;
use std::time::Duration;

use aegis_common::alert::IocKind;
use aegis_common::intel::{AggregatedIntel, IocType};
use aegis_common::repo::HistoryRepository;
use aegis_common::triage::TriageResult;
use aegis_common::CanonicalAlert;
use aegis_dedup::{DedupDecision, DedupEngine};
use aegis_intel::IntelAggregator;
use aegis_normalizer::NormalizationError;
use aegis_scoring::{AssetCriticality, RiskScoringEngine, ScoringInput};
use chrono::Duration as ChronoDuration;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Result of carrying one `alert.raw` through the whole pipeline.
pub enum Outcome {
    /// Exact repeat within the lookback window (§4.3) — dropped, never
    /// republished, but still acknowledged so it is not redelivered.
    Duplicate,
    /// Normalization rejected the alert (§7 `NormalizationError`) — the
    /// caller routes the source envelope to `alert.dead_letter`.
    DeadLetter { reason: String },
    /// A well-formed triage result, ready for `triage.result`.
    Triage(TriageResult),
}

fn to_intel_type(kind: IocKind) -> IocType {
    match kind {
        IocKind::Ip => IocType::Ip,
        IocKind::Md5 => IocType::HashMd5,
        IocKind::Sha1 => IocType::HashSha1,
        IocKind::Sha256 => IocType::HashSha256,
        IocKind::Url => IocType::Url,
        IocKind::Domain => IocType::Domain,
        IocKind::Email => IocType::Email,
    }
}

/// Holds the collaborators `process` needs across every alert —
/// created once at startup and shared (via `Arc`) across the
/// per-alert tasks the consumer loop spawns.
pub struct Coordinator {
    dedup: DedupEngine,
    intel: IntelAggregator,
    history: Option<Arc<dyn HistoryRepository>>,
    max_iocs_per_alert: usize,
}

impl Coordinator {
    pub fn new(
        dedup: DedupEngine,
        intel: IntelAggregator,
        history: Option<Arc<dyn HistoryRepository>>,
        max_iocs_per_alert: usize,
    ) -> Self {
        Self { dedup, intel, history, max_iocs_per_alert }
    }

    pub fn dedup_cache_occupancy(&self) -> u64 {
        self.dedup.cache_occupancy()
    }

    /// Stage `received`: run the format processor (§4.1).
    fn normalize(&self, source_format: &str, raw: &Value) -> Result<CanonicalAlert, NormalizationError> {
        aegis_normalizer::dispatch(source_format, raw)
    }

    /// Stage `intel-queried`: fan out to C5 for every extracted IOC, up
    /// to `max_iocs_per_alert`, merged into one intel list keyed by IOC
    /// (§4.6 step 2). Never fails — an empty IOC set yields an empty
    /// intel list and the scoring engine treats that as "no intel".
    async fn query_intel(&self, alert: &CanonicalAlert) -> Vec<AggregatedIntel> {
        let iocs: Vec<(String, IocType)> = alert
            .normalized_data
            .iocs_extracted
            .iter()
            .flat_map(|(kind, values)| values.iter().map(move |v| (v.clone(), to_intel_type(*kind))))
            .take(self.max_iocs_per_alert)
            .collect();

        if iocs.is_empty() {
            return Vec::new();
        }

        join_all(iocs.iter().map(|(ioc, ioc_type)| self.intel.aggregate(ioc, *ioc_type))).await
    }

    /// Count of similar past alerts within a 24h lookback, feeding the
    /// §4.5 historical multiplier. Falls back to 0 when no
    /// `HistoryRepository` is wired (the repository boundary is an
    /// external collaborator the core depends on but does not
    /// implement) or when the lookup itself fails — a missing history
    /// signal degrades confidence, it never blocks triage.
    async fn historical_count(&self, alert: &CanonicalAlert) -> u32 {
        let Some(repo) = &self.history else {
            return 0;
        };
        let fingerprint = aegis_dedup::fingerprint::compute(&alert.source, &alert.alert_id);
        match repo.similar(&fingerprint, ChronoDuration::hours(24)).await {
            Ok(count) => count,
            Err(e) => {
                warn!(alert_id = %alert.alert_id, error = %e, "history lookup failed, treating as no history");
                0
            }
        }
    }

    /// Carries one `alert.raw` payload through `received → scored →
    /// intel-queried → composed`. Asset context is always `Medium`
    /// (§4.5 `missing:50`) — an `AssetRepository` lookup is the same
    /// kind of out-of-scope persistence collaborator as the other
    /// repository traits, and none is wired into the core.
    pub async fn process(&self, source_format: &str, raw: &Value) -> Outcome {
        let alert = match self.normalize(source_format, raw) {
            Ok(alert) => alert,
            Err(e) => return Outcome::DeadLetter { reason: e.to_string() },
        };

        match self.dedup.evaluate(&alert) {
            DedupDecision::Duplicate => {
                info!(alert_id = %alert.alert_id, source = %alert.source, "duplicate alert dropped");
                return Outcome::Duplicate;
            }
            DedupDecision::Aggregated { base_alert_id, occurrence_count } => {
                debug!(
                    alert_id = %alert.alert_id,
                    base_alert_id = %base_alert_id,
                    occurrence_count,
                    "alert folded into aggregation window, still scored individually"
                );
            }
            DedupDecision::Fresh => {}
        }

        let intel = self.query_intel(&alert).await;
        let historical_count = self.historical_count(&alert).await;

        let input = ScoringInput {
            alert: &alert,
            intel: &intel,
            asset_criticality: AssetCriticality::default(),
            historical_count,
        };
        let result = RiskScoringEngine::score(&input);

        info!(
            alert_id = %result.alert_id,
            risk_score = result.risk_score,
            risk_level = ?result.risk_level,
            requires_human_review = result.requires_human_review,
            "triage composed"
        );

        Outcome::Triage(result)
    }
}

/// Default per-adapter query timeout handed to [`aegis_intel::IntelAggregator`]
/// when the caller has no configuration override.
pub const DEFAULT_INTEL_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_intel::IntelAggregator;
    use serde_json::json;

    fn coordinator() -> Coordinator {
        Coordinator::new(
            DedupEngine::default(),
            IntelAggregator::new(Vec::new(), DEFAULT_INTEL_TIMEOUT),
            None,
            10,
        )
    }

    #[tokio::test]
    async fn unknown_format_is_dead_lettered() {
        let coordinator = coordinator();
        let outcome = coordinator.process("unknown_siem", &json!({})).await;
        assert!(matches!(outcome, Outcome::DeadLetter { .. }));
    }

    #[tokio::test]
    async fn fresh_splunk_alert_produces_a_triage_result() {
        let coordinator = coordinator();
        let raw = json!({
            "alert_id": "notable-1",
            "severity": "high",
            "category": "malware",
            "src_ip": "45.33.32.156",
        });
        let outcome = coordinator.process("splunk", &raw).await;
        match outcome {
            Outcome::Triage(result) => {
                assert!(result.is_well_formed());
                assert_eq!(result.alert_id, "notable-1");
            }
            _ => panic!("expected a triage result"),
        }
    }

    #[tokio::test]
    async fn repeated_identity_is_a_duplicate_on_second_pass() {
        let coordinator = coordinator();
        let raw = json!({"alert_id": "notable-2", "severity": "low"});
        assert!(matches!(coordinator.process("splunk", &raw).await, Outcome::Triage(_)));
        assert!(matches!(coordinator.process("splunk", &raw).await, Outcome::Duplicate));
    }

    /// §8 P6 "no silent loss": every accepted `alert.raw` that is not an
    /// exact duplicate must resolve to exactly one of a triage result or
    /// a dead-letter — never neither.
    #[tokio::test]
    async fn every_non_duplicate_outcome_is_triage_or_dead_letter() {
        let coordinator = coordinator();
        let well_formed = json!({"alert_id": "notable-3", "severity": "medium"});
        match coordinator.process("splunk", &well_formed).await {
            Outcome::Triage(_) | Outcome::DeadLetter { .. } => {}
            Outcome::Duplicate => panic!("first sighting of a fresh alert can't be a duplicate"),
        }

        let unroutable = json!({"nonsense": true});
        match coordinator.process("not_a_real_siem", &unroutable).await {
            Outcome::DeadLetter { .. } => {}
            other => panic!("unknown source_format must dead-letter, got a different outcome: {}", match other {
                Outcome::Triage(_) => "Triage",
                Outcome::Duplicate => "Duplicate",
                Outcome::DeadLetter { .. } => unreachable!(),
            }),
        }
    }
}
