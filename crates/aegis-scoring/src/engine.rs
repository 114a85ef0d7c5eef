//! Composite risk scoring (§4.5, C6). Four weighted components
//! (severity, threat intel, asset criticality, exploitability) folded
//! through a type multiplier and a historical multiplier into one
//! 0-100 score, alongside a separate confidence estimate.

use aegis_common::alert::{AlertType, Severity};
use aegis_common::triage::{RemediationAction, RiskBreakdown, RiskFactors, RiskLevel, ScoreComponent, TriageResult};

use crate::types::{AssetCriticality, ScoringInput};

/// §4.5 `RISK_WEIGHTS`. Sums to 1.0 — pinned by
/// [`crate::tests::weights_sum_to_one`].
pub const WEIGHT_SEVERITY: f64 = 0.30;
pub const WEIGHT_THREAT_INTEL: f64 = 0.30;
pub const WEIGHT_ASSET_CRITICALITY: f64 = 0.20;
pub const WEIGHT_EXPLOITABILITY: f64 = 0.20;

fn severity_score(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 100,
        Severity::High => 80,
        Severity::Medium => 50,
        Severity::Low => 30,
        Severity::Info => 10,
    }
}

/// `missing` (no asset context available) scores the same as `medium`
/// — both 50 — so `AssetCriticality::default()` already covers it
/// without a separate variant.
fn asset_criticality_score(criticality: AssetCriticality) -> u32 {
    match criticality {
        AssetCriticality::Critical => 100,
        AssetCriticality::High => 80,
        AssetCriticality::Medium => 50,
        AssetCriticality::Low => 30,
    }
}

fn threat_intel_score(intel: &[aegis_common::AggregatedIntel]) -> u32 {
    intel
        .iter()
        .map(|i| i.aggregate_score.round() as u32)
        .max()
        .unwrap_or(0)
        .min(100)
}

/// §4.5 `ALERT_TYPE_MULTIPLIERS` — applied to the final composite
/// score, not to any individual component.
fn type_multiplier(alert_type: AlertType) -> f64 {
    match alert_type {
        AlertType::Malware => 1.2,
        AlertType::Phishing => 1.1,
        AlertType::BruteForce => 0.9,
        AlertType::Ddos => 1.0,
        AlertType::DataExfiltration => 1.3,
        AlertType::UnauthorizedAccess => 1.1,
        AlertType::Anomaly => 0.8,
        AlertType::Other => 1.0,
    }
}

fn is_external_ip(ip: &str) -> bool {
    !(ip.starts_with("10.")
        || ip.starts_with("192.168.")
        || ip.starts_with("127.")
        || (ip.starts_with("172.")
            && ip
                .split('.')
                .nth(1)
                .and_then(|o| o.parse::<u8>().ok())
                .is_some_and(|o| (16..=31).contains(&o))))
}

const PRIVILEGED_KEYWORDS: &[&str] = &["admin", "root", "administrator", "privileged"];

/// §4.5 `_calculate_exploitability_component`: base 50, +20 if the
/// source is external, +15 if any source reports reputation/aggregate
/// score above 70, +25 if the description names a privileged
/// account/asset, plus an alert-type bonus.
fn exploitability_component(input: &ScoringInput) -> u32 {
    let mut score: i64 = 50;

    if input.alert.source_ip.as_deref().is_some_and(is_external_ip) {
        score += 20;
    }

    if input.intel.iter().any(|i| i.aggregate_score > 70.0) {
        score += 15;
    }

    let description = input.alert.description.to_lowercase();
    if PRIVILEGED_KEYWORDS.iter().any(|kw| description.contains(kw)) {
        score += 25;
    }

    score += match input.alert.alert_type {
        AlertType::Malware => 10,
        AlertType::UnauthorizedAccess => 15,
        AlertType::DataExfiltration => 20,
        _ => 0,
    };

    score.clamp(0, 100) as u32
}

/// §4.5 `_calculate_historical_multiplier`.
fn historical_multiplier(historical_count: u32) -> f64 {
    if historical_count > 5 {
        1.2
    } else if historical_count > 2 {
        1.1
    } else if historical_count == 0 {
        0.9
    } else {
        1.0
    }
}

/// §4.5 `_calculate_confidence`: base 0.5, boosted by how many
/// distinct providers answered (across every IOC queried for this
/// alert) and by historical repetition. Distinct from, and not to be
/// confused with, `historical_multiplier`'s own `>5`/`>2` thresholds —
/// this is a separate formula with its own `>=3`/`>=1` cutoffs.
///
/// One alert can carry intel for several IOCs, so "sources queried"
/// is counted as the union of providers that responded across all of
/// them — a provider that answers for two different IOCs on the same
/// alert still counts once.
fn confidence(input: &ScoringInput) -> f64 {
    let mut confidence = 0.5_f64;

    let intel_sources = input
        .intel
        .iter()
        .flat_map(|i| i.detections.iter().map(|d| d.source.as_str()))
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    if intel_sources >= 3 {
        confidence += 0.3;
    } else if intel_sources >= 1 {
        confidence += 0.15;
    }

    if input.historical_count >= 3 {
        confidence += 0.2;
    } else if input.historical_count >= 1 {
        confidence += 0.1;
    }

    confidence.clamp(0.0, 1.0)
}

/// Alert types that force a human-review flag once the score clears a
/// much lower bar than the general 70-point threshold (§4.5
/// `_requires_human_review`).
const ALWAYS_REVIEW_ABOVE_40: &[AlertType] = &[
    AlertType::Malware,
    AlertType::DataExfiltration,
    AlertType::UnauthorizedAccess,
];

fn requires_human_review(risk_score: u32, intel_detected: bool, alert_type: AlertType) -> bool {
    risk_score >= 70
        || intel_detected
        || (ALWAYS_REVIEW_ABOVE_40.contains(&alert_type) && risk_score >= 40)
}

fn remediation_for(level: RiskLevel, alert_type: AlertType) -> Vec<RemediationAction> {
    let priority = match level {
        RiskLevel::Critical => "immediate",
        RiskLevel::High => "high",
        RiskLevel::Medium => "normal",
        RiskLevel::Low | RiskLevel::Info => "low",
    };

    let mut actions = vec![RemediationAction {
        action: "review_alert".to_string(),
        priority: priority.to_string(),
        automated: false,
        owner: Some("soc_analyst".to_string()),
    }];

    if matches!(level, RiskLevel::Critical | RiskLevel::High) {
        let containment = match alert_type {
            AlertType::BruteForce | AlertType::UnauthorizedAccess => "lock_account",
            AlertType::Malware => "isolate_host",
            AlertType::DataExfiltration => "block_egress",
            AlertType::Ddos => "enable_rate_limiting",
            _ => "escalate_to_ir_team",
        };
        actions.push(RemediationAction {
            action: containment.to_string(),
            priority: priority.to_string(),
            automated: matches!(alert_type, AlertType::BruteForce | AlertType::Ddos),
            owner: None,
        });
    }

    actions
}

pub struct RiskScoringEngine;

impl RiskScoringEngine {
    /// §4.5. Never fails — a scoring input the engine can't make
    /// sense of still produces a well-formed `TriageResult`, just a
    /// low-confidence one.
    pub fn score(input: &ScoringInput) -> TriageResult {
        let severity = severity_score(input.alert.severity);
        let intel_score = threat_intel_score(input.intel);
        let asset_score = asset_criticality_score(input.asset_criticality);
        let exploitability = exploitability_component(input);

        let weighted = severity as f64 * WEIGHT_SEVERITY
            + intel_score as f64 * WEIGHT_THREAT_INTEL
            + asset_score as f64 * WEIGHT_ASSET_CRITICALITY
            + exploitability as f64 * WEIGHT_EXPLOITABILITY;

        let type_mult = type_multiplier(input.alert.alert_type);
        let hist_mult = historical_multiplier(input.historical_count);

        let risk_score = (weighted * type_mult * hist_mult).round().clamp(0.0, 100.0) as u32;
        let risk_level = RiskLevel::from_score(risk_score);

        let intel_detected = input.intel.iter().any(|i| i.detected_by_count > 0);
        let review = requires_human_review(risk_score, intel_detected, input.alert.alert_type);

        TriageResult {
            alert_id: input.alert.alert_id.clone(),
            risk_score,
            risk_level,
            confidence: confidence(input),
            requires_human_review: review,
            breakdown: RiskBreakdown {
                severity: ScoreComponent { score: severity, weight: WEIGHT_SEVERITY },
                threat_intel: ScoreComponent { score: intel_score, weight: WEIGHT_THREAT_INTEL },
                asset_criticality: ScoreComponent { score: asset_score, weight: WEIGHT_ASSET_CRITICALITY },
                exploitability: ScoreComponent { score: exploitability, weight: WEIGHT_EXPLOITABILITY },
            },
            factors: RiskFactors {
                alert_type: input.alert.alert_type,
                type_multiplier: type_mult,
                historical_multiplier: hist_mult,
            },
            remediation: remediation_for(risk_level, input.alert.alert_type),
            iocs_identified: input
                .alert
                .normalized_data
                .iocs_extracted
                .values()
                .flat_map(|set| set.iter().cloned())
                .collect(),
            threat_intel_summary: input.intel.first().map(|i| {
                format!(
                    "{} detection(s) across {} source(s), aggregate score {:.1}",
                    i.detected_by_count, i.total_sources, i.aggregate_score
                )
            }),
            cve_references: Vec::new(),
            model_used: "risk_scoring_engine_v1".to_string(),
            created_at: chrono::Utc::now(),
            error: None,
        }
    }
}
