//! Fallback triage record construction (§7 `ScoringError` recovery,
//! §8 scenario 6). Built whenever the pipeline can't complete a
//! well-formed result — a panic surfaced through a `JoinError`, or the
//! per-alert budget expiring — but the source alert is known well
//! enough to still be identified.

use aegis_common::triage::{RiskBreakdown, RiskFactors, RiskLevel, ScoreComponent, TriageResult};
use aegis_common::AlertType;

/// §7/§8 scenario 6: score 50, level medium, `requires_human_review`
/// true, `model_used="fallback"`, `error` populated. Every component
/// weight is carried through unchanged so the record still satisfies
/// `TriageResult::is_well_formed` even though it is not a real score.
pub fn fallback_result(alert_id: &str, reason: impl Into<String>) -> TriageResult {
    TriageResult {
        alert_id: alert_id.to_string(),
        risk_score: 50,
        risk_level: RiskLevel::Medium,
        confidence: 0.5,
        requires_human_review: true,
        breakdown: RiskBreakdown {
            severity: ScoreComponent { score: 50, weight: 0.30 },
            threat_intel: ScoreComponent { score: 0, weight: 0.30 },
            asset_criticality: ScoreComponent { score: 50, weight: 0.20 },
            exploitability: ScoreComponent { score: 50, weight: 0.20 },
        },
        factors: RiskFactors {
            alert_type: AlertType::Other,
            type_multiplier: 1.0,
            historical_multiplier: 1.0,
        },
        remediation: Vec::new(),
        iocs_identified: Vec::new(),
        threat_intel_summary: None,
        cve_references: Vec::new(),
        model_used: "fallback".to_string(),
        created_at: chrono::Utc::now(),
        error: Some(reason.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_result_is_well_formed_and_flagged_for_review() {
        let result = fallback_result("a1", "triage budget exceeded");
        assert!(result.is_well_formed());
        assert_eq!(result.risk_score, 50);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert!(result.requires_human_review);
        assert_eq!(result.model_used, "fallback");
        assert!(result.error.is_some());
    }
}
