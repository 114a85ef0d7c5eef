//! Triage result schema (§3.3) — the immutable record C7 publishes on
//! `triage.result`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::AlertType;

/// Discrete risk level derived from the final numeric score (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// §4.5 score → level table.
    pub fn from_score(score: u32) -> RiskLevel {
        if score >= 90 {
            RiskLevel::Critical
        } else if score >= 70 {
            RiskLevel::High
        } else if score >= 40 {
            RiskLevel::Medium
        } else if score >= 20 {
            RiskLevel::Low
        } else {
            RiskLevel::Info
        }
    }
}

/// One weighted component of the composite score (§3.3 `breakdown`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub score: u32,
    pub weight: f64,
}

/// §3.3 `breakdown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub severity: ScoreComponent,
    pub threat_intel: ScoreComponent,
    pub asset_criticality: ScoreComponent,
    pub exploitability: ScoreComponent,
}

/// §3.3 `factors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactors {
    pub alert_type: AlertType,
    pub type_multiplier: f64,
    pub historical_multiplier: f64,
}

/// One recommended remediation action (§3.3 `remediation`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationAction {
    pub action: String,
    pub priority: String,
    pub automated: bool,
    pub owner: Option<String>,
}

/// Triage result (§3.3), published once per alert and never mutated
/// after publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResult {
    pub alert_id: String,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub requires_human_review: bool,
    pub breakdown: RiskBreakdown,
    pub factors: RiskFactors,
    pub remediation: Vec<RemediationAction>,
    pub iocs_identified: Vec<String>,
    pub threat_intel_summary: Option<String>,
    pub cve_references: Vec<String>,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
    /// Populated only on the fallback path (§7 `ScoringError` recovery).
    pub error: Option<String>,
}

impl TriageResult {
    /// §8 P4 — bounds every well-formed result must satisfy.
    pub fn is_well_formed(&self) -> bool {
        self.risk_score <= 100
            && (0.0..=1.0).contains(&self.confidence)
            && self.risk_level == RiskLevel::from_score(self.risk_score)
    }
}
