//! Canonical domain model shared by every stage of the triage pipeline
//! (C9), plus the wire envelope (C8's payload types) and the
//! repository/narrative-generation seams the core depends on but does
//! not implement.

pub mod alert;
pub mod envelope;
pub mod intel;
pub mod repo;
pub mod triage;

pub use alert::{AlertType, CanonicalAlert, IocKind, IocMap, NormalizedData, Severity};
pub use envelope::{Envelope, MessageType};
pub use intel::{AggregatedIntel, Detection, IocType, ThreatLevel};
pub use repo::{
    AlertRepository, HistoryRepository, NarrativeGenerator, RepoResult, RepositoryError,
    ThreatIntelRepository, TriageRepository,
};
pub use triage::{RemediationAction, RiskBreakdown, RiskFactors, RiskLevel, ScoreComponent, TriageResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_thresholds_match_table() {
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(90), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(89), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(39), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(20), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(19), RiskLevel::Info);
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Info);
    }

    #[test]
    fn ioc_type_autodetect() {
        assert_eq!(IocType::detect("45.33.32.156"), IocType::Ip);
        assert_eq!(
            IocType::detect("d41d8cd98f00b204e9800998ecf8427e"),
            IocType::HashMd5
        );
        assert_eq!(IocType::detect("https://evil.example.com/x"), IocType::Url);
        assert_eq!(IocType::detect("evil.example.com"), IocType::Domain);
    }

    #[test]
    fn threat_level_thresholds() {
        assert_eq!(ThreatLevel::from_score(70.0), ThreatLevel::Critical);
        assert_eq!(ThreatLevel::from_score(50.0), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(30.0), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(10.0), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(9.9), ThreatLevel::Safe);
    }
}
