//! Aggregated threat intel schema (§3.2).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// IOC type as recognized by the intel aggregator's auto-detector
/// (§4.4). A superset of `aegis_common::alert::IocKind` (hashes are
/// split by length there but unified under `detect` here since every
/// provider queries hashes through one endpoint regardless of length).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IocType {
    Ip,
    Domain,
    Url,
    HashMd5,
    HashSha1,
    HashSha256,
    Email,
}

impl IocType {
    /// IOC-type auto-detection per §4.4: 32/40/64-char hex → hash (by
    /// length); digits+dots with ≥3 dots → IPv4; `http` prefix → URL;
    /// else domain.
    pub fn detect(ioc: &str) -> IocType {
        let is_hex = !ioc.is_empty() && ioc.chars().all(|c| c.is_ascii_hexdigit());
        if is_hex {
            match ioc.len() {
                32 => return IocType::HashMd5,
                40 => return IocType::HashSha1,
                64 => return IocType::HashSha256,
                _ => {}
            }
        }
        let digits_and_dots = ioc.chars().all(|c| c.is_ascii_digit() || c == '.');
        if digits_and_dots && ioc.matches('.').count() >= 3 {
            return IocType::Ip;
        }
        if ioc.starts_with("http://") || ioc.starts_with("https://") || ioc.starts_with("http") {
            return IocType::Url;
        }
        IocType::Domain
    }
}

/// Per-source detection record (§3.2 `detections`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub source: String,
    pub detection_rate: f64,
}

/// Discrete threat level derived from the aggregate score (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Critical,
    High,
    Medium,
    Low,
    Safe,
}

impl ThreatLevel {
    /// Thresholds from §4.4: the aggregate score is in `[0, 100]`.
    pub fn from_score(score: f64) -> ThreatLevel {
        if score >= 70.0 {
            ThreatLevel::Critical
        } else if score >= 50.0 {
            ThreatLevel::High
        } else if score >= 30.0 {
            ThreatLevel::Medium
        } else if score >= 10.0 {
            ThreatLevel::Low
        } else {
            ThreatLevel::Safe
        }
    }
}

/// Aggregated threat intel (§3.2), the output of C5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedIntel {
    pub ioc: String,
    pub ioc_type: IocType,
    pub aggregate_score: f64,
    pub threat_level: ThreatLevel,
    pub detected_by_count: u32,
    pub total_sources: u32,
    pub detections: Vec<Detection>,
    pub tags: BTreeSet<String>,
    pub confidence: f64,
    pub queried_at: DateTime<Utc>,
}

impl AggregatedIntel {
    /// §3.2 invariant.
    pub fn is_consistent(&self) -> bool {
        self.detected_by_count <= self.total_sources
            && (0.0..=100.0).contains(&self.aggregate_score)
            && (0.0..=1.0).contains(&self.confidence)
    }
}
