//! Canonical alert schema (§3.1) — the shape every format processor
//! normalizes into and every downstream stage consumes.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity as carried by the canonical alert. Exhaustive — unknown
/// vendor values map to `Medium`, never rejected (§3.1 invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

/// Alert type taxonomy (§3.1). Unknown vendor values map to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Malware,
    Phishing,
    BruteForce,
    Ddos,
    DataExfiltration,
    UnauthorizedAccess,
    Anomaly,
    Other,
}

impl Default for AlertType {
    fn default() -> Self {
        AlertType::Other
    }
}

/// IOC kind, one bucket per `iocs_extracted` map entry (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IocKind {
    Ip,
    Md5,
    Sha1,
    Sha256,
    Url,
    Domain,
    Email,
}

impl IocKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IocKind::Ip => "ip",
            IocKind::Md5 => "md5",
            IocKind::Sha1 => "sha1",
            IocKind::Sha256 => "sha256",
            IocKind::Url => "url",
            IocKind::Domain => "domain",
            IocKind::Email => "email",
        }
    }
}

/// Set semantics per kind — duplicates within one alert are collapsed
/// (§4.2 "Deduplication").
pub type IocMap = BTreeMap<IocKind, BTreeSet<String>>;

/// Bookkeeping a format processor attaches alongside the extracted
/// IOCs (§4.1 "Every processor preserves ... normalized_data").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedData {
    pub source_type: String,
    pub normalized_at: DateTime<Utc>,
    pub iocs_extracted: IocMap,
    /// Vendor-specific metadata preserved verbatim (e.g. splunk_app,
    /// offense_id, cef_version) — not part of the canonical schema but
    /// useful for audit and downstream enrichment.
    pub vendor_fields: BTreeMap<String, String>,
}

/// Canonical alert (§3.1), the output of C1 and the input to C7.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalAlert {
    pub alert_id: String,
    pub timestamp: DateTime<Utc>,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub description: String,

    pub source_ip: Option<String>,
    pub target_ip: Option<String>,
    pub source_port: Option<u16>,
    pub destination_port: Option<u16>,
    pub protocol: Option<String>,

    pub asset_id: Option<String>,
    pub user_id: Option<String>,

    pub file_hash: Option<String>,
    pub url: Option<String>,
    pub domain: Option<String>,

    pub source: String,
    pub source_ref: Option<String>,

    pub raw_data: serde_json::Value,
    pub normalized_data: NormalizedData,
}

impl CanonicalAlert {
    /// `(source, alert_id)` tuple that uniquely identifies this alert
    /// per §3.1's invariant; the input to C3's fingerprint.
    pub fn identity(&self) -> (&str, &str) {
        (self.source.as_str(), self.alert_id.as_str())
    }

    /// Description truncated to the §3.1 2000-char bound. Processors
    /// should call this before constructing the alert rather than
    /// relying on callers to enforce it.
    pub fn clamp_description(text: &str) -> String {
        if text.chars().count() > 2000 {
            text.chars().take(2000).collect()
        } else {
            text.to_string()
        }
    }
}
