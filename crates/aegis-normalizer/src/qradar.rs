//! IBM QRadar offense processor (§4.1, C1). Applies a magnitude-weighted
//! severity adjustment on top of the base numeric severity, and
//! coerces `start_time` through the shared millisecond/second detector
//! in [`crate::timestamp`] rather than always dividing by 1000 (§9
//! open question — a fixed division assumes every offense feed
//! carries millisecond epochs, which does not hold for offenses
//! replayed from older exports).

use aegis_common::{AlertType, CanonicalAlert, NormalizedData, Severity};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::NormalizationError;
use crate::fields::{extract_first, extract_port};
use crate::ioc::extract_iocs;
use crate::timestamp::extract_timestamp;
use crate::FormatProcessor;

const ALIAS_OFFENSE_ID: &[&str] = &["offense_id", "id"];
const ALIAS_TIMESTAMP: &[&str] = &["start_time", "last_updated_time"];
const ALIAS_SEVERITY: &[&str] = &["severity"];
const ALIAS_MAGNITUDE: &[&str] = &["magnitude"];
const ALIAS_CATEGORY: &[&str] = &["category", "offense_type", "categories"];
const ALIAS_DESCRIPTION: &[&str] = &["description", "offense_description", "message"];
const ALIAS_SOURCE_IP: &[&str] = &["source_ip", "offense_source", "source_address"];
const ALIAS_TARGET_IP: &[&str] = &["destination_ip", "local_destination_address", "destination_address"];
const ALIAS_SOURCE_PORT: &[&str] = &["source_port"];
const ALIAS_DEST_PORT: &[&str] = &["destination_port"];
const ALIAS_PROTOCOL: &[&str] = &["protocol"];
const ALIAS_ASSET_ID: &[&str] = &["asset_id", "source_asset_id", "destination_asset_id"];
const ALIAS_USER_ID: &[&str] = &["username", "user_id"];

fn magnitude_multiplier(level: &str) -> f64 {
    match level {
        "high" => 1.5,
        "low" => 0.5,
        _ => 1.0,
    }
}

fn magnitude_level(raw: &Value) -> &'static str {
    match extract_first(raw, ALIAS_MAGNITUDE).map(|s| s.to_lowercase()).as_deref() {
        Some("high") => "high",
        Some("low") => "low",
        _ => "medium",
    }
}

fn base_severity(raw: &Value) -> Severity {
    let severity = extract_first(raw, ALIAS_SEVERITY)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    if severity >= 9.0 {
        Severity::Critical
    } else if severity >= 7.0 {
        Severity::High
    } else if severity >= 4.0 {
        Severity::Medium
    } else if severity >= 1.0 {
        Severity::Low
    } else {
        Severity::Info
    }
}

/// Apply the magnitude multiplier on top of the base severity. Only a
/// base `Medium` severity is eligible for adjustment, matching the
/// original's upgrade/downgrade carve-out.
fn adjust_severity(base: Severity, raw: &Value) -> Severity {
    if base != Severity::Medium {
        return base;
    }
    let level = magnitude_level(raw);
    match magnitude_multiplier(level) {
        m if m > 1.0 => Severity::High,
        m if m < 1.0 => Severity::Low,
        _ => Severity::Medium,
    }
}

fn map_alert_type(raw: &Value) -> AlertType {
    let Some(tag) = extract_first(raw, ALIAS_CATEGORY).map(|s| s.to_lowercase()) else {
        return AlertType::Other;
    };
    if tag.contains("malware") {
        AlertType::Malware
    } else if tag.contains("phish") {
        AlertType::Phishing
    } else if tag.contains("brute") || tag.contains("authentication") {
        AlertType::BruteForce
    } else if tag.contains("denial") || tag.contains("ddos") {
        AlertType::Ddos
    } else if tag.contains("exfil") {
        AlertType::DataExfiltration
    } else if tag.contains("unauthorized") || tag.contains("privilege") || tag.contains("access") {
        AlertType::UnauthorizedAccess
    } else if tag.contains("anomal") {
        AlertType::Anomaly
    } else {
        AlertType::Other
    }
}

pub struct QRadarProcessor;

impl FormatProcessor for QRadarProcessor {
    fn source_name(&self) -> &'static str {
        "qradar"
    }

    fn process(&self, raw: &Value) -> Result<CanonicalAlert, NormalizationError> {
        if !raw.is_object() {
            return Err(NormalizationError::NotAnObject);
        }

        let offense_id = extract_first(raw, ALIAS_OFFENSE_ID)
            .ok_or(NormalizationError::MissingField("offense_id"))?;
        let alert_id = format!("QRADAR-{offense_id}");

        let description = extract_first(raw, ALIAS_DESCRIPTION)
            .map(|s| CanonicalAlert::clamp_description(&s))
            .unwrap_or_default();
        let iocs = extract_iocs(&description);

        let base = base_severity(raw);
        let severity = adjust_severity(base, raw);

        let mut vendor_fields = BTreeMap::new();
        vendor_fields.insert("offense_id".to_string(), offense_id);
        vendor_fields.insert("magnitude_level".to_string(), magnitude_level(raw).to_string());

        Ok(CanonicalAlert {
            alert_id,
            timestamp: extract_timestamp(raw, ALIAS_TIMESTAMP),
            alert_type: map_alert_type(raw),
            severity,
            description,
            source_ip: extract_first(raw, ALIAS_SOURCE_IP),
            target_ip: extract_first(raw, ALIAS_TARGET_IP),
            source_port: extract_port(raw, ALIAS_SOURCE_PORT),
            destination_port: extract_port(raw, ALIAS_DEST_PORT),
            protocol: extract_first(raw, ALIAS_PROTOCOL),
            asset_id: extract_first(raw, ALIAS_ASSET_ID),
            user_id: extract_first(raw, ALIAS_USER_ID),
            file_hash: None,
            url: None,
            domain: None,
            source: "qradar".to_string(),
            source_ref: None,
            raw_data: raw.clone(),
            normalized_data: NormalizedData {
                source_type: "qradar".to_string(),
                normalized_at: chrono::Utc::now(),
                iocs_extracted: iocs,
                vendor_fields,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn offense_id_is_prefixed() {
        let raw = json!({"offense_id": 4821, "severity": 5, "magnitude": "medium"});
        let alert = QRadarProcessor.process(&raw).unwrap();
        assert_eq!(alert.alert_id, "QRADAR-4821");
    }

    #[test]
    fn medium_severity_upgraded_by_high_magnitude() {
        let raw = json!({
            "offense_id": 1,
            "severity": 6,
            "magnitude": "high",
            "offense_type": "Malware Detected",
        });
        let alert = QRadarProcessor.process(&raw).unwrap();
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.alert_type, AlertType::Malware);
    }

    #[test]
    fn medium_severity_downgraded_by_low_magnitude() {
        let raw = json!({"offense_id": 1, "severity": 5, "magnitude": "low"});
        let alert = QRadarProcessor.process(&raw).unwrap();
        assert_eq!(alert.severity, Severity::Low);
    }

    #[test]
    fn non_medium_base_severity_is_untouched_by_magnitude() {
        let raw = json!({"offense_id": 1, "severity": 9, "magnitude": "low"});
        let alert = QRadarProcessor.process(&raw).unwrap();
        assert_eq!(alert.severity, Severity::Critical);
    }

    #[test]
    fn unrecognized_magnitude_string_behaves_as_medium() {
        let raw = json!({"offense_id": 1, "severity": 5, "magnitude": "extreme"});
        let alert = QRadarProcessor.process(&raw).unwrap();
        assert_eq!(alert.severity, Severity::Medium);
    }

    #[test]
    fn millisecond_start_time_is_detected() {
        let raw = json!({"offense_id": 1, "severity": 5, "start_time": 1_700_000_000_000i64});
        let alert = QRadarProcessor.process(&raw).unwrap();
        assert_eq!(alert.timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn missing_offense_id_is_rejected() {
        let raw = json!({"severity": 5});
        assert!(matches!(
            QRadarProcessor.process(&raw),
            Err(NormalizationError::MissingField("offense_id"))
        ));
    }
}
