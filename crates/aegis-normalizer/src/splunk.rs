//! Splunk Enterprise Security notable-event processor (§4.1, C1).
//! Field aliasing favors common Splunk CIM field names first, falling
//! back to raw/underscore variants last.

use aegis_common::{AlertType, CanonicalAlert, IocKind, NormalizedData, Severity};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::NormalizationError;
use crate::fields::{extract_first, extract_port};
use crate::ioc::{classify_hash, extract_iocs};
use crate::timestamp::extract_timestamp;
use crate::FormatProcessor;

const ALIAS_ALERT_ID: &[&str] = &["alert_id", "event_id", "_cd"];
const ALIAS_TIMESTAMP: &[&str] = &["_time", "timestamp", "time"];
const ALIAS_SEVERITY: &[&str] = &["severity", "urgency", "priority"];
const ALIAS_ALERT_TYPE: &[&str] = &["alert_type", "signature", "category"];
const ALIAS_DESCRIPTION: &[&str] = &["description", "message", "search_name", "signature"];
const ALIAS_SOURCE_IP: &[&str] = &["src_ip", "src", "source_ip", "orig_src"];
const ALIAS_TARGET_IP: &[&str] = &["dest_ip", "dest", "target_ip", "orig_dest"];
const ALIAS_SOURCE_PORT: &[&str] = &["src_port", "source_port"];
const ALIAS_DEST_PORT: &[&str] = &["dest_port", "destination_port"];
const ALIAS_PROTOCOL: &[&str] = &["protocol", "proto", "transport"];
const ALIAS_ASSET_ID: &[&str] = &["dest_host", "host", "asset_id", "dvc"];
const ALIAS_USER_ID: &[&str] = &["user", "src_user", "user_id"];
const ALIAS_FILE_HASH: &[&str] = &["file_hash", "sha256", "md5", "file_hash_sha256"];
const ALIAS_URL: &[&str] = &["url", "uri", "dest_url"];
const ALIAS_DOMAIN: &[&str] = &["domain", "dest_domain", "query"];
const ALIAS_SEARCH_ID: &[&str] = &["search_id", "sid"];
const ALIAS_RESULT_ID: &[&str] = &["result_id", "rid"];

fn map_severity(raw: &Value) -> Severity {
    match extract_first(raw, ALIAS_SEVERITY).map(|s| s.to_lowercase()) {
        Some(s) if s == "critical" || s == "10" || s == "9" => Severity::Critical,
        Some(s) if s == "high" || s == "8" || s == "7" => Severity::High,
        Some(s) if s == "medium" || s == "6" || s == "5" || s == "4" => Severity::Medium,
        Some(s) if s == "low" || s == "3" || s == "2" || s == "1" => Severity::Low,
        Some(s) if s == "informational" || s == "info" || s == "0" => Severity::Info,
        _ => Severity::Medium,
    }
}

fn map_alert_type(raw: &Value) -> AlertType {
    let Some(tag) = extract_first(raw, ALIAS_ALERT_TYPE).map(|s| s.to_lowercase()) else {
        return AlertType::Other;
    };
    if tag.contains("malware") {
        AlertType::Malware
    } else if tag.contains("phish") {
        AlertType::Phishing
    } else if tag.contains("brute") {
        AlertType::BruteForce
    } else if tag.contains("ddos") || tag.contains("denial") {
        AlertType::Ddos
    } else if tag.contains("exfil") {
        AlertType::DataExfiltration
    } else if tag.contains("unauthorized") || tag.contains("privilege") {
        AlertType::UnauthorizedAccess
    } else if tag.contains("anomal") {
        AlertType::Anomaly
    } else {
        AlertType::Other
    }
}

fn source_ref(raw: &Value) -> Option<String> {
    extract_first(raw, ALIAS_SEARCH_ID).or_else(|| extract_first(raw, ALIAS_RESULT_ID))
}

pub struct SplunkProcessor;

impl FormatProcessor for SplunkProcessor {
    fn source_name(&self) -> &'static str {
        "splunk"
    }

    fn process(&self, raw: &Value) -> Result<CanonicalAlert, NormalizationError> {
        if !raw.is_object() {
            return Err(NormalizationError::NotAnObject);
        }

        let alert_id = extract_first(raw, ALIAS_ALERT_ID)
            .ok_or(NormalizationError::MissingField("alert_id"))?;
        let description = extract_first(raw, ALIAS_DESCRIPTION)
            .map(|s| CanonicalAlert::clamp_description(&s))
            .unwrap_or_default();

        let file_hash = extract_first(raw, ALIAS_FILE_HASH);
        let mut iocs = extract_iocs(&description);
        if let Some(hash) = &file_hash {
            if let Some(kind) = classify_hash(hash) {
                iocs.entry(kind).or_default().insert(hash.clone());
            }
        }

        let mut vendor_fields = BTreeMap::new();
        if let Some(app) = extract_first(raw, &["app", "splunk_app"]) {
            vendor_fields.insert("splunk_app".to_string(), app);
        }
        if let Some(index) = extract_first(raw, &["index"]) {
            vendor_fields.insert("index".to_string(), index);
        }

        Ok(CanonicalAlert {
            alert_id,
            timestamp: extract_timestamp(raw, ALIAS_TIMESTAMP),
            alert_type: map_alert_type(raw),
            severity: map_severity(raw),
            description,
            source_ip: extract_first(raw, ALIAS_SOURCE_IP),
            target_ip: extract_first(raw, ALIAS_TARGET_IP),
            source_port: extract_port(raw, ALIAS_SOURCE_PORT),
            destination_port: extract_port(raw, ALIAS_DEST_PORT),
            protocol: extract_first(raw, ALIAS_PROTOCOL),
            asset_id: extract_first(raw, ALIAS_ASSET_ID),
            user_id: extract_first(raw, ALIAS_USER_ID),
            file_hash,
            url: extract_first(raw, ALIAS_URL),
            domain: extract_first(raw, ALIAS_DOMAIN),
            source: "splunk".to_string(),
            source_ref: source_ref(raw),
            raw_data: raw.clone(),
            normalized_data: NormalizedData {
                source_type: "splunk".to_string(),
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
    fn normalizes_minimal_notable_event() {
        let raw = json!({
            "alert_id": "notable-123",
            "_time": 1_700_000_000,
            "severity": "high",
            "alert_type": "malware_detected",
            "signature": "Trojan.Generic found on host",
            "src_ip": "10.0.0.5",
            "dest_ip": "192.168.1.10",
            "search_id": "scheduler__admin_search_abc123",
        });

        let alert = SplunkProcessor.process(&raw).unwrap();
        assert_eq!(alert.alert_id, "notable-123");
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.alert_type, AlertType::Malware);
        assert_eq!(alert.source_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(alert.source, "splunk");
        assert!(alert.source_ref.unwrap().starts_with("scheduler__"));
    }

    #[test]
    fn missing_alert_id_is_rejected() {
        let raw = json!({"severity": "high"});
        assert!(matches!(
            SplunkProcessor.process(&raw),
            Err(NormalizationError::MissingField("alert_id"))
        ));
    }

    #[test]
    fn unknown_severity_defaults_to_medium() {
        let raw = json!({"alert_id": "a1", "severity": "bogus"});
        let alert = SplunkProcessor.process(&raw).unwrap();
        assert_eq!(alert.severity, Severity::Medium);
    }

    #[test]
    fn numeric_severity_is_floored_to_the_enum() {
        let raw = json!({"alert_id": "a3", "severity": 8});
        let alert = SplunkProcessor.process(&raw).unwrap();
        assert_eq!(alert.severity, Severity::High);
    }

    #[test]
    fn numeric_string_severity_is_floored_to_the_enum() {
        let raw = json!({"alert_id": "a4", "severity": "9"});
        let alert = SplunkProcessor.process(&raw).unwrap();
        assert_eq!(alert.severity, Severity::Critical);
    }

    #[test]
    fn file_hash_field_is_classified_into_iocs() {
        let raw = json!({
            "alert_id": "a2",
            "file_hash": "d41d8cd98f00b204e9800998ecf8427e",
        });
        let alert = SplunkProcessor.process(&raw).unwrap();
        assert!(alert.normalized_data.iocs_extracted[&IocKind::Md5]
            .contains("d41d8cd98f00b204e9800998ecf8427e"));
    }
}
