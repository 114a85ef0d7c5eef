//! Common Event Format processor (§4.1, C1). CEF messages carry a
//! fixed 7-field pipe-delimited header followed by a space-delimited
//! `key=value` extension, where both keys and values may contain
//! escaped characters. Header-level pipe escaping is not handled —
//! no feed this processor has seen emits escaped pipes inside the
//! first seven fields.

use std::collections::BTreeMap;

use aegis_common::{AlertType, CanonicalAlert, NormalizedData, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::NormalizationError;
use crate::fields::{extract_first, extract_port};
use crate::ioc::extract_iocs;
use crate::timestamp::extract_timestamp;
use crate::FormatProcessor;

static EXTENSION_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)([A-Za-z][\w.]*)=").unwrap());

struct CefHeader {
    vendor: String,
    product: String,
    signature_id: String,
    name: String,
    severity_raw: String,
}

fn parse_cef_string(line: &str) -> Result<(CefHeader, BTreeMap<String, String>), NormalizationError> {
    let body = line
        .strip_prefix("CEF:")
        .ok_or_else(|| NormalizationError::MalformedCef("missing CEF: prefix".to_string()))?;

    let parts: Vec<&str> = body.splitn(7, '|').collect();
    if parts.len() != 7 {
        return Err(NormalizationError::MalformedCef(format!(
            "expected 7 pipe-delimited header fields, found {}",
            parts.len()
        )));
    }

    let header = CefHeader {
        vendor: parts[1].to_string(),
        product: parts[2].to_string(),
        signature_id: parts[4].to_string(),
        name: parts[5].to_string(),
        severity_raw: parts[6].to_string(),
    };

    // parts[6] above is actually "Severity|Extension" combined only if splitn(7, ..)
    // leaves the remainder in the last slot; re-split that slot once more to
    // separate CEF severity from the extension string.
    let (severity_raw, extension_str) = match header.severity_raw.split_once('|') {
        Some((sev, ext)) => (sev.to_string(), ext.to_string()),
        None => (header.severity_raw.clone(), String::new()),
    };

    let extension = split_cef_extension(&extension_str);

    Ok((
        CefHeader {
            severity_raw,
            ..header
        },
        extension,
    ))
}

/// Split a CEF extension string into key/value pairs. Values may
/// contain spaces; the next `key=` token (unescaped) marks the end of
/// the previous value. `\=`, `\\`, and `\n` are unescaped in values
/// per the CEF spec.
fn split_cef_extension(ext: &str) -> BTreeMap<String, String> {
    let mut keys = Vec::new();
    for caps in EXTENSION_KEY.captures_iter(ext) {
        let m = caps.get(0).unwrap();
        let key = caps.get(1).unwrap();
        keys.push((key.as_str().to_string(), m.start(), key.end()));
    }

    let mut map = BTreeMap::new();
    for (i, (key, match_start, value_start)) in keys.iter().enumerate() {
        let value_end = keys.get(i + 1).map(|(_, s, _)| *s).unwrap_or(ext.len());
        let raw_value = ext.get(*value_start..value_end).unwrap_or("").trim();
        let _ = match_start;
        map.insert(key.clone(), unescape_cef_value(raw_value));
    }
    map
}

fn unescape_cef_value(value: &str) -> String {
    let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
    value
        .replace("\\=", "=")
        .replace("\\n", "\n")
        .replace("\\\\", "\\")
        .trim()
        .to_string()
}

fn extension_to_value(extension: &BTreeMap<String, String>) -> Value {
    let map = extension
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}

fn map_severity(raw: &str) -> Severity {
    if let Ok(n) = raw.trim().parse::<f64>() {
        return if n >= 9.0 {
            Severity::Critical
        } else if n >= 7.0 {
            Severity::High
        } else if n >= 4.0 {
            Severity::Medium
        } else {
            Severity::Low
        };
    }
    match raw.to_lowercase().as_str() {
        "critical" | "very-high" => Severity::Critical,
        "high" => Severity::High,
        "medium" => Severity::Medium,
        "low" => Severity::Low,
        "unknown" => Severity::Info,
        _ => Severity::Medium,
    }
}

fn map_alert_type(header: &CefHeader, extension: &Value) -> AlertType {
    let mut tag = format!("{} {}", header.name, header.signature_id).to_lowercase();
    if let Some(cat) = extract_first(extension, &["cat", "cs1"]) {
        tag.push(' ');
        tag.push_str(&cat.to_lowercase());
    }
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

const ALIAS_SOURCE_IP: &[&str] = &["src", "sourceAddress"];
const ALIAS_TARGET_IP: &[&str] = &["dst", "destinationAddress"];
const ALIAS_SOURCE_PORT: &[&str] = &["spt"];
const ALIAS_DEST_PORT: &[&str] = &["dpt"];
const ALIAS_PROTOCOL: &[&str] = &["proto"];
const ALIAS_ASSET_ID: &[&str] = &["dvc", "dvchost"];
const ALIAS_USER_ID: &[&str] = &["suser", "duser"];
const ALIAS_FILE_HASH: &[&str] = &["fileHash"];
const ALIAS_URL: &[&str] = &["request"];
const ALIAS_TIMESTAMP: &[&str] = &["rt", "end", "start"];
const ALIAS_ALERT_ID: &[&str] = &["externalId", "eventId"];
const ALIAS_DESCRIPTION: &[&str] = &["msg", "message"];

pub struct CefProcessor;

impl FormatProcessor for CefProcessor {
    fn source_name(&self) -> &'static str {
        "cef"
    }

    fn process(&self, raw: &Value) -> Result<CanonicalAlert, NormalizationError> {
        let line = raw
            .as_str()
            .map(str::to_string)
            .or_else(|| raw.get("raw").and_then(Value::as_str).map(str::to_string))
            .ok_or(NormalizationError::MissingField("raw"))?;

        let (header, extension) = parse_cef_string(&line)?;
        let extension_value = extension_to_value(&extension);

        let description = CanonicalAlert::clamp_description(
            &extract_first(&extension_value, ALIAS_DESCRIPTION).unwrap_or_else(|| header.name.clone()),
        );
        let mut iocs = extract_iocs(&description);
        for (kind_field, kind) in [
            ("sourceAddress", aegis_common::IocKind::Ip),
            ("destinationAddress", aegis_common::IocKind::Ip),
        ] {
            if let Some(v) = extension.get(kind_field) {
                iocs.entry(kind).or_default().insert(v.clone());
            }
        }

        let alert_id = extract_first(&extension_value, ALIAS_ALERT_ID)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(CanonicalAlert {
            alert_id,
            timestamp: extract_timestamp(&extension_value, ALIAS_TIMESTAMP),
            alert_type: map_alert_type(&header, &extension_value),
            severity: map_severity(&header.severity_raw),
            description,
            source_ip: extract_first(&extension_value, ALIAS_SOURCE_IP),
            target_ip: extract_first(&extension_value, ALIAS_TARGET_IP),
            source_port: extract_port(&extension_value, ALIAS_SOURCE_PORT),
            destination_port: extract_port(&extension_value, ALIAS_DEST_PORT),
            protocol: extract_first(&extension_value, ALIAS_PROTOCOL),
            asset_id: extract_first(&extension_value, ALIAS_ASSET_ID),
            user_id: extract_first(&extension_value, ALIAS_USER_ID),
            file_hash: extract_first(&extension_value, ALIAS_FILE_HASH),
            url: extract_first(&extension_value, ALIAS_URL),
            domain: None,
            source: "cef".to_string(),
            source_ref: Some(format!("{}/{}/{}", header.vendor, header.product, header.signature_id)),
            raw_data: Value::String(line),
            normalized_data: NormalizedData {
                source_type: "cef".to_string(),
                normalized_at: chrono::Utc::now(),
                iocs_extracted: iocs,
                vendor_fields: extension,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "CEF:0|Palo Alto Networks|PAN-OS|10.1|threat-1|Malware detected in traffic|8|src=10.0.0.5 dst=192.168.1.10 spt=443 dpt=51234 suser=jdoe cat=malware act=blocked msg=payload contained \\=embedded\\= equals";

    #[test]
    fn parses_header_and_extension() {
        let alert = CefProcessor.process(&Value::String(SAMPLE.to_string())).unwrap();
        assert_eq!(alert.source, "cef");
        assert_eq!(alert.source_ref.as_deref(), Some("Palo Alto Networks/PAN-OS/threat-1"));
        assert_eq!(alert.source_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(alert.target_ip.as_deref(), Some("192.168.1.10"));
        assert_eq!(alert.source_port, Some(443));
        assert_eq!(alert.destination_port, Some(51234));
        assert_eq!(alert.user_id.as_deref(), Some("jdoe"));
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.alert_type, AlertType::Malware);
    }

    #[test]
    fn escaped_equals_in_value_is_unescaped() {
        let (_, extension) = parse_cef_string(SAMPLE).unwrap();
        assert_eq!(extension.get("msg").unwrap(), "payload contained =embedded= equals");
    }

    #[test]
    fn malformed_header_is_rejected() {
        let bad = "CEF:0|OnlyVendor|Product";
        assert!(parse_cef_string(bad).is_err());
    }

    #[test]
    fn numeric_severity_maps_to_bucket() {
        assert_eq!(map_severity("9"), Severity::Critical);
        assert_eq!(map_severity("2"), Severity::Low);
        assert_eq!(map_severity("Very-High"), Severity::Critical);
    }

    #[test]
    fn msg_extension_field_is_preferred_over_header_name() {
        let line = r#"CEF:0|Vendor|IDS|1.0|100|Test|5|msg="hello world" src=1.2.3.4"#;
        let alert = CefProcessor.process(&Value::String(line.to_string())).unwrap();
        assert_eq!(alert.description, "hello world");
    }

    #[test]
    fn missing_msg_extension_falls_back_to_header_name() {
        let line = "CEF:0|Vendor|IDS|1.0|100|Test event name|5|src=1.2.3.4";
        let alert = CefProcessor.process(&Value::String(line.to_string())).unwrap();
        assert_eq!(alert.description, "Test event name");
    }
}
