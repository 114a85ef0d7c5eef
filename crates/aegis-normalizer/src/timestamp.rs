//! Timestamp coercion shared by every processor (§4.1, §9). Unlike the
//! original QRadar processor, which always divided an epoch timestamp
//! by 1000 (assuming milliseconds), this coerces by magnitude: a
//! numeric epoch above 10^12 is treated as milliseconds, otherwise as
//! seconds. Values below the year-2001 millisecond threshold never
//! occur in the QRadar offense feed this was distilled from, so the
//! magnitude split is unambiguous in practice.
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

const MS_THRESHOLD: i64 = 1_000_000_000_000;

/// Ordered list of string timestamp formats tried before falling back
/// to RFC3339 parsing.
const STRING_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a raw alert's timestamp field, trying `aliases` in order.
/// Falls back to "now" if every alias is absent or unparseable, so a
/// malformed timestamp never fails normalization outright (§4.1 "a
/// processor never rejects an alert for a missing/malformed
/// timestamp").
pub fn extract_timestamp(raw: &Value, aliases: &[&str]) -> DateTime<Utc> {
    let Some(obj) = raw.as_object() else {
        return Utc::now();
    };
    for alias in aliases {
        let Some(value) = obj.get(*alias) else {
            continue;
        };
        if let Some(ts) = coerce_value(value) {
            return ts;
        }
    }
    Utc::now()
}

fn coerce_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let epoch = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            coerce_epoch(epoch)
        }
        Value::String(s) => coerce_string(s),
        _ => None,
    }
}

fn coerce_epoch(epoch: i64) -> Option<DateTime<Utc>> {
    if epoch.abs() > MS_THRESHOLD {
        Utc.timestamp_millis_opt(epoch).single()
    } else {
        Utc.timestamp_opt(epoch, 0).single()
    }
}

fn coerce_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(epoch) = s.trim().parse::<i64>() {
        return coerce_epoch(epoch);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in STRING_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seconds_epoch_below_threshold() {
        let raw = json!({"ts": 1_700_000_000});
        let dt = extract_timestamp(&raw, &["ts"]);
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }

    #[test]
    fn milliseconds_epoch_above_threshold() {
        let raw = json!({"ts": 1_700_000_000_000i64});
        let dt = extract_timestamp(&raw, &["ts"]);
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }

    #[test]
    fn rfc3339_string() {
        let raw = json!({"ts": "2024-01-15T10:30:00Z"});
        let dt = extract_timestamp(&raw, &["ts"]);
        assert_eq!(dt.timestamp(), 1_705_314_600);
    }

    #[test]
    fn missing_field_falls_back_to_now() {
        let raw = json!({});
        let before = Utc::now().timestamp();
        let dt = extract_timestamp(&raw, &["ts"]);
        assert!(dt.timestamp() >= before);
    }
}
