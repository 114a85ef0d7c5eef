//! Data-driven field-alias extraction (§6.2). Each processor owns its
//! own ordered alias table — "first alias present wins" — and drives
//! it through these generic helpers instead of repeating the
//! lookup/coerce logic per field, per processor.

use serde_json::Value;

/// Walk `aliases` in order and return the first key present in `raw`
/// whose value is not null, coerced to a string. Numbers and bools
/// are stringified; nested objects/arrays are skipped (no vendor
/// field in scope carries one).
pub fn extract_first(raw: &Value, aliases: &[&str]) -> Option<String> {
    let obj = raw.as_object()?;
    for alias in aliases {
        if let Some(value) = obj.get(*alias) {
            if let Some(s) = stringify_scalar(value) {
                return Some(s);
            }
        }
    }
    None
}

fn stringify_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Same as [`extract_first`] but parsed as a port number; out-of-range
/// or non-numeric values are treated as absent rather than an error,
/// matching the source processors' lenient field coercion.
pub fn extract_port(raw: &Value, aliases: &[&str]) -> Option<u16> {
    extract_first(raw, aliases).and_then(|s| s.trim().parse::<u16>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_alias_present_wins() {
        let raw = json!({"src_ip": "10.0.0.1", "source_address": "10.0.0.2"});
        assert_eq!(
            extract_first(&raw, &["src_ip", "source_address"]),
            Some("10.0.0.1".to_string())
        );
    }

    #[test]
    fn skips_null_and_falls_through() {
        let raw = json!({"src_ip": null, "source_address": "10.0.0.2"});
        assert_eq!(
            extract_first(&raw, &["src_ip", "source_address"]),
            Some("10.0.0.2".to_string())
        );
    }

    #[test]
    fn port_out_of_range_is_absent() {
        let raw = json!({"dest_port": "99999"});
        assert_eq!(extract_port(&raw, &["dest_port"]), None);
    }

    #[test]
    fn numeric_port_coerces() {
        let raw = json!({"dest_port": 443});
        assert_eq!(extract_port(&raw, &["dest_port"]), Some(443));
    }
}
