//! Alert fingerprinting (§4.3). The fingerprint identifies an exact
//! repeat of the same vendor alert, as opposed to aggregation, which
//! groups distinct-but-related alerts.

use sha2::{Digest, Sha256};

/// Deterministic fingerprint over `(source, alert_id)` — the identity
/// tuple every `CanonicalAlert` carries (§3.1). Truncated to 16 bytes
/// (32 hex chars), matching the half-digest convention the threat-intel
/// cache uses for its own content hashes.
pub fn compute(source: &str, alert_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b":");
    hasher.update(alert_id.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_identity_yields_same_fingerprint() {
        assert_eq!(compute("splunk", "notable-1"), compute("splunk", "notable-1"));
    }

    #[test]
    fn different_source_yields_different_fingerprint() {
        assert_ne!(compute("splunk", "notable-1"), compute("qradar", "notable-1"));
    }
}
