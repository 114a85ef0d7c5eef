//! IOC pattern recognition (C2, §4.2). Stateless regex recognizers
//! shared by every format processor, built once behind `Lazy` so the
//! compiled automata are shared across every `process()` call rather
//! than rebuilt per alert.

use std::collections::BTreeSet;

use aegis_common::{IocKind, IocMap};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b").unwrap()
});
static RE_MD5: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-fA-F0-9]{32}\b").unwrap());
static RE_SHA1: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-fA-F0-9]{40}\b").unwrap());
static RE_SHA256: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-fA-F0-9]{64}\b").unwrap());
static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s'\x22<>]+").unwrap());
static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\b").unwrap());
static RE_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}\b").unwrap()
});

/// Allowlisted TLDs for the bare-domain recognizer, matching the
/// original processors' conservative domain detection (avoids
/// flagging every dotted token as a domain).
const DOMAIN_TLD_ALLOWLIST: &[&str] = &[
    ".com", ".org", ".net", ".edu", ".gov", ".mil", ".io", ".co", ".uk",
];

fn insert(map: &mut IocMap, kind: IocKind, value: String) {
    map.entry(kind).or_insert_with(BTreeSet::new).insert(value);
}

/// Scan free text for IOCs, deduplicating within each kind (§4.2).
/// Hashes are classified by length only after the more specific
/// patterns (IPv4, URL, email) have had a chance to match, since a
/// 32-hex-char token could otherwise also satisfy a loose domain
/// pattern.
pub fn extract_iocs(text: &str) -> IocMap {
    let mut map = IocMap::new();

    for m in RE_IPV4.find_iter(text) {
        insert(&mut map, IocKind::Ip, m.as_str().to_string());
    }
    for m in RE_URL.find_iter(text) {
        insert(&mut map, IocKind::Url, m.as_str().to_string());
    }
    for m in RE_EMAIL.find_iter(text) {
        insert(&mut map, IocKind::Email, m.as_str().to_string());
    }
    for m in RE_SHA256.find_iter(text) {
        insert(&mut map, IocKind::Sha256, m.as_str().to_lowercase());
    }
    for m in RE_SHA1.find_iter(text) {
        insert(&mut map, IocKind::Sha1, m.as_str().to_lowercase());
    }
    for m in RE_MD5.find_iter(text) {
        insert(&mut map, IocKind::Md5, m.as_str().to_lowercase());
    }
    for m in RE_DOMAIN.find_iter(text) {
        let candidate = m.as_str();
        if DOMAIN_TLD_ALLOWLIST.iter().any(|tld| candidate.ends_with(tld)) {
            insert(&mut map, IocKind::Domain, candidate.to_lowercase());
        }
    }

    map
}

/// Classify a single already-isolated token (used when a vendor field
/// is known to carry exactly one IOC, e.g. a dedicated `file_hash`
/// field) rather than scanning free text.
pub fn classify_hash(token: &str) -> Option<IocKind> {
    match token.len() {
        32 if RE_MD5.is_match(token) => Some(IocKind::Md5),
        40 if RE_SHA1.is_match(token) => Some(IocKind::Sha1),
        64 if RE_SHA256.is_match(token) => Some(IocKind::Sha256),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_mixed_iocs_from_text() {
        let text = "connection from 10.0.0.5 to evil.example.com, \
                     payload hash d41d8cd98f00b204e9800998ecf8427e, \
                     beacon https://evil.example.com/c2 reported by ops@example.com";
        let iocs = extract_iocs(text);
        assert!(iocs[&IocKind::Ip].contains("10.0.0.5"));
        assert!(iocs[&IocKind::Domain].contains("evil.example.com"));
        assert!(iocs[&IocKind::Md5].contains("d41d8cd98f00b204e9800998ecf8427e"));
        assert!(iocs[&IocKind::Url].contains("https://evil.example.com/c2"));
        assert!(iocs[&IocKind::Email].contains("ops@example.com"));
    }

    #[test]
    fn dedups_repeated_ioc() {
        let iocs = extract_iocs("10.0.0.5 talked to 10.0.0.5 twice");
        assert_eq!(iocs[&IocKind::Ip].len(), 1);
    }

    #[test]
    fn rejects_non_allowlisted_tld_as_domain() {
        let iocs = extract_iocs("host internal.corp.localnet reached out");
        assert!(!iocs.contains_key(&IocKind::Domain));
    }

    #[test]
    fn classifies_hash_by_length() {
        assert_eq!(
            classify_hash("d41d8cd98f00b204e9800998ecf8427e"),
            Some(IocKind::Md5)
        );
        assert_eq!(classify_hash("not-a-hash"), None);
    }
}
