//! Exact-duplicate fingerprint cache (§4.3). A bounded `moka` cache
//! with a fixed TTL, so an exact repeat past the lookback window is
//! treated as fresh again rather than suppressed forever.

use std::time::Duration;

use moka::sync::Cache;

pub const DEFAULT_CAPACITY: u64 = 10_000;
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(24 * 60 * 60);

/// Tracks fingerprints seen within the lookback window. A `mark`
/// returns whether the fingerprint was already present — the caller
/// treats that as "exact duplicate, drop".
pub struct FingerprintCache {
    cache: Cache<String, ()>,
}

impl FingerprintCache {
    pub fn new(capacity: u64, lookback: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(lookback)
            .build();
        Self { cache }
    }

    /// Record `fingerprint` as seen, returning `true` if it was
    /// already present (a duplicate) and `false` if this is the first
    /// sighting within the window.
    pub fn mark(&self, fingerprint: &str) -> bool {
        if self.cache.contains_key(fingerprint) {
            return true;
        }
        self.cache.insert(fingerprint.to_string(), ());
        false
    }

    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.entry_count() == 0
    }
}

impl Default for FingerprintCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_LOOKBACK)
    }
}
