//! The `IntelProvider` seam every threat-intel adapter implements
//! (§4.4, C4). Each provider owns its own TTL cache and its own
//! mock-on-missing-key fallback; the aggregator only ever sees
//! `ProviderResult`.

use std::collections::BTreeSet;

use aegis_common::intel::IocType;
use async_trait::async_trait;

use crate::error::ProviderError;

/// One source's verdict on one IOC. `detection_rate` is a `0.0..=1.0`
/// fraction of engines/pulses/feeds that flagged it, normalized the
/// same way regardless of the source's native scale.
#[derive(Debug, Clone)]
pub struct ProviderResult {
    pub source: &'static str,
    pub detection_rate: f64,
    pub tags: BTreeSet<String>,
}

impl ProviderResult {
    /// The "clean"/mock result returned whenever a provider has no
    /// API key configured or the live query failed — never an error,
    /// per §4.4 ("a missing credential degrades confidence, it does
    /// not abort the query").
    pub fn mock(source: &'static str) -> Self {
        Self {
            source,
            detection_rate: 0.0,
            tags: BTreeSet::new(),
        }
    }
}

#[async_trait]
pub trait IntelProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Relative weight in the aggregate score (§4.4 `SOURCE_WEIGHTS`).
    fn weight(&self) -> f64;

    async fn query(&self, ioc: &str, ioc_type: IocType) -> Result<ProviderResult, ProviderError>;
}
