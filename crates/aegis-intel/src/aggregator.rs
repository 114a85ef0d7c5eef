//! Weighted aggregation across configured providers (§4.4). Parallel
//! fan-out via `futures::future::join_all`, bounded per-source by a
//! timeout so one slow provider never stalls the whole query.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use aegis_common::intel::{AggregatedIntel, Detection, IocType, ThreatLevel};
use chrono::Utc;
use futures::future::join_all;
use tracing::warn;

use crate::provider::{IntelProvider, ProviderResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct IntelAggregator {
    providers: Vec<Arc<dyn IntelProvider>>,
    timeout: Duration,
}

impl IntelAggregator {
    pub fn new(providers: Vec<Arc<dyn IntelProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub async fn aggregate(&self, ioc: &str, ioc_type: IocType) -> AggregatedIntel {
        let futures = self.providers.iter().map(|provider| {
            let provider = provider.clone();
            let ioc = ioc.to_string();
            let weight = provider.weight();
            async move {
                match tokio::time::timeout(self.timeout, provider.query(&ioc, ioc_type)).await {
                    Ok(Ok(result)) => Some((result, weight)),
                    Ok(Err(e)) => {
                        warn!(source = provider.name(), error = %e, "provider query failed");
                        None
                    }
                    Err(_) => {
                        warn!(source = provider.name(), "provider query timed out");
                        None
                    }
                }
            }
        });

        let responded: Vec<(ProviderResult, f64)> = join_all(futures).await.into_iter().flatten().collect();

        self.merge(ioc, ioc_type, responded)
    }

    fn merge(&self, ioc: &str, ioc_type: IocType, responded: Vec<(ProviderResult, f64)>) -> AggregatedIntel {
        let weight_sum: f64 = responded.iter().map(|(_, w)| w).sum();
        let weighted_sum: f64 = responded.iter().map(|(r, w)| r.detection_rate * w).sum();

        let aggregate_score = if weight_sum > 0.0 {
            (weighted_sum / weight_sum * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        let detected_by_count = responded.iter().filter(|(r, _)| r.detection_rate > 0.0).count() as u32;
        let total_sources = self.providers.len() as u32;
        // §8 scenario 5: confidence reflects how many sources answered at
        // all (non-null), not how many detected something — a source that
        // responds "clean" still raises confidence in the aggregate.
        let confidence = if total_sources > 0 {
            responded.len() as f64 / total_sources as f64
        } else {
            0.0
        };

        let mut tags = BTreeSet::new();
        let mut detections = Vec::with_capacity(responded.len());
        for (result, _) in &responded {
            tags.extend(result.tags.iter().cloned());
            detections.push(Detection {
                source: result.source.to_string(),
                detection_rate: result.detection_rate,
            });
        }

        AggregatedIntel {
            ioc: ioc.to_string(),
            ioc_type,
            aggregate_score,
            threat_level: ThreatLevel::from_score(aggregate_score),
            detected_by_count,
            total_sources,
            detections,
            tags,
            confidence,
            queried_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;

    struct FixedProvider {
        name: &'static str,
        weight: f64,
        rate: f64,
    }

    #[async_trait]
    impl IntelProvider for FixedProvider {
        fn name(&self) -> &'static str {
            self.name
        }
        fn weight(&self) -> f64 {
            self.weight
        }
        async fn query(&self, _ioc: &str, _ioc_type: IocType) -> Result<ProviderResult, ProviderError> {
            Ok(ProviderResult {
                source: self.name,
                detection_rate: self.rate,
                tags: BTreeSet::new(),
            })
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl IntelProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn weight(&self) -> f64 {
            1.0
        }
        async fn query(&self, _ioc: &str, _ioc_type: IocType) -> Result<ProviderResult, ProviderError> {
            Err(ProviderError::Request {
                source: "failing",
                reason: "boom".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn weighted_average_matches_source_weights() {
        let providers: Vec<Arc<dyn IntelProvider>> = vec![
            Arc::new(FixedProvider { name: "virustotal", weight: 0.4, rate: 0.5 }),
            Arc::new(FixedProvider { name: "otx", weight: 0.3, rate: 1.0 }),
            Arc::new(FixedProvider { name: "abuse_ch", weight: 0.3, rate: 0.0 }),
        ];
        let aggregator = IntelAggregator::new(providers, DEFAULT_TIMEOUT);
        let intel = aggregator.aggregate("1.2.3.4", IocType::Ip).await;

        let expected = (0.4 * 0.5 + 0.3 * 1.0 + 0.3 * 0.0) / 1.0 * 100.0;
        assert!((intel.aggregate_score - expected).abs() < 1e-9);
        assert_eq!(intel.total_sources, 3);
        assert_eq!(intel.detected_by_count, 2);
        assert!(intel.is_consistent());
    }

    #[tokio::test]
    async fn failed_provider_is_excluded_but_still_counted_in_total() {
        let providers: Vec<Arc<dyn IntelProvider>> = vec![
            Arc::new(FixedProvider { name: "virustotal", weight: 0.4, rate: 1.0 }),
            Arc::new(FailingProvider),
        ];
        let aggregator = IntelAggregator::new(providers, DEFAULT_TIMEOUT);
        let intel = aggregator.aggregate("1.2.3.4", IocType::Ip).await;

        assert_eq!(intel.aggregate_score, 100.0);
        assert_eq!(intel.total_sources, 2);
        assert_eq!(intel.detected_by_count, 1);
    }

    #[tokio::test]
    async fn no_providers_yields_safe_zero_confidence() {
        let aggregator = IntelAggregator::new(Vec::new(), DEFAULT_TIMEOUT);
        let intel = aggregator.aggregate("1.2.3.4", IocType::Ip).await;
        assert_eq!(intel.aggregate_score, 0.0);
        assert_eq!(intel.confidence, 0.0);
        assert_eq!(intel.threat_level, ThreatLevel::Safe);
    }
}
