//! abuse.ch adapter (§4.4). No API key required, so this adapter is
//! always enabled and never falls back to a mock result the way the
//! keyed adapters do.

use std::collections::BTreeSet;
use std::time::Duration;

use aegis_common::intel::IocType;
use async_trait::async_trait;
use moka::sync::Cache;
use reqwest::Client;

use crate::error::ProviderError;
use crate::provider::{IntelProvider, ProviderResult};

const SOURCE: &str = "abuse_ch";
const WEIGHT: f64 = 0.3;
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct AbuseChAdapter {
    client: Client,
    cache: Cache<String, ProviderResult>,
}

impl AbuseChAdapter {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            cache: Cache::builder().max_capacity(50_000).time_to_live(DEFAULT_TTL).build(),
        }
    }

    fn parse_response(body: &serde_json::Value) -> Result<ProviderResult, ProviderError> {
        if body.get("query_status").and_then(|v| v.as_str()) == Some("no_results") {
            return Ok(ProviderResult {
                source: SOURCE,
                detection_rate: 0.0,
                tags: BTreeSet::new(),
            });
        }

        let confidence = body
            .pointer("/data/0/confidence_level")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        let tags: BTreeSet<String> = body
            .pointer("/data/0/tags")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|t| t.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        Ok(ProviderResult {
            source: SOURCE,
            detection_rate: (confidence / 100.0).clamp(0.0, 1.0),
            tags,
        })
    }
}

impl Default for AbuseChAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntelProvider for AbuseChAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn weight(&self) -> f64 {
        WEIGHT
    }

    async fn query(&self, ioc: &str, _ioc_type: IocType) -> Result<ProviderResult, ProviderError> {
        if let Some(cached) = self.cache.get(ioc) {
            return Ok(cached);
        }

        let response = self
            .client
            .post("https://mb-api.abuse.ch/api/v1/")
            .form(&[("query", "get_info"), ("hash", ioc)])
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                source: SOURCE,
                reason: e.to_string(),
            })?;

        let body: serde_json::Value = response.json().await.map_err(|e| ProviderError::Parse {
            source: SOURCE,
            reason: e.to_string(),
        })?;

        let result = Self::parse_response(&body)?;
        self.cache.insert(ioc.to_string(), result.clone());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_results_is_clean() {
        let body = json!({"query_status": "no_results"});
        let result = AbuseChAdapter::parse_response(&body).unwrap();
        assert_eq!(result.detection_rate, 0.0);
    }

    #[test]
    fn confidence_level_normalizes_to_fraction() {
        let body = json!({
            "query_status": "ok",
            "data": [{"confidence_level": 80, "tags": ["emotet"]}]
        });
        let result = AbuseChAdapter::parse_response(&body).unwrap();
        assert_eq!(result.detection_rate, 0.8);
        assert!(result.tags.contains("emotet"));
    }
}
