//! AlienVault OTX adapter (§4.4). Reduces pulse membership — the
//! number of community threat-intel pulses referencing an IOC — to a
//! detection rate, since OTX has no per-engine verdict the way
//! VirusTotal does.

use std::collections::BTreeSet;
use std::time::Duration;

use aegis_common::intel::IocType;
use async_trait::async_trait;
use moka::sync::Cache;
use reqwest::Client;

use crate::error::ProviderError;
use crate::provider::{IntelProvider, ProviderResult};

const SOURCE: &str = "otx";
const WEIGHT: f64 = 0.3;
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Pulse counts above this are treated as maximally confident (rate
/// 1.0) rather than letting one very-referenced IOC dominate the
/// linear scale.
const SATURATION_PULSE_COUNT: f64 = 10.0;

pub struct OtxAdapter {
    client: Client,
    api_key: Option<String>,
    cache: Cache<String, ProviderResult>,
}

impl OtxAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            cache: Cache::builder().max_capacity(50_000).time_to_live(DEFAULT_TTL).build(),
        }
    }

    fn section(ioc_type: IocType) -> &'static str {
        match ioc_type {
            IocType::Ip => "IPv4",
            IocType::Domain => "domain",
            IocType::Url => "url",
            IocType::HashMd5 | IocType::HashSha1 | IocType::HashSha256 => "file",
            IocType::Email => "email",
        }
    }

    fn parse_response(body: &serde_json::Value) -> Result<ProviderResult, ProviderError> {
        let pulse_count = body
            .pointer("/pulse_info/count")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ProviderError::Parse {
                source: SOURCE,
                reason: "missing pulse_info.count".to_string(),
            })?;

        let detection_rate = (pulse_count / SATURATION_PULSE_COUNT).clamp(0.0, 1.0);

        let tags: BTreeSet<String> = body
            .pointer("/pulse_info/pulses")
            .and_then(|v| v.as_array())
            .map(|pulses| {
                pulses
                    .iter()
                    .flat_map(|p| p.get("tags").and_then(|t| t.as_array()).cloned().unwrap_or_default())
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(ProviderResult {
            source: SOURCE,
            detection_rate,
            tags,
        })
    }
}

#[async_trait]
impl IntelProvider for OtxAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn weight(&self) -> f64 {
        WEIGHT
    }

    async fn query(&self, ioc: &str, ioc_type: IocType) -> Result<ProviderResult, ProviderError> {
        if let Some(cached) = self.cache.get(ioc) {
            return Ok(cached);
        }

        let Some(api_key) = &self.api_key else {
            return Ok(ProviderResult::mock(SOURCE));
        };

        let url = format!(
            "https://otx.alienvault.com/api/v1/indicators/{}/{}/general",
            Self::section(ioc_type),
            ioc
        );

        let response = self
            .client
            .get(url)
            .header("X-OTX-API-KEY", api_key)
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
    fn pulse_count_saturates_at_one() {
        let body = json!({"pulse_info": {"count": 25, "pulses": []}});
        let result = OtxAdapter::parse_response(&body).unwrap();
        assert_eq!(result.detection_rate, 1.0);
    }

    #[test]
    fn zero_pulses_is_clean() {
        let body = json!({"pulse_info": {"count": 0, "pulses": []}});
        let result = OtxAdapter::parse_response(&body).unwrap();
        assert_eq!(result.detection_rate, 0.0);
    }

    #[tokio::test]
    async fn missing_api_key_returns_mock_result() {
        let adapter = OtxAdapter::new(None);
        let result = adapter.query("evil.example.com", IocType::Domain).await.unwrap();
        assert_eq!(result.detection_rate, 0.0);
    }
}
