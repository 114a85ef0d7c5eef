//! VirusTotal adapter (§4.4). Per-IOC-type query against the public
//! v2 API (`vtapi/v2`), `apikey` passed as a query parameter rather
//! than a header, and a `positives`/`total` response shape reduced to
//! a single detection rate.

use std::collections::BTreeSet;
use std::time::Duration;

use aegis_common::intel::IocType;
use async_trait::async_trait;
use moka::sync::Cache;
use reqwest::Client;

use crate::error::ProviderError;
use crate::provider::{IntelProvider, ProviderResult};

const SOURCE: &str = "virustotal";
const WEIGHT: f64 = 0.4;
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const BASE_URL: &str = "https://www.virustotal.com/vtapi/v2";

pub struct VirusTotalAdapter {
    client: Client,
    api_key: Option<String>,
    cache: Cache<String, ProviderResult>,
}

impl VirusTotalAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            cache: Cache::builder().max_capacity(50_000).time_to_live(DEFAULT_TTL).build(),
        }
    }

    /// (endpoint path, query param name) for the v2 `/report` resource
    /// keyed by IOC type — mirrors `_query_ip`/`_query_hash`/`_query_url`/
    /// `_query_domain`'s per-type params.
    fn endpoint(ioc_type: IocType) -> (&'static str, &'static str) {
        match ioc_type {
            IocType::Ip => ("ip-address/report", "ip"),
            IocType::HashMd5 | IocType::HashSha1 | IocType::HashSha256 => ("file/report", "resource"),
            IocType::Url => ("url/report", "resource"),
            IocType::Domain | IocType::Email => ("domain/report", "domain"),
        }
    }

    fn parse_response(body: &serde_json::Value) -> Result<ProviderResult, ProviderError> {
        let response_code = body.get("response_code").and_then(serde_json::Value::as_i64);
        if response_code == Some(0) {
            // Not found in VT's database, not an error (original's 404 branch).
            return Ok(ProviderResult {
                source: SOURCE,
                detection_rate: 0.0,
                tags: BTreeSet::new(),
            });
        }

        let positives = body.get("positives").and_then(serde_json::Value::as_f64).unwrap_or(0.0);
        let total = body.get("total").and_then(serde_json::Value::as_f64).unwrap_or(0.0);
        let detection_rate = if total > 0.0 { positives / total } else { 0.0 };

        let tags: BTreeSet<String> = body
            .get("scans")
            .and_then(|v| v.as_object())
            .map(|scans| {
                scans
                    .iter()
                    .filter(|(_, v)| v.get("detected").and_then(serde_json::Value::as_bool).unwrap_or(false))
                    .filter_map(|(_, v)| v.get("result").and_then(serde_json::Value::as_str).map(str::to_string))
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
impl IntelProvider for VirusTotalAdapter {
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

        let (path, param) = Self::endpoint(ioc_type);
        let response = self
            .client
            .get(format!("{BASE_URL}/{path}"))
            .query(&[("apikey", api_key.as_str()), (param, ioc)])
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
    fn parses_positives_total_into_detection_rate() {
        let body = json!({
            "response_code": 1,
            "positives": 12,
            "total": 68,
            "scans": {
                "Kaspersky": {"detected": true, "result": "Trojan.Generic"},
                "ESET-NOD32": {"detected": false, "result": null},
            }
        });
        let result = VirusTotalAdapter::parse_response(&body).unwrap();
        assert!((result.detection_rate - (12.0 / 68.0)).abs() < 1e-9);
        assert!(result.tags.contains("Trojan.Generic"));
    }

    #[test]
    fn response_code_zero_is_not_found_not_an_error() {
        let body = json!({"response_code": 0});
        let result = VirusTotalAdapter::parse_response(&body).unwrap();
        assert_eq!(result.detection_rate, 0.0);
        assert!(result.tags.is_empty());
    }

    #[test]
    fn missing_totals_is_zero_detection_rate() {
        let body = json!({"response_code": 1});
        let result = VirusTotalAdapter::parse_response(&body).unwrap();
        assert_eq!(result.detection_rate, 0.0);
    }

    #[tokio::test]
    async fn missing_api_key_returns_mock_result() {
        let adapter = VirusTotalAdapter::new(None);
        let result = adapter.query("45.33.32.156", IocType::Ip).await.unwrap();
        assert_eq!(result.detection_rate, 0.0);
        assert!(result.tags.is_empty());
    }
}
