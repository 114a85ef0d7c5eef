//! Threat-intelligence source adapters (C4) and weighted aggregation
//! (C5).

pub mod abuse_ch;
pub mod aggregator;
pub mod error;
pub mod otx;
pub mod provider;
pub mod virustotal;

pub use abuse_ch::AbuseChAdapter;
pub use aggregator::IntelAggregator;
pub use error::ProviderError;
pub use otx::OtxAdapter;
pub use provider::{IntelProvider, ProviderResult};
pub use virustotal::VirusTotalAdapter;

use std::sync::Arc;

/// Build the default provider set from environment-supplied API keys
/// (§6.3 `VIRUSTOTAL_API_KEY` / `OTX_API_KEY`). abuse.ch needs no key
/// and is always included.
pub fn default_providers(virustotal_key: Option<String>, otx_key: Option<String>) -> Vec<Arc<dyn IntelProvider>> {
    vec![
        Arc::new(VirusTotalAdapter::new(virustotal_key)),
        Arc::new(OtxAdapter::new(otx_key)),
        Arc::new(AbuseChAdapter::new()),
    ]
}
