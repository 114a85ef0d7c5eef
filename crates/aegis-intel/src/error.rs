use thiserror::Error;

/// §7 `ProviderError`. A single source's failure never aborts
/// aggregation — `IntelAggregator` downgrades every variant here to
/// "this source did not respond" and carries on with the rest.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{source} request failed: {reason}")]
    Request { source: &'static str, reason: String },

    #[error("{source} returned an unparseable response: {reason}")]
    Parse { source: &'static str, reason: String },

    #[error("{source} query timed out")]
    Timeout { source: &'static str },
}
