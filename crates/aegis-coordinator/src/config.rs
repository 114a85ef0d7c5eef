//! Environment-driven configuration (§6.3). Every key is a `clap`
//! field with an `env` source and a process default — there is no
//! file-based config surface, only flags and environment variables.

use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "aegis-coordinator", about = "Security alert triage coordinator")]
pub struct Config {
    /// NATS JetStream connection URL.
    #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    /// §6.3 `DEDUP_CAPACITY`.
    #[arg(long, env = "DEDUP_CAPACITY", default_value_t = 10_000)]
    pub dedup_capacity: u64,

    /// §6.3 `DEDUP_LOOKBACK`, in seconds.
    #[arg(long, env = "DEDUP_LOOKBACK_SECS", default_value_t = 24 * 60 * 60)]
    pub dedup_lookback_secs: u64,

    /// §6.3 `AGGREGATION_WINDOW`, in seconds.
    #[arg(long, env = "AGGREGATION_WINDOW_SECS", default_value_t = 30)]
    pub aggregation_window_secs: u64,

    /// §6.3 `AGGREGATION_MAX_SIZE`.
    #[arg(long, env = "AGGREGATION_MAX_SIZE", default_value_t = 100)]
    pub aggregation_max_size: u32,

    /// §6.3 `INTEL_REQUEST_TIMEOUT`, in seconds.
    #[arg(long, env = "INTEL_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub intel_request_timeout_secs: u64,

    /// §6.3 `TRIAGE_BUDGET`, in seconds.
    #[arg(long, env = "TRIAGE_BUDGET_SECS", default_value_t = 120)]
    pub triage_budget_secs: u64,

    /// §5 graceful-shutdown drain window, in seconds.
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 30)]
    pub shutdown_grace_secs: u64,

    /// §6.3 `MQ_PREFETCH`.
    #[arg(long, env = "MQ_PREFETCH", default_value_t = 50)]
    pub mq_prefetch: usize,

    /// Upper bound on IOCs queried per alert (§4.6 step 2).
    #[arg(long, env = "MAX_IOCS_PER_ALERT", default_value_t = 10)]
    pub max_iocs_per_alert: usize,

    /// §6.3 `PROVIDER_VIRUSTOTAL_API_KEY`.
    #[arg(long, env = "PROVIDER_VIRUSTOTAL_API_KEY")]
    pub virustotal_api_key: Option<String>,

    /// §6.3 `PROVIDER_OTX_API_KEY`.
    #[arg(long, env = "PROVIDER_OTX_API_KEY")]
    pub otx_api_key: Option<String>,

    /// Port the `/health` and `/metrics` axum surface binds to (§6.7).
    #[arg(long, env = "HEALTH_PORT", default_value_t = 8080)]
    pub health_port: u16,
}

impl Config {
    pub fn dedup_lookback(&self) -> Duration {
        Duration::from_secs(self.dedup_lookback_secs)
    }

    pub fn aggregation_window(&self) -> Duration {
        Duration::from_secs(self.aggregation_window_secs)
    }

    pub fn intel_request_timeout(&self) -> Duration {
        Duration::from_secs(self.intel_request_timeout_secs)
    }

    pub fn triage_budget(&self) -> Duration {
        Duration::from_secs(self.triage_budget_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
