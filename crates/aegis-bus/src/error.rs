use thiserror::Error;

/// §7 `MQTransientError` and connection-level failures of the bus.
/// Underlying `async-nats`/JetStream errors are captured as their
/// `Display` text rather than wrapped by type — the bus crate treats
/// every transport failure as a transient, retriable condition per
/// §7's recovery policy (exponential backoff, eventual dead-letter),
/// so the caller never needs to match on the specific NATS error.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("failed to connect to message fabric: {0}")]
    Connect(String),

    #[error("failed to set up consumer for {topic}: {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("failed to publish to {topic}: {reason}")]
    Publish { topic: String, reason: String },

    #[error("envelope payload is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("broker refused the message (backpressure)")]
    Backpressure,
}
