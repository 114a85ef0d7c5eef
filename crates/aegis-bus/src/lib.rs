//! Message envelope and topic-router primitives over NATS JetStream
//! (C8). Typed envelope pull-consumers with ack-after-publish
//! ordering — a consumer only acknowledges a delivery once the
//! caller's outbound publish for it has succeeded.

pub mod consumer;
pub mod error;
pub mod publisher;

pub use aegis_common::envelope::{
    DeadLetterPayload, RawAlertPayload, ThreatIntelQueryPayload, TOPIC_ALERT_DEAD_LETTER,
    TOPIC_ALERT_NORMALIZED, TOPIC_ALERT_RAW, TOPIC_THREAT_INTEL_QUERY, TOPIC_TRIAGE_RESULT,
};
pub use consumer::{Consumer, Delivery};
pub use error::BusError;
pub use publisher::Publisher;

use async_nats::jetstream;

/// Connect to the message fabric and hand back both the raw client
/// (for `Publisher`) and a JetStream context (for `Consumer`).
pub async fn connect(url: &str) -> Result<(async_nats::Client, jetstream::Context), BusError> {
    let client = async_nats::connect(url)
        .await
        .map_err(|e| BusError::Connect(e.to_string()))?;
    let jetstream = jetstream::new(client.clone());
    Ok((client, jetstream))
}
