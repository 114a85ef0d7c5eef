use aegis_common::envelope::{Envelope, MessageType};
use async_nats::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::BusError;

/// Typed publisher over an `async_nats::Client`. Publication of
/// `triage.result` happens-before the ack of the source
/// `alert.normalized` message (§5 ordering guarantee) — callers are
/// responsible for sequencing the ack after `publish` returns `Ok`.
#[derive(Clone)]
pub struct Publisher {
    client: Client,
}

impl Publisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn publish<T: Serialize>(
        &self,
        topic: &str,
        message_type: MessageType,
        correlation_id: impl Into<String>,
        payload: T,
    ) -> Result<(), BusError> {
        let envelope = Envelope::new(message_type, correlation_id, payload);
        let bytes = serde_json::to_vec(&envelope)?;

        debug!(topic, message_id = %envelope.message_id, "publishing envelope");

        self.client
            .publish(topic.to_string(), bytes.into())
            .await
            .map_err(|e| BusError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }
}
