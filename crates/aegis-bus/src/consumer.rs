use aegis_common::envelope::Envelope;
use async_nats::jetstream::consumer::{pull::Config as PullConfig, Consumer as JetstreamConsumer};
use async_nats::jetstream::Context as JetstreamContext;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::error::BusError;

/// A received envelope paired with its JetStream message handle, so
/// the caller can ack only after the downstream publish described in
/// §5 ("Publication of `triage.result` happens-before the
/// acknowledgment of the corresponding `alert.normalized` message").
pub struct Delivery<T> {
    pub envelope: Envelope<T>,
    message: async_nats::jetstream::Message,
}

impl<T> Delivery<T> {
    pub async fn ack(self) -> Result<(), BusError> {
        self.message.ack().await.map_err(|e| BusError::Publish {
            topic: "<ack>".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Bounded-prefetch consumer over one durable JetStream pull consumer
/// (§5 "bounded prefetch (default 50 per consumer)").
pub struct Consumer {
    consumer: JetstreamConsumer<PullConfig>,
    prefetch: usize,
}

impl Consumer {
    /// `durable_name` and `filter_subject` select which topic this
    /// consumer drains; `prefetch` mirrors `MQ_PREFETCH` (§6.3).
    pub async fn new(
        jetstream: &JetstreamContext,
        stream_name: &str,
        durable_name: &str,
        filter_subject: &str,
        prefetch: usize,
    ) -> Result<Self, BusError> {
        let stream = jetstream
            .get_or_create_stream(async_nats::jetstream::stream::Config {
                name: stream_name.to_string(),
                subjects: vec![filter_subject.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|e| BusError::Subscribe {
                topic: filter_subject.to_string(),
                reason: e.to_string(),
            })?;

        let consumer = stream
            .get_or_create_consumer(
                durable_name,
                PullConfig {
                    durable_name: Some(durable_name.to_string()),
                    filter_subject: filter_subject.to_string(),
                    max_ack_pending: prefetch as i64,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| BusError::Subscribe {
                topic: filter_subject.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { consumer, prefetch })
    }

    /// Pull up to `prefetch` messages and hand back deserialized
    /// deliveries. Messages whose payload fails to deserialize are
    /// logged and dropped from this batch rather than failing the
    /// whole pull (a malformed envelope on the wire is a bus-level bug,
    /// not a per-alert `NormalizationError`).
    pub async fn pull_batch<T: DeserializeOwned>(&self) -> Result<Vec<Delivery<T>>, BusError> {
        let mut batch = self
            .consumer
            .fetch()
            .max_messages(self.prefetch)
            .messages()
            .await
            .map_err(|e| BusError::Subscribe {
                topic: "<pull>".to_string(),
                reason: e.to_string(),
            })?;

        let mut out = Vec::with_capacity(self.prefetch);
        while let Some(msg) = batch.next().await {
            match msg {
                Ok(message) => match serde_json::from_slice::<Envelope<T>>(&message.payload) {
                    Ok(envelope) => out.push(Delivery { envelope, message }),
                    Err(e) => {
                        error!(error = %e, "dropping envelope with malformed payload");
                    }
                },
                Err(e) => {
                    warn!(error = %e, "message pull error");
                }
            }
        }
        Ok(out)
    }
}
