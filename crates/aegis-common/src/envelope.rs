//! Message envelope wire contract (§6.1). Lives in `aegis-common` so
//! every crate that constructs or inspects a payload can do so without
//! depending on the NATS transport in `aegis-bus`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOPIC_ALERT_RAW: &str = "alert.raw";
pub const TOPIC_ALERT_NORMALIZED: &str = "alert.normalized";
pub const TOPIC_ALERT_DEAD_LETTER: &str = "alert.dead_letter";
pub const TOPIC_TRIAGE_RESULT: &str = "triage.result";
pub const TOPIC_THREAT_INTEL_QUERY: &str = "threat_intel.query";

pub const ENVELOPE_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    AlertRaw,
    AlertNormalized,
    AlertDeadLetter,
    TriageResult,
    ThreatIntelQuery,
}

/// Generic envelope wrapping every inter-component message (§6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message_id: Uuid,
    pub message_type: MessageType,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(message_type: MessageType, correlation_id: impl Into<String>, payload: T) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            message_type,
            correlation_id: correlation_id.into(),
            timestamp: Utc::now(),
            version: ENVELOPE_VERSION.to_string(),
            payload,
        }
    }
}

/// Payload for `alert.raw`: a vendor-native blob plus the `source`
/// discriminator used to select a format processor (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAlertPayload {
    pub source: String,
    pub body: serde_json::Value,
}

/// Payload for `alert.dead_letter` (§7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterPayload {
    pub original: serde_json::Value,
    pub error_kind: String,
    pub error_message: String,
}

/// Payload for the optional `threat_intel.query` RPC form (§6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatIntelQueryPayload {
    pub ioc: String,
    pub ioc_type: String,
}
