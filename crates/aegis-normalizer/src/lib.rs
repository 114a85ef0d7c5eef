//! Multi-format alert normalizer (C1) and IOC extractor (C2). Each
//! vendor format gets one [`FormatProcessor`] implementation; `dispatch`
//! picks the processor by the envelope's declared source format.

pub mod cef;
pub mod error;
pub mod fields;
pub mod ioc;
pub mod qradar;
pub mod splunk;
pub mod timestamp;

pub use cef::CefProcessor;
pub use error::NormalizationError;
pub use qradar::QRadarProcessor;
pub use splunk::SplunkProcessor;

use aegis_common::CanonicalAlert;
use serde_json::Value;

/// One operation per format: `process(raw) -> CanonicalAlert | error`
/// (§4.1). Implementations never panic on malformed input — they
/// reject via [`NormalizationError`] instead.
pub trait FormatProcessor: Send + Sync {
    fn source_name(&self) -> &'static str;
    fn process(&self, raw: &Value) -> Result<CanonicalAlert, NormalizationError>;
}

/// Select and run the processor named by `source_format`. `raw` is
/// the deserialized `alert.raw` payload body; for `cef` it is expected
/// to be a JSON string carrying the raw CEF line (or an object with a
/// `raw` string field), for the others a JSON object of vendor fields.
pub fn dispatch(source_format: &str, raw: &Value) -> Result<CanonicalAlert, NormalizationError> {
    match source_format.to_lowercase().as_str() {
        "splunk" => SplunkProcessor.process(raw),
        "qradar" => QRadarProcessor.process(raw),
        "cef" => CefProcessor.process(raw),
        other => Err(NormalizationError::UnknownFormat(other.to_string())),
    }
}
