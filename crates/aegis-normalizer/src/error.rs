use thiserror::Error;

/// §7 `NormalizationError` — the only error a format processor can
/// return. A processor never partially normalizes; it either produces
/// a complete `CanonicalAlert` or rejects the raw payload outright.
#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("raw alert payload is not a JSON object")]
    NotAnObject,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("malformed CEF header: {0}")]
    MalformedCef(String),

    #[error("unrecognized source format: {0}")]
    UnknownFormat(String),
}
