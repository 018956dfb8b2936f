use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures the core reports to its caller.
///
/// Only malformed input ends up here. Degraded input (missing or extra
/// zones, unmapped classes, zero capacity, unknown road types) has a
/// documented fallback and never produces an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("telemetry payload is empty")]
    EmptyPayload,

    #[error("failed to parse telemetry payload: {0}")]
    Telemetry(#[from] quick_xml::DeError),

    #[error("invalid road segment profile '{segment}': {reason}")]
    InvalidProfile { segment: String, reason: String },

    #[error("no sensor registered for api key '{0}'")]
    UnknownSensor(String),

    #[error("sensor '{sensor}' references unknown road segment '{segment}'")]
    UnknownSegment { sensor: String, segment: String },

    #[error("registry is invalid: {0}")]
    InvalidRegistry(String),

    #[error("frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("wire codec error: {0}")]
    Codec(#[from] bincode::Error),
}
