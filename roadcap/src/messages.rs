use crate::pipeline::PipelineOutput;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    Hello { client: String },
    Telemetry(TelemetryMessage),
    Analysis(AnalysisMessage),
    Rejected { sequence_id: u64, reason: String },
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryMessage {
    pub sequence_id: u64,
    /// Telemetry document exactly as the sensor produced it.
    pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMessage {
    pub sequence_id: u64,
    pub output: Box<PipelineOutput>,
}
