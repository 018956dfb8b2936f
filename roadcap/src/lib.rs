pub mod aggregate;
pub mod capacity;
pub mod classification;
pub mod config;
pub mod constants;
pub mod equivalency;
pub mod error;
pub mod los;
pub mod messages;
pub mod method;
pub mod mkji;
pub mod network;
pub mod normalize;
pub mod pipeline;
pub mod pkji;
pub mod reconcile;
pub mod telemetry;
pub mod types;

pub use error::{Error, Result};
pub use messages::*;
pub use method::{Method, Methodology};
pub use network::*;
pub use pipeline::{analyze_reading, process_payload, AnalysisResult, PipelineOutput};
pub use types::*;
