//! Turn tracing for agentrail.
//!
//! Every turn produces one write-once [`TraceRecord`] holding the query,
//! passages, decision, tool results, and per-stage latency. Records go to
//! a [`TraceSink`]: in memory, a JSON-lines file, or nowhere.

pub mod model;
pub mod sink;

pub use model::{StageLatency, TraceRecord};
pub use sink::{JsonlSink, MemorySink, NoopSink, TraceSink};

use agentrail_config::TelemetryConfig;
use std::sync::Arc;
use tracing::info;

/// Errors from the telemetry subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("trace I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("jsonl sink needs telemetry.path")]
    MissingPath,
}

/// Build the sink selected by configuration.
pub fn build_sink(config: &TelemetryConfig) -> Result<Arc<dyn TraceSink>, TelemetryError> {
    match config.sink.as_str() {
        "jsonl" => {
            let path = config.path.as_ref().ok_or(TelemetryError::MissingPath)?;
            info!(path = %path, "Writing turn traces as JSON lines");
            Ok(Arc::new(JsonlSink::open(path)?))
        }
        "none" => Ok(Arc::new(NoopSink)),
        _ => Ok(Arc::new(MemorySink::new())),
    }
}
