//! Sink capabilities for decision persistence and telemetry.
//!
//! Implementations own transport, auth, and any retry policy; none of
//! that is visible to the engine's caller. The dispatcher treats every
//! sink as best-effort.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{DecisionRecord, TelemetryEvent};

/// Errors a sink implementation may surface. The dispatcher swallows
/// all of them; they never reach the engine's caller.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink did not answer within its bound.
    #[error("sink timed out: {0}")]
    Timeout(String),

    /// The sink was unreachable or rejected the payload.
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for decision records.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    /// Persists one decision record.
    async fn submit(&self, record: DecisionRecord) -> Result<(), SinkError>;
}

/// Destination for telemetry events.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Emits one telemetry event.
    async fn emit(&self, event: TelemetryEvent) -> Result<(), SinkError>;
}

/// In-memory sink for tests and local development.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<DecisionRecord>>,
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of received decision records.
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records.lock().expect("sink poisoned").clone()
    }

    /// Snapshot of received telemetry events.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().expect("sink poisoned").clone()
    }
}

#[async_trait]
impl DecisionSink for MemorySink {
    async fn submit(&self, record: DecisionRecord) -> Result<(), SinkError> {
        self.records.lock().expect("sink poisoned").push(record);
        Ok(())
    }
}

#[async_trait]
impl TelemetrySink for MemorySink {
    async fn emit(&self, event: TelemetryEvent) -> Result<(), SinkError> {
        self.events.lock().expect("sink poisoned").push(event);
        Ok(())
    }
}
