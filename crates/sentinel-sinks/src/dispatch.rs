//! Fire-and-forget dispatcher for the persistence and telemetry sinks.
//!
//! Submission never blocks, delays, or fails the primary detect/redact/
//! decide call: work is spawned onto the runtime, bounded by a timeout,
//! and failures degrade to a `tracing` warning plus a counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::record::{DecisionRecord, TelemetryEvent};
use crate::sink::{DecisionSink, TelemetrySink};

/// Default bound for one sink operation.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Internal counters surfaced for health checks and tests.
#[derive(Debug, Default)]
pub struct SinkCounters {
    /// Operations handed to a sink.
    pub submitted: AtomicU64,
    /// Operations that timed out.
    pub timed_out: AtomicU64,
    /// Operations the sink rejected.
    pub failed: AtomicU64,
}

/// Dispatches records to the configured sinks, best-effort.
#[derive(Clone)]
pub struct SinkDispatcher {
    decision_sink: Arc<dyn DecisionSink>,
    telemetry_sink: Option<Arc<dyn TelemetrySink>>,
    timeout: Duration,
    counters: Arc<SinkCounters>,
}

impl SinkDispatcher {
    /// Creates a dispatcher with the default 5-second bound.
    pub fn new(decision_sink: Arc<dyn DecisionSink>) -> Self {
        Self {
            decision_sink,
            telemetry_sink: None,
            timeout: DEFAULT_TIMEOUT,
            counters: Arc::new(SinkCounters::default()),
        }
    }

    /// Attaches a telemetry sink.
    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry_sink = Some(sink);
        self
    }

    /// Overrides the per-operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shared counters for observability.
    pub fn counters(&self) -> Arc<SinkCounters> {
        Arc::clone(&self.counters)
    }

    /// Submits a decision record without waiting for the sink.
    /// Must be called from within a tokio runtime.
    pub fn submit_decision(&self, record: DecisionRecord) {
        let sink = Arc::clone(&self.decision_sink);
        let counters = Arc::clone(&self.counters);
        let timeout = self.timeout;
        let execution_id = record.execution_id.clone();

        counters.submitted.fetch_add(1, Ordering::Relaxed);
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, sink.submit(record)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%execution_id, error = %err, "decision sink rejected record");
                }
                Err(_) => {
                    counters.timed_out.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%execution_id, "decision sink timed out");
                }
            }
        });
    }

    /// Emits a telemetry event without waiting for the sink. A missing
    /// telemetry sink is a no-op.
    pub fn emit_telemetry(&self, event: TelemetryEvent) {
        let Some(sink) = self.telemetry_sink.as_ref().map(Arc::clone) else {
            return;
        };
        let counters = Arc::clone(&self.counters);
        let timeout = self.timeout;
        let execution_id = event.execution_id.clone();

        counters.submitted.fetch_add(1, Ordering::Relaxed);
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, sink.emit(event)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%execution_id, error = %err, "telemetry sink rejected event");
                }
                Err(_) => {
                    counters.timed_out.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%execution_id, "telemetry sink timed out");
                }
            }
        });
    }
}
