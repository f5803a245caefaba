//! Sentinel Sinks - Best-effort decision persistence and telemetry.
//!
//! The engine in `sentinel-core` is synchronous and pure; everything that
//! leaves the process afterwards goes through this crate. At most one
//! decision record is emitted per invocation, payloads carry hashes,
//! counts, and timings but never content, and a sink that is slow or
//! down can only cost a warning and a counter — never the primary
//! result.

pub mod dispatch;
pub mod record;
pub mod sink;

pub use dispatch::{SinkCounters, SinkDispatcher};
pub use record::{DecisionRecord, TelemetryEvent};
pub use sink::{DecisionSink, MemorySink, SinkError, TelemetrySink};
