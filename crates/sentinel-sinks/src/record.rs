//! Records emitted to the persistence and telemetry sinks.
//!
//! Neither record type can carry raw content or matched text: the
//! decision record stores a one-way content hash, and telemetry carries
//! only categories, counts, ids, and timings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use sentinel_core::{AnalysisReport, DecisionAction, Severity};

/// One persisted decision summary. At most one is emitted per
/// engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Execution reference supplied by the caller.
    pub execution_id: String,
    /// Hex sha256 of the analyzed content. The content itself never
    /// leaves the engine boundary.
    pub content_sha256: String,
    /// Whether anything was detected.
    pub detected: bool,
    /// The resolved action.
    pub action: DecisionAction,
    /// Whether the content passed through.
    pub allowed: bool,
    /// Aggregated risk score.
    pub risk_score: f64,
    /// Overall severity.
    pub severity: Severity,
    /// Overall confidence.
    pub confidence: f64,
    /// Finding counts per detected category.
    pub category_counts: BTreeMap<String, usize>,
    /// Total finding count.
    pub finding_count: usize,
    /// Engine time in microseconds.
    pub duration_us: u64,
    /// When the record was produced.
    pub recorded_at: DateTime<Utc>,
}

impl DecisionRecord {
    /// Builds a record from an analysis report. `content` is hashed
    /// here and discarded.
    pub fn from_report(
        execution_id: impl Into<String>,
        content: &str,
        report: &AnalysisReport,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            content_sha256: hex_sha256(content.as_bytes()),
            detected: report.detected,
            action: report.decision.action,
            allowed: report.decision.allowed,
            risk_score: report.risk_score,
            severity: report.severity,
            confidence: report.confidence,
            category_counts: report.category_counts.clone(),
            finding_count: report.findings.len(),
            duration_us: report.duration_us,
            recorded_at: Utc::now(),
        }
    }
}

/// One structured telemetry event keyed by an execution reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Execution reference supplied by the caller.
    pub execution_id: String,
    /// Event name, e.g. `analysis_complete`.
    pub name: String,
    /// Detected categories (names only).
    pub categories: Vec<String>,
    /// Finding counts per category.
    pub counts: BTreeMap<String, usize>,
    /// Engine time in microseconds.
    pub duration_us: u64,
    /// When the event was produced.
    pub emitted_at: DateTime<Utc>,
}

impl TelemetryEvent {
    /// Builds an event from an analysis report.
    pub fn from_report(execution_id: impl Into<String>, report: &AnalysisReport) -> Self {
        Self {
            execution_id: execution_id.into(),
            name: "analysis_complete".to_string(),
            categories: report.category_counts.keys().cloned().collect(),
            counts: report.category_counts.clone(),
            duration_us: report.duration_us,
            emitted_at: Utc::now(),
        }
    }
}

fn hex_sha256(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut hex = String::with_capacity(64);
    for byte in digest.iter() {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
