//! Sentinel Core - Pattern-based content detection and decision engine.
//!
//! Scans text against a static rule corpus, aggregates matches into a
//! risk assessment, resolves a single decision through an ordered policy
//! evaluator, and optionally redacts matched spans in place.
//!
//! The engine is a pure function of content + configuration + corpus:
//! synchronous, stateless across calls, and safe to share between
//! threads. Persistence and telemetry side channels live in the
//! `sentinel-sinks` crate.

pub mod category;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod policy;
pub mod redaction;
pub mod rules;
pub mod scoring;
pub mod severity;

pub use category::{Category, CategoryMetadata};
pub use engine::{
    AnalysisReport, AnalysisRequest, Finding, RedactionReport, RedactionRequest, Sentinel,
};
pub use error::SentinelError;
pub use matcher::ScoredMatch;
pub use policy::{Decision, DecisionAction, DecisionConfig, PolicyRule};
pub use redaction::{RedactedSpan, RedactionOutcome, RedactionStrategy};
pub use rules::{DetectionRule, RuleProvider, RuleSpec, Validator};
pub use scoring::{RiskAssessment, RiskFactor};
pub use severity::Severity;
