//! The `Sentinel` facade: request validation and orchestration of the
//! match, scoring, decision, and redaction stages.
//!
//! The engine is synchronous and stateless across calls. All per-call
//! data lives on the stack; the rule corpus is read-only after load, so
//! one `Sentinel` can serve any number of concurrent callers.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use crate::category::Category;
use crate::error::SentinelError;
use crate::matcher::{self, ScoredMatch};
use crate::policy::{self, Decision, DecisionAction, DecisionConfig, PolicyRule};
use crate::redaction::{self, RedactedSpan, RedactionStrategy};
use crate::rules::RuleProvider;
use crate::scoring::{self, RiskFactor};
use crate::severity::Severity;

/// Analysis request. Content is assumed schema-valid at the transport
/// layer; range and category validation still happens here.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Text to analyze.
    pub content: String,
    /// Caller-tunable knob shifting all confidences, in `[0, 1]`.
    /// 0.5 is the neutral point.
    pub sensitivity: f64,
    /// Minimum confidence for a match to count as a violation.
    pub min_confidence: f64,
    /// Category subset to scan. Empty = all known categories.
    pub categories: Vec<Category>,
    /// Caller has verified the end user's age.
    pub age_verified: bool,
    /// Action applied when no earlier policy step decides.
    pub default_action: DecisionAction,
    /// Caller-supplied policy rules.
    pub policy_rules: Vec<PolicyRule>,
}

impl AnalysisRequest {
    /// Creates a request with deployment defaults.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sensitivity: 0.5,
            min_confidence: 0.55,
            categories: Vec::new(),
            age_verified: false,
            default_action: DecisionAction::Warn,
            policy_rules: Vec::new(),
        }
    }

    /// Sets the sensitivity.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Sets the minimum confidence.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Restricts scanning to the given categories.
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Marks the end user's age as verified.
    pub fn with_age_verified(mut self, verified: bool) -> Self {
        self.age_verified = verified;
        self
    }

    /// Sets the default action.
    pub fn with_default_action(mut self, action: DecisionAction) -> Self {
        self.default_action = action;
        self
    }

    /// Adds caller policy rules.
    pub fn with_policy_rules(mut self, rules: Vec<PolicyRule>) -> Self {
        self.policy_rules = rules;
        self
    }
}

/// Redaction request.
#[derive(Debug, Clone)]
pub struct RedactionRequest {
    /// Text to redact.
    pub content: String,
    /// Caller-tunable sensitivity, in `[0, 1]`.
    pub sensitivity: f64,
    /// Matches below this confidence are left untouched.
    pub min_confidence: f64,
    /// Category subset to scan. Empty = all known categories.
    pub categories: Vec<Category>,
    /// Placeholder strategy.
    pub strategy: RedactionStrategy,
}

impl RedactionRequest {
    /// Creates a request with deployment defaults.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sensitivity: 0.5,
            min_confidence: 0.55,
            categories: Vec::new(),
            strategy: RedactionStrategy::default(),
        }
    }

    /// Sets the placeholder strategy.
    pub fn with_strategy(mut self, strategy: RedactionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the sensitivity.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Sets the minimum confidence.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Restricts scanning to the given categories.
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }
}

/// One reported detection. Carries offsets and metadata only — never the
/// matched substring.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// Detected category.
    pub category: Category,
    /// Byte offset of the match start.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
    /// Adjusted confidence.
    pub confidence: f64,
    /// Severity of the match.
    pub severity: Severity,
    /// Id of the triggering rule.
    pub rule_id: String,
    /// Action the rule author recommends.
    pub recommended_action: DecisionAction,
    /// Evidence strength from absorbed overlaps.
    pub indicator_count: u32,
}

impl Finding {
    fn from_match(m: &ScoredMatch) -> Self {
        Self {
            category: m.category,
            start: m.start,
            end: m.end,
            confidence: m.confidence,
            severity: m.severity,
            rule_id: m.rule_id.to_string(),
            recommended_action: m.recommended_action,
            indicator_count: m.indicator_count,
        }
    }
}

/// Result of one analysis invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Whether anything was detected.
    pub detected: bool,
    /// Aggregated risk score in `[0, 1]`.
    pub risk_score: f64,
    /// Overall severity.
    pub severity: Severity,
    /// Overall confidence.
    pub confidence: f64,
    /// All retained findings, by start offset.
    pub findings: Vec<Finding>,
    /// Per-category risk factors.
    pub risk_factors: Vec<RiskFactor>,
    /// Finding counts per detected category.
    pub category_counts: BTreeMap<String, usize>,
    /// The single terminal decision.
    pub decision: Decision,
    /// Wall time spent in the engine, microseconds. Informational only;
    /// no scoring or decision path depends on it.
    pub duration_us: u64,
}

/// Result of one redaction invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RedactionReport {
    /// Whether anything was redacted.
    pub redacted: bool,
    /// The transformed content.
    pub content: String,
    /// Redacted spans with offsets into the transformed content.
    pub findings: Vec<RedactedSpan>,
    /// Redaction counts per detected category.
    pub category_counts: BTreeMap<String, usize>,
    /// Wall time spent in the engine, microseconds.
    pub duration_us: u64,
}

/// The detection and decision engine.
pub struct Sentinel {
    provider: RuleProvider,
}

impl Sentinel {
    /// Creates an engine around an already-loaded rule corpus.
    pub fn new(provider: RuleProvider) -> Self {
        Self { provider }
    }

    /// Creates an engine with the built-in default corpus.
    pub fn with_default_corpus() -> Result<Self, SentinelError> {
        Ok(Self::new(RuleProvider::with_default_corpus()?))
    }

    /// The engine's rule corpus.
    pub fn provider(&self) -> &RuleProvider {
        &self.provider
    }

    /// Parses category names at the validation boundary. Unknown names
    /// are a [`SentinelError::Validation`], never an engine-internal
    /// fault.
    pub fn parse_categories<S: AsRef<str>>(names: &[S]) -> Result<Vec<Category>, SentinelError> {
        names
            .iter()
            .map(|n| {
                Category::parse(n.as_ref()).ok_or_else(|| {
                    SentinelError::validation(format!("unknown category '{}'", n.as_ref()))
                })
            })
            .collect()
    }

    /// Analyzes content and resolves a single decision.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport, SentinelError> {
        let started = Instant::now();
        validate_common(&request.content, request.sensitivity, request.min_confidence)?;

        let rules = self.provider.rules_for(&request.categories);
        let matches = matcher::scan(&request.content, &rules, request.sensitivity);
        let assessment = scoring::assess(&matches, request.sensitivity);

        let config = DecisionConfig {
            min_confidence: request.min_confidence,
            default_action: request.default_action,
            age_verified: request.age_verified,
            policy_rules: request.policy_rules.clone(),
        };
        let decision = policy::decide(&matches, &assessment, &config);

        let category_counts = count_by_category(matches.iter().map(|m| m.category));
        let findings: Vec<Finding> = matches.iter().map(Finding::from_match).collect();

        tracing::debug!(
            findings = findings.len(),
            risk_score = assessment.risk_score,
            action = decision.action.name(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            detected: !findings.is_empty(),
            risk_score: assessment.risk_score,
            severity: assessment.severity,
            confidence: assessment.confidence,
            findings,
            risk_factors: assessment.factors,
            category_counts,
            decision,
            duration_us: started.elapsed().as_micros() as u64,
        })
    }

    /// Redacts matched spans from content.
    pub fn redact(&self, request: &RedactionRequest) -> Result<RedactionReport, SentinelError> {
        let started = Instant::now();
        validate_common(&request.content, request.sensitivity, request.min_confidence)?;

        let rules = self.provider.rules_for(&request.categories);
        let matches = matcher::scan(&request.content, &rules, request.sensitivity);
        let surviving: Vec<ScoredMatch> = matches
            .into_iter()
            .filter(|m| m.confidence >= request.min_confidence)
            .collect();

        let outcome = redaction::redact(&request.content, &surviving, request.strategy);
        let category_counts = count_by_category(outcome.spans.iter().map(|s| s.category));

        tracing::debug!(
            spans = outcome.spans.len(),
            strategy = ?request.strategy,
            "redaction complete"
        );

        Ok(RedactionReport {
            redacted: !outcome.spans.is_empty(),
            content: outcome.content,
            findings: outcome.spans,
            category_counts,
            duration_us: started.elapsed().as_micros() as u64,
        })
    }
}

fn validate_common(
    content: &str,
    sensitivity: f64,
    min_confidence: f64,
) -> Result<(), SentinelError> {
    if content.is_empty() {
        return Err(SentinelError::validation("content must not be empty"));
    }
    if !(0.0..=1.0).contains(&sensitivity) {
        return Err(SentinelError::validation(format!(
            "sensitivity {sensitivity} outside [0, 1]"
        )));
    }
    if !(0.0..=1.0).contains(&min_confidence) {
        return Err(SentinelError::validation(format!(
            "min_confidence {min_confidence} outside [0, 1]"
        )));
    }
    Ok(())
}

fn count_by_category<I: Iterator<Item = Category>>(categories: I) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for category in categories {
        *counts.entry(category.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}
