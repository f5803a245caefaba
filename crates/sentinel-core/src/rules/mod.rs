//! Detection rule corpus: rule types, validators, and the immutable
//! [`RuleProvider`] capability.
//!
//! Rules are declared as [`RuleSpec`] pattern tables (see [`corpus`]) and
//! compiled once at load time. A malformed pattern is a corpus-load error,
//! never a per-call error. After construction the provider is read-only
//! and safe to share across concurrent calls without synchronization.

mod corpus;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::category::{Category, CategoryMetadata};
use crate::error::SentinelError;
use crate::policy::DecisionAction;
use crate::severity::Severity;

/// Checksum or shape check run against the raw matched text.
///
/// A failed check halves the match confidence rather than discarding the
/// match (favor recall, penalize precision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    /// Luhn checksum over the digits (payment cards).
    Luhn,
    /// Digits must not all be identical and must not be a trivial run.
    DigitSanity,
    /// Token must mix letters and digits (API keys, secrets).
    AlnumMix,
}

impl Validator {
    /// Runs the check against the raw matched text.
    pub fn check(&self, matched: &str) -> bool {
        match self {
            Validator::Luhn => luhn_check(matched),
            Validator::DigitSanity => digit_sanity(matched),
            Validator::AlnumMix => {
                matched.chars().any(|c| c.is_ascii_alphabetic())
                    && matched.chars().any(|c| c.is_ascii_digit())
            }
        }
    }
}

fn luhn_check(text: &str) -> bool {
    let digits: Vec<u32> = text.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn digit_sanity(text: &str) -> bool {
    let digits: Vec<u32> = text.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.is_empty() {
        return false;
    }
    let first = digits[0];
    // 000000000 or 111111111 style runs are placeholder values, not data.
    !digits.iter().all(|&d| d == first)
}

/// Declarative form of a detection rule, compiled into a
/// [`DetectionRule`] at corpus load.
#[derive(Debug, Clone)]
pub struct RuleSpec {
    /// Unique rule id.
    pub id: &'static str,
    /// Category this rule detects.
    pub category: Category,
    /// Regex pattern over the raw content.
    pub pattern: &'static str,
    /// Honor letter case while scanning.
    pub case_sensitive: bool,
    /// Confidence before sensitivity adjustment, in `[0, 1]`.
    pub base_confidence: f64,
    /// Severity of a hit from this rule.
    pub severity: Severity,
    /// Action the rule author recommends for a confirmed hit.
    pub recommended_action: DecisionAction,
    /// A hit is kept only if one of these words appears within the
    /// context window around the match. Empty = no context requirement.
    pub context_words: &'static [&'static str],
    /// Optional shape/checksum check on the raw matched text.
    pub validator: Option<Validator>,
}

/// A compiled detection rule.
#[derive(Debug, Clone)]
pub struct DetectionRule {
    /// Unique rule id.
    pub id: &'static str,
    /// Category this rule detects.
    pub category: Category,
    /// Compiled matcher. Each scan uses its own iterator, so no cursor
    /// state is shared across concurrent calls.
    pub matcher: Regex,
    /// Confidence before sensitivity adjustment, in `[0, 1]`.
    pub base_confidence: f64,
    /// Severity of a hit from this rule.
    pub severity: Severity,
    /// Action the rule author recommends for a confirmed hit.
    pub recommended_action: DecisionAction,
    /// Required context words, lowercase. Empty = no requirement.
    pub context_words: &'static [&'static str],
    /// Optional shape/checksum check.
    pub validator: Option<Validator>,
    /// Disabled rules are skipped by [`RuleProvider::rules_for`].
    pub enabled: bool,
}

impl RuleSpec {
    fn compile(&self) -> Result<DetectionRule, SentinelError> {
        let matcher = RegexBuilder::new(self.pattern)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| SentinelError::Corpus {
                rule_id: self.id.to_string(),
                message: e.to_string(),
            })?;

        Ok(DetectionRule {
            id: self.id,
            category: self.category,
            matcher,
            base_confidence: self.base_confidence.clamp(0.0, 1.0),
            severity: self.severity,
            recommended_action: self.recommended_action,
            context_words: self.context_words,
            validator: self.validator,
            enabled: true,
        })
    }
}

/// Immutable rule corpus, constructed once at process start and passed by
/// reference. Version string identifies the corpus snapshot in telemetry.
#[derive(Debug)]
pub struct RuleProvider {
    version: &'static str,
    rules: Vec<DetectionRule>,
}

impl RuleProvider {
    /// Builds the provider from the built-in default corpus.
    pub fn with_default_corpus() -> Result<Self, SentinelError> {
        Self::from_specs(corpus::CORPUS_VERSION, corpus::default_corpus())
    }

    /// Builds a provider from explicit rule specs. Any malformed pattern
    /// fails the whole load.
    pub fn from_specs(
        version: &'static str,
        specs: Vec<RuleSpec>,
    ) -> Result<Self, SentinelError> {
        let rules = specs
            .iter()
            .map(RuleSpec::compile)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(version, rule_count = rules.len(), "rule corpus loaded");
        Ok(Self { version, rules })
    }

    /// Corpus snapshot version.
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// All enabled rules for the requested category subset. An empty
    /// subset selects every known category.
    pub fn rules_for(&self, categories: &[Category]) -> Vec<&DetectionRule> {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .filter(|r| categories.is_empty() || categories.contains(&r.category))
            .collect()
    }

    /// Static policy metadata for a category.
    pub fn metadata(&self, category: Category) -> CategoryMetadata {
        category.metadata()
    }

    /// Total number of rules in the corpus.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the corpus holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
