//! Match engine: scans content against applicable rules, applies context
//! and validator checks, adjusts confidence by sensitivity, and
//! deduplicates overlapping spans.
//!
//! Raw matched text never leaves this module; only offset-and-metadata
//! [`ScoredMatch`]es cross the boundary.

use serde::Serialize;

use crate::category::Category;
use crate::policy::DecisionAction;
use crate::rules::DetectionRule;
use crate::severity::{clamp01, Severity};

/// Sensitivity gain applied to every rule family:
/// `adjusted = clamp01(base + (sensitivity - 0.5) * GAIN)`.
pub(crate) const SENSITIVITY_GAIN: f64 = 0.2;

/// Bytes of surrounding content inspected for required context words.
const CONTEXT_WINDOW: usize = 50;

/// Confidence bonus per absorbed overlapping same-category match.
const OVERLAP_BONUS: f64 = 0.05;

/// A located rule occurrence. Carries offsets and metadata only — never
/// the matched substring.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMatch {
    /// Byte offset of the match start in the original content.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
    /// Category of the triggering rule.
    pub category: Category,
    /// Id of the triggering rule.
    pub rule_id: &'static str,
    /// Final adjusted confidence in `[0, 1]`.
    pub confidence: f64,
    /// Severity of the triggering rule.
    pub severity: Severity,
    /// Action recommended by the rule author.
    pub recommended_action: DecisionAction,
    /// Evidence strength: 1 plus the number of absorbed overlapping
    /// same-category matches.
    pub indicator_count: u32,
}

/// An ephemeral hit before deduplication. Private to this module so the
/// raw text cannot propagate.
struct RawMatch {
    start: usize,
    end: usize,
    category: Category,
    rule_id: &'static str,
    confidence: f64,
    severity: Severity,
    recommended_action: DecisionAction,
}

/// Scans `content` against `rules` and returns deduplicated, scored
/// matches sorted by start offset.
pub fn scan(content: &str, rules: &[&DetectionRule], sensitivity: f64) -> Vec<ScoredMatch> {
    let mut raw = Vec::new();

    for rule in rules {
        for m in rule.matcher.find_iter(content) {
            if !context_satisfied(content, m.start(), m.end(), rule.context_words) {
                continue;
            }

            let mut confidence =
                clamp01(rule.base_confidence + (sensitivity - 0.5) * SENSITIVITY_GAIN);

            // A failed validator halves confidence instead of discarding
            // the hit: favor recall, penalize precision.
            if let Some(validator) = rule.validator {
                if !validator.check(m.as_str()) {
                    confidence /= 2.0;
                }
            }

            raw.push(RawMatch {
                start: m.start(),
                end: m.end(),
                category: rule.category,
                rule_id: rule.id,
                confidence,
                severity: rule.severity,
                recommended_action: rule.recommended_action,
            });
        }
    }

    deduplicate(raw)
}

/// Sweep dedup: sort by start ascending (ties: confidence descending),
/// keep the first match whose start is at or past the previous kept end.
/// Overlapping same-category matches are absorbed as corroborating
/// evidence rather than dropped.
fn deduplicate(mut raw: Vec<RawMatch>) -> Vec<ScoredMatch> {
    raw.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });

    let mut kept: Vec<ScoredMatch> = Vec::new();
    for m in raw {
        match kept.last_mut() {
            Some(prev) if m.start < prev.end => {
                if m.category == prev.category {
                    prev.indicator_count += 1;
                    prev.confidence = clamp01(prev.confidence + OVERLAP_BONUS);
                    tracing::debug!(
                        rule_id = m.rule_id,
                        absorbed_into = prev.rule_id,
                        "absorbed overlapping match"
                    );
                }
            }
            _ => kept.push(ScoredMatch {
                start: m.start,
                end: m.end,
                category: m.category,
                rule_id: m.rule_id,
                confidence: m.confidence,
                severity: m.severity,
                recommended_action: m.recommended_action,
                indicator_count: 1,
            }),
        }
    }
    kept
}

/// True when the rule has no context requirement, or at least one
/// required word appears (case-insensitively) within the window around
/// the match.
fn context_satisfied(content: &str, start: usize, end: usize, words: &[&str]) -> bool {
    if words.is_empty() {
        return true;
    }

    let lo = floor_char_boundary(content, start.saturating_sub(CONTEXT_WINDOW));
    let hi = ceil_char_boundary(content, (end + CONTEXT_WINDOW).min(content.len()));
    let window = content[lo..hi].to_lowercase();

    words.iter().any(|w| window.contains(w))
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
