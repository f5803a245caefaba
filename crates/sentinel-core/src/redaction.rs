//! Position-preserving redaction: replaces matched spans with
//! strategy-selected placeholders.
//!
//! Spans are spliced in descending start order so earlier offsets never
//! need re-indexing mid-pass; an adjustment ledger then maps each span to
//! its offset in the redacted output. The substring at every reported
//! offset equals the reported placeholder.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::category::Category;
use crate::matcher::ScoredMatch;
use crate::severity::Severity;

/// How matched spans are replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionStrategy {
    /// Fixed category label, e.g. `[EMAIL]`.
    #[default]
    Label,
    /// Token derived from a hash of the matched text, e.g. `[a1b2c3d4]`.
    Hash,
    /// Deterministic pseudonym keyed by matched text and category.
    Pseudonym,
    /// Fixed-length mask string.
    Mask,
    /// Remove the span entirely.
    Remove,
}

/// Mask length used by [`RedactionStrategy::Mask`].
const MASK_LEN: usize = 8;

/// One redacted span, reported with offsets into the redacted output.
#[derive(Debug, Clone, Serialize)]
pub struct RedactedSpan {
    /// Byte offset of the placeholder in the redacted content.
    pub start: usize,
    /// Byte offset one past the placeholder end.
    pub end: usize,
    /// Category of the redacted match.
    pub category: Category,
    /// Id of the triggering rule.
    pub rule_id: &'static str,
    /// Confidence of the redacted match.
    pub confidence: f64,
    /// Severity of the redacted match.
    pub severity: Severity,
    /// The placeholder text spliced into the output.
    pub placeholder: String,
}

/// Result of one redaction pass.
#[derive(Debug, Clone, Serialize)]
pub struct RedactionOutcome {
    /// The transformed content.
    pub content: String,
    /// Redacted spans in original left-to-right order.
    pub spans: Vec<RedactedSpan>,
}

/// Replaces every match span in `content` with a placeholder.
///
/// `matches` must be non-overlapping (the match engine's dedup
/// guarantees this) with offsets valid for `content`.
pub fn redact(
    content: &str,
    matches: &[ScoredMatch],
    strategy: RedactionStrategy,
) -> RedactionOutcome {
    let mut ordered: Vec<&ScoredMatch> = matches.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut output = content.to_string();
    // (original start, original length, placeholder length), in
    // descending start order.
    let mut ledger: Vec<(usize, usize, usize)> = Vec::new();
    let mut spans: Vec<RedactedSpan> = Vec::new();

    for m in ordered {
        let placeholder = placeholder_for(strategy, &content[m.start..m.end], m.category);
        output.replace_range(m.start..m.end, &placeholder);
        ledger.push((m.start, m.end - m.start, placeholder.len()));
        spans.push(RedactedSpan {
            start: m.start,
            end: m.start + placeholder.len(),
            category: m.category,
            rule_id: m.rule_id,
            confidence: m.confidence,
            severity: m.severity,
            placeholder,
        });
    }

    // Restore left-to-right order, then shift each span by the net
    // length change of everything spliced before it.
    spans.reverse();
    ledger.reverse();
    let mut delta: isize = 0;
    for (span, (_, original_len, new_len)) in spans.iter_mut().zip(&ledger) {
        span.start = (span.start as isize + delta) as usize;
        span.end = span.start + new_len;
        delta += *new_len as isize - *original_len as isize;
    }

    RedactionOutcome {
        content: output,
        spans,
    }
}

fn placeholder_for(strategy: RedactionStrategy, matched: &str, category: Category) -> String {
    match strategy {
        RedactionStrategy::Label => format!("[{}]", category.label()),
        RedactionStrategy::Hash => format!("[{}]", short_hash(matched.as_bytes(), 8)),
        RedactionStrategy::Pseudonym => {
            let keyed = format!("{}:{}", category.as_str(), matched);
            format!("{}_{}", category.as_str(), short_hash(keyed.as_bytes(), 6))
        }
        RedactionStrategy::Mask => "*".repeat(MASK_LEN),
        RedactionStrategy::Remove => String::new(),
    }
}

fn short_hash(data: &[u8], hex_chars: usize) -> String {
    let digest = Sha256::digest(data);
    let mut hex = String::with_capacity(hex_chars);
    for byte in digest.iter() {
        if hex.len() >= hex_chars {
            break;
        }
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.truncate(hex_chars);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DecisionAction;

    fn m(category: Category, start: usize, end: usize) -> ScoredMatch {
        ScoredMatch {
            start,
            end,
            category,
            rule_id: "test_rule",
            confidence: 0.9,
            severity: Severity::Medium,
            recommended_action: DecisionAction::Warn,
            indicator_count: 1,
        }
    }

    fn assert_spans_consistent(outcome: &RedactionOutcome) {
        for span in &outcome.spans {
            assert_eq!(
                &outcome.content[span.start..span.end],
                span.placeholder,
                "span offsets must index the placeholder"
            );
        }
        for pair in outcome.spans.windows(2) {
            assert!(pair[0].start <= pair[1].start, "spans must be left-to-right");
        }
    }

    #[test]
    fn label_strategy_replaces_span() {
        let content = "Contact me at john@example.com";
        let matches = vec![m(Category::Email, 14, 30)];
        let outcome = redact(content, &matches, RedactionStrategy::Label);
        assert_eq!(outcome.content, "Contact me at [EMAIL]");
        assert_spans_consistent(&outcome);
    }

    #[test]
    fn mask_strategy_uses_fixed_length() {
        let content = "Contact me at john@example.com";
        let matches = vec![m(Category::Email, 14, 30)];
        let outcome = redact(content, &matches, RedactionStrategy::Mask);
        assert_eq!(outcome.content, "Contact me at ********");
        assert_eq!(outcome.spans[0].placeholder.len(), MASK_LEN);
        assert_spans_consistent(&outcome);
    }

    #[test]
    fn remove_strategy_deletes_span() {
        let content = "id 123-45-6789 end";
        let matches = vec![m(Category::Ssn, 3, 14)];
        let outcome = redact(content, &matches, RedactionStrategy::Remove);
        assert_eq!(outcome.content, "id  end");
        assert_eq!(outcome.spans[0].start, outcome.spans[0].end);
        assert_spans_consistent(&outcome);
    }

    #[test]
    fn multiple_spans_report_adjusted_offsets() {
        //            0123456789012345678901234567
        let content = "a@b.io and c@d.io and e@f.io";
        let matches = vec![
            m(Category::Email, 0, 6),
            m(Category::Email, 11, 17),
            m(Category::Email, 22, 28),
        ];
        for strategy in [
            RedactionStrategy::Label,
            RedactionStrategy::Hash,
            RedactionStrategy::Pseudonym,
            RedactionStrategy::Mask,
            RedactionStrategy::Remove,
        ] {
            let outcome = redact(content, &matches, strategy);
            assert_eq!(outcome.spans.len(), 3);
            assert_spans_consistent(&outcome);
        }
    }

    #[test]
    fn hash_and_pseudonym_are_deterministic() {
        let content = "a@b.io and a@b.io";
        let matches = vec![m(Category::Email, 0, 6), m(Category::Email, 11, 17)];

        let hashed = redact(content, &matches, RedactionStrategy::Hash);
        assert_eq!(hashed.spans[0].placeholder, hashed.spans[1].placeholder);

        let named = redact(content, &matches, RedactionStrategy::Pseudonym);
        assert_eq!(named.spans[0].placeholder, named.spans[1].placeholder);
        assert!(named.spans[0].placeholder.starts_with("email_"));

        // Same text, different category: different pseudonym.
        let as_phone = vec![m(Category::Phone, 0, 6)];
        let other = redact(content, &as_phone, RedactionStrategy::Pseudonym);
        assert_ne!(other.spans[0].placeholder, named.spans[0].placeholder);
    }

    #[test]
    fn hash_differs_for_different_text() {
        let content = "a@b.io and c@d.io";
        let matches = vec![m(Category::Email, 0, 6), m(Category::Email, 11, 17)];
        let outcome = redact(content, &matches, RedactionStrategy::Hash);
        assert_ne!(outcome.spans[0].placeholder, outcome.spans[1].placeholder);
    }

    #[test]
    fn placeholder_never_contains_matched_text() {
        let content = "token sk-abcdef1234567890abcdef here";
        let matches = vec![m(Category::ApiKey, 6, 30)];
        for strategy in [
            RedactionStrategy::Label,
            RedactionStrategy::Hash,
            RedactionStrategy::Pseudonym,
            RedactionStrategy::Mask,
            RedactionStrategy::Remove,
        ] {
            let outcome = redact(content, &matches, strategy);
            assert!(!outcome.content.contains("sk-abcdef1234567890abcdef"));
        }
    }

    #[test]
    fn empty_match_list_is_identity() {
        let outcome = redact("nothing here", &[], RedactionStrategy::Label);
        assert_eq!(outcome.content, "nothing here");
        assert!(outcome.spans.is_empty());
    }
}
