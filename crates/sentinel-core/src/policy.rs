//! Decision policy engine: a strict, ordered, single-pass evaluator that
//! resolves scored matches into exactly one terminal [`Decision`].
//!
//! ## Evaluation order
//!
//! 1. No matches: allow with full confidence
//! 2. Overall confidence below the configured minimum: allow but flag
//! 3. Critical-category match: block (cannot be overridden by caller policy)
//! 4. Age-restricted match without verified age: age gate
//! 5. Age-restricted-only violations with verified age: warn
//! 6. Caller policy rules, ascending priority, first match wins
//! 7. Configured default action on the highest-severity violation
//!
//! Precedence is load-bearing: step 3 dominates everything, caller policy
//! dominates the generic default.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::matcher::ScoredMatch;
use crate::scoring::RiskAssessment;

/// Terminal action of a decision, and the action vocabulary of rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// Allow the content.
    #[default]
    Allow,
    /// Block the content.
    Block,
    /// Allow, but queue for human review.
    Flag,
    /// Allow with a warning.
    Warn,
    /// Block pending age verification.
    AgeGate,
}

impl DecisionAction {
    /// Returns a human-readable name for this action.
    pub fn name(&self) -> &'static str {
        match self {
            DecisionAction::Allow => "Allow",
            DecisionAction::Block => "Block",
            DecisionAction::Flag => "Flag",
            DecisionAction::Warn => "Warn",
            DecisionAction::AgeGate => "Age Gate",
        }
    }

    /// Whether content resolved with this action passes through.
    pub fn allows(&self) -> bool {
        matches!(
            self,
            DecisionAction::Allow | DecisionAction::Warn | DecisionAction::Flag
        )
    }

    /// Whether this action requires human review.
    pub fn requires_review(&self) -> bool {
        matches!(self, DecisionAction::Flag)
    }
}

/// Caller-supplied policy rule, evaluated at step 6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Category this rule applies to.
    pub category: Category,
    /// Minimum confidence for the rule to trigger.
    pub threshold: f64,
    /// Action taken when the rule triggers.
    pub action: DecisionAction,
    /// Lower value = higher precedence.
    pub priority: u32,
    /// Disabled rules are skipped.
    pub enabled: bool,
}

impl PolicyRule {
    /// Creates an enabled policy rule.
    pub fn new(category: Category, threshold: f64, action: DecisionAction, priority: u32) -> Self {
        Self {
            category,
            threshold: threshold.clamp(0.0, 1.0),
            action,
            priority,
            enabled: true,
        }
    }
}

/// The single terminal outcome of one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Whether the content passes through.
    pub allowed: bool,
    /// The resolved action.
    pub action: DecisionAction,
    /// Why this decision was reached.
    pub reason: String,
    /// Confidence backing the decision.
    pub confidence: f64,
    /// Whether a human should review this outcome.
    pub requires_human_review: bool,
    /// Rule id of the decisive match, when one exists.
    pub triggered_rule_id: Option<String>,
    /// Warning text for warn/age-gate outcomes.
    pub warning: Option<String>,
}

impl Decision {
    fn from_action(action: DecisionAction, reason: String, confidence: f64) -> Self {
        Self {
            allowed: action.allows(),
            action,
            reason,
            confidence,
            requires_human_review: action.requires_review(),
            triggered_rule_id: None,
            warning: None,
        }
    }
}

/// Decision-stage configuration, already validated by the engine facade.
#[derive(Debug, Clone)]
pub struct DecisionConfig {
    /// Matches below this confidence do not count as violations.
    pub min_confidence: f64,
    /// Action applied at step 7 when nothing earlier decided.
    pub default_action: DecisionAction,
    /// Caller has verified the end user's age.
    pub age_verified: bool,
    /// Caller-supplied policy rules for step 6.
    pub policy_rules: Vec<PolicyRule>,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.55,
            default_action: DecisionAction::Warn,
            age_verified: false,
            policy_rules: Vec::new(),
        }
    }
}

/// Runs the ordered policy evaluation.
pub fn decide(
    matches: &[ScoredMatch],
    assessment: &RiskAssessment,
    config: &DecisionConfig,
) -> Decision {
    // Step 1: nothing detected.
    if matches.is_empty() {
        return Decision::from_action(
            DecisionAction::Allow,
            "no policy-relevant content detected".to_string(),
            1.0,
        );
    }

    // Step 2: too uncertain to act; favor recall over false blocking.
    if assessment.confidence < config.min_confidence {
        return Decision::from_action(
            DecisionAction::Flag,
            format!(
                "overall confidence {:.2} below minimum {:.2}",
                assessment.confidence, config.min_confidence
            ),
            assessment.confidence,
        );
    }

    let violations: Vec<&ScoredMatch> = matches
        .iter()
        .filter(|m| m.confidence >= config.min_confidence)
        .collect();

    // Step 3: hard safety. Not overridable by caller policy.
    let critical: Vec<&&ScoredMatch> = violations
        .iter()
        .filter(|m| m.category.metadata().critical)
        .collect();
    if let Some(top) = critical
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    {
        let mut names: Vec<&str> = critical.iter().map(|m| m.category.name()).collect();
        names.dedup();
        let mut decision = Decision::from_action(
            DecisionAction::Block,
            format!("critical category detected: {}", names.join(", ")),
            top.confidence,
        );
        decision.triggered_rule_id = Some(top.rule_id.to_string());
        return decision;
    }

    // Steps 4 and 5: age gating.
    let age_restricted: Vec<&&ScoredMatch> = violations
        .iter()
        .filter(|m| m.category.metadata().age_restricted_allowed)
        .collect();
    if let Some(top) = age_restricted
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    {
        let warning = top.category.metadata().default_warning;
        if !config.age_verified {
            let mut decision = Decision::from_action(
                DecisionAction::AgeGate,
                format!(
                    "{} content requires age verification",
                    top.category.name()
                ),
                top.confidence,
            );
            decision.triggered_rule_id = Some(top.rule_id.to_string());
            decision.warning = warning;
            return decision;
        }
        // The relaxation only applies when every violation is
        // age-gateable; a mixed set falls through to caller policy.
        if age_restricted.len() == violations.len() {
            let mut decision = Decision::from_action(
                DecisionAction::Warn,
                format!("{} content allowed for verified adult", top.category.name()),
                top.confidence,
            );
            decision.triggered_rule_id = Some(top.rule_id.to_string());
            decision.warning = warning;
            return decision;
        }
    }

    // Step 6: caller policy, ascending priority, first hit wins.
    let mut rules: Vec<&PolicyRule> =
        config.policy_rules.iter().filter(|r| r.enabled).collect();
    rules.sort_by_key(|r| r.priority);
    for rule in rules {
        if let Some(hit) = violations
            .iter()
            .find(|m| m.category == rule.category && m.confidence >= rule.threshold)
        {
            let mut decision = Decision::from_action(
                rule.action,
                format!(
                    "caller policy (priority {}) matched {}",
                    rule.priority,
                    rule.category.name()
                ),
                hit.confidence,
            );
            decision.triggered_rule_id = Some(hit.rule_id.to_string());
            return decision;
        }
    }

    // Step 7: configured default on the highest-severity violation.
    // Ties break toward the first-encountered match.
    // `reduce` keeps the earlier element on ties, unlike `max_by`.
    let Some(top) = violations
        .iter()
        .copied()
        .reduce(|best, m| if m.severity > best.severity { m } else { best })
    else {
        // Matches exist but none individually meets the minimum; treat
        // like step 2 and hand off to a human.
        return Decision::from_action(
            DecisionAction::Flag,
            "no individual match met the confidence minimum".to_string(),
            assessment.confidence,
        );
    };
    let mut decision = Decision::from_action(
        config.default_action,
        format!(
            "default action applied to {} content",
            top.category.name()
        ),
        top.confidence,
    );
    decision.triggered_rule_id = Some(top.rule_id.to_string());
    decision.warning = top.category.metadata().default_warning;
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::assess;
    use crate::severity::Severity;

    fn m(category: Category, confidence: f64, severity: Severity, start: usize) -> ScoredMatch {
        ScoredMatch {
            start,
            end: start + 4,
            category,
            rule_id: "test_rule",
            confidence,
            severity,
            recommended_action: DecisionAction::Warn,
            indicator_count: 1,
        }
    }

    fn run(matches: Vec<ScoredMatch>, config: &DecisionConfig) -> Decision {
        let assessment = assess(&matches, 0.5);
        decide(&matches, &assessment, config)
    }

    #[test]
    fn step1_no_matches_allows_with_full_confidence() {
        let d = run(vec![], &DecisionConfig::default());
        assert!(d.allowed);
        assert_eq!(d.action, DecisionAction::Allow);
        assert_eq!(d.confidence, 1.0);
        assert!(!d.requires_human_review);
    }

    #[test]
    fn step2_low_overall_confidence_flags() {
        let matches = vec![m(Category::Email, 0.3, Severity::Medium, 0)];
        let d = run(matches, &DecisionConfig::default());
        assert!(d.allowed);
        assert_eq!(d.action, DecisionAction::Flag);
        assert!(d.requires_human_review);
    }

    #[test]
    fn step3_critical_category_blocks() {
        let matches = vec![m(Category::ChildSafety, 0.95, Severity::Critical, 0)];
        let d = run(matches, &DecisionConfig::default());
        assert!(!d.allowed);
        assert_eq!(d.action, DecisionAction::Block);
        assert!(!d.requires_human_review);
        assert!(d.reason.contains("Child Safety"));
        assert_eq!(d.confidence, 0.95);
    }

    #[test]
    fn step3_cannot_be_overridden_by_caller_policy() {
        let config = DecisionConfig {
            policy_rules: vec![PolicyRule::new(
                Category::ChildSafety,
                0.1,
                DecisionAction::Allow,
                0,
            )],
            ..DecisionConfig::default()
        };
        let matches = vec![m(Category::ChildSafety, 0.95, Severity::Critical, 0)];
        let d = run(matches, &config);
        assert_eq!(d.action, DecisionAction::Block);
        assert!(!d.allowed);
    }

    #[test]
    fn step3_ignores_critical_below_min_confidence_but_step2_already_gated() {
        // A single low-confidence critical match fails the overall
        // confidence gate first.
        let matches = vec![m(Category::ChildSafety, 0.2, Severity::Critical, 0)];
        let d = run(matches, &DecisionConfig::default());
        assert_eq!(d.action, DecisionAction::Flag);
    }

    #[test]
    fn step4_age_restricted_without_verification_gates() {
        let matches = vec![m(Category::AdultContent, 0.85, Severity::Medium, 0)];
        let d = run(matches, &DecisionConfig::default());
        assert!(!d.allowed);
        assert_eq!(d.action, DecisionAction::AgeGate);
        assert!(d.warning.is_some());
    }

    #[test]
    fn step5_age_verified_warns_and_allows() {
        let config = DecisionConfig {
            age_verified: true,
            ..DecisionConfig::default()
        };
        let matches = vec![m(Category::AdultContent, 0.85, Severity::Medium, 0)];
        let d = run(matches, &config);
        assert!(d.allowed);
        assert_eq!(d.action, DecisionAction::Warn);
        assert!(d.warning.is_some());
    }

    #[test]
    fn step5_mixed_violations_do_not_qualify_for_relaxation() {
        let config = DecisionConfig {
            age_verified: true,
            default_action: DecisionAction::Block,
            ..DecisionConfig::default()
        };
        let matches = vec![
            m(Category::AdultContent, 0.85, Severity::Medium, 0),
            m(Category::Violence, 0.9, Severity::High, 10),
        ];
        let d = run(matches, &config);
        // Falls through to the default action, not the warn relaxation.
        assert_eq!(d.action, DecisionAction::Block);
        assert!(!d.allowed);
    }

    #[test]
    fn step6_caller_policy_first_priority_wins() {
        let config = DecisionConfig {
            policy_rules: vec![
                PolicyRule::new(Category::Email, 0.5, DecisionAction::Block, 10),
                PolicyRule::new(Category::Email, 0.5, DecisionAction::Allow, 1),
            ],
            ..DecisionConfig::default()
        };
        let matches = vec![m(Category::Email, 0.9, Severity::Medium, 0)];
        let d = run(matches, &config);
        assert_eq!(d.action, DecisionAction::Allow);
        assert!(d.allowed);
        assert!(d.reason.contains("priority 1"));
    }

    #[test]
    fn step6_disabled_rules_are_skipped() {
        let mut disabled = PolicyRule::new(Category::Email, 0.5, DecisionAction::Block, 0);
        disabled.enabled = false;
        let config = DecisionConfig {
            policy_rules: vec![
                disabled,
                PolicyRule::new(Category::Email, 0.5, DecisionAction::Flag, 5),
            ],
            ..DecisionConfig::default()
        };
        let matches = vec![m(Category::Email, 0.9, Severity::Medium, 0)];
        let d = run(matches, &config);
        assert_eq!(d.action, DecisionAction::Flag);
        assert!(d.requires_human_review);
    }

    #[test]
    fn step6_threshold_below_rule_falls_through() {
        let config = DecisionConfig {
            policy_rules: vec![PolicyRule::new(
                Category::Email,
                0.95,
                DecisionAction::Block,
                0,
            )],
            default_action: DecisionAction::Allow,
            ..DecisionConfig::default()
        };
        let matches = vec![m(Category::Email, 0.9, Severity::Medium, 0)];
        let d = run(matches, &config);
        assert_eq!(d.action, DecisionAction::Allow);
        assert!(d.reason.contains("default action"));
    }

    #[test]
    fn step7_default_targets_highest_severity() {
        let config = DecisionConfig {
            default_action: DecisionAction::Flag,
            ..DecisionConfig::default()
        };
        let matches = vec![
            m(Category::Email, 0.9, Severity::Medium, 0),
            m(Category::Violence, 0.9, Severity::High, 10),
        ];
        let d = run(matches, &config);
        assert_eq!(d.action, DecisionAction::Flag);
        assert!(d.reason.contains("Violence"));
        assert!(d.requires_human_review);
    }

    #[test]
    fn step7_severity_ties_break_to_first_encountered() {
        let matches = vec![
            m(Category::Email, 0.9, Severity::Medium, 0),
            m(Category::Phone, 0.9, Severity::Medium, 10),
        ];
        let d = run(matches, &DecisionConfig::default());
        assert!(d.reason.contains("Email"));
    }

    #[test]
    fn allows_and_review_derive_from_action() {
        assert!(DecisionAction::Allow.allows());
        assert!(DecisionAction::Warn.allows());
        assert!(DecisionAction::Flag.allows());
        assert!(!DecisionAction::Block.allows());
        assert!(!DecisionAction::AgeGate.allows());
        assert!(DecisionAction::Flag.requires_review());
        assert!(!DecisionAction::Block.requires_review());
    }

    #[test]
    fn decision_action_serialization() {
        assert_eq!(
            serde_json::to_string(&DecisionAction::AgeGate).unwrap(),
            "\"age_gate\""
        );
        assert_eq!(
            serde_json::to_string(&DecisionAction::Block).unwrap(),
            "\"block\""
        );
    }
}
