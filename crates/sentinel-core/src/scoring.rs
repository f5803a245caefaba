//! Aggregation and scoring: turns scored matches into per-category risk
//! factors and a single risk score, severity, and confidence.
//!
//! One strategy per deployment: the factor-mean risk variant with the
//! `none 0 / low .25 / medium .5 / high .75 / critical 1.0` weight scale.

use serde::Serialize;

use crate::category::Category;
use crate::matcher::ScoredMatch;
use crate::severity::{clamp01, Severity};

/// Per-factor ceiling on score contribution, so one category cannot
/// saturate the total on its own.
const CONTRIBUTION_CAP: f64 = 0.35;

/// Maximum "more evidence" bonus added to the overall confidence.
const EVIDENCE_BONUS_CAP: f64 = 0.2;

/// Bonus per additional match beyond the first.
const EVIDENCE_BONUS_STEP: f64 = 0.05;

/// Aggregated risk for one detected category.
#[derive(Debug, Clone, Serialize)]
pub struct RiskFactor {
    /// The detected category.
    pub category: Category,
    /// Human-readable description of the factor.
    pub description: String,
    /// Highest severity among the category's matches.
    pub severity: Severity,
    /// Capped contribution to the overall risk score.
    pub score_contribution: f64,
    /// Mean confidence of the category's matches.
    pub confidence: f64,
    /// Number of matches folded into this factor.
    pub match_count: usize,
}

/// Overall assessment produced from the scored matches of one call.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    /// Aggregated risk score in `[0, 1]`.
    pub risk_score: f64,
    /// Maximum severity across factors; forced to `Critical` when any
    /// detected category is flagged critical in metadata.
    pub severity: Severity,
    /// Overall confidence in the assessment. 1.0 when nothing matched
    /// (full confidence in "safe").
    pub confidence: f64,
    /// One factor per detected category, in first-encountered order.
    pub factors: Vec<RiskFactor>,
}

impl RiskAssessment {
    /// The assessment of content with no matches.
    pub fn safe() -> Self {
        Self {
            risk_score: 0.0,
            severity: Severity::None,
            confidence: 1.0,
            factors: Vec::new(),
        }
    }
}

/// Aggregates scored matches into a risk assessment.
pub fn assess(matches: &[ScoredMatch], sensitivity: f64) -> RiskAssessment {
    if matches.is_empty() {
        return RiskAssessment::safe();
    }

    let factors = build_factors(matches, sensitivity);

    let factor_mean = factors
        .iter()
        .map(|f| f.score_contribution * f.confidence)
        .sum::<f64>()
        / factors.len() as f64;
    let risk_score = (factor_mean * (0.5 + 0.5 * sensitivity)).min(1.0);

    let mean_confidence =
        matches.iter().map(|m| m.confidence).sum::<f64>() / matches.len() as f64;
    let evidence_bonus =
        (EVIDENCE_BONUS_STEP * (matches.len() as f64 - 1.0)).min(EVIDENCE_BONUS_CAP);
    let confidence = clamp01(mean_confidence + evidence_bonus);

    let mut severity = factors
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(Severity::None);
    if factors.iter().any(|f| f.category.metadata().critical) {
        severity = Severity::Critical;
    }

    RiskAssessment {
        risk_score,
        severity,
        confidence,
        factors,
    }
}

/// Groups matches by category, preserving first-encountered order so tie
/// breaking downstream is deterministic.
fn build_factors(matches: &[ScoredMatch], _sensitivity: f64) -> Vec<RiskFactor> {
    let mut order: Vec<Category> = Vec::new();
    for m in matches {
        if !order.contains(&m.category) {
            order.push(m.category);
        }
    }

    order
        .into_iter()
        .map(|category| {
            let group: Vec<&ScoredMatch> =
                matches.iter().filter(|m| m.category == category).collect();
            let severity = group
                .iter()
                .map(|m| m.severity)
                .max()
                .unwrap_or(Severity::None);
            // Match confidences are already sensitivity-adjusted by the
            // match engine.
            let confidence =
                group.iter().map(|m| m.confidence).sum::<f64>() / group.len() as f64;
            let score_contribution = (severity.weight() * confidence).min(CONTRIBUTION_CAP);

            RiskFactor {
                category,
                description: format!("{} content detected", category.name()),
                severity,
                score_contribution,
                confidence,
                match_count: group.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DecisionAction;

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

    #[test]
    fn no_matches_is_fully_confident_safe() {
        let a = assess(&[], 0.5);
        assert_eq!(a.risk_score, 0.0);
        assert_eq!(a.severity, Severity::None);
        assert_eq!(a.confidence, 1.0);
        assert!(a.factors.is_empty());
    }

    #[test]
    fn one_factor_per_category() {
        let matches = vec![
            m(Category::Email, 0.9, Severity::Medium, 0),
            m(Category::Email, 0.8, Severity::Medium, 10),
            m(Category::Violence, 0.9, Severity::High, 20),
        ];
        let a = assess(&matches, 0.5);
        assert_eq!(a.factors.len(), 2);
        assert_eq!(a.factors[0].category, Category::Email);
        assert_eq!(a.factors[0].match_count, 2);
        assert!((a.factors[0].confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn factor_severity_is_group_max() {
        let matches = vec![
            m(Category::Violence, 0.9, Severity::Medium, 0),
            m(Category::Violence, 0.5, Severity::High, 10),
        ];
        let a = assess(&matches, 0.5);
        assert_eq!(a.factors[0].severity, Severity::High);
    }

    #[test]
    fn contribution_is_capped() {
        let matches = vec![m(Category::Violence, 1.0, Severity::Critical, 0)];
        let a = assess(&matches, 0.5);
        assert!((a.factors[0].score_contribution - CONTRIBUTION_CAP).abs() < 1e-9);
    }

    #[test]
    fn risk_score_stays_in_unit_interval() {
        let matches: Vec<ScoredMatch> = (0..20)
            .map(|i| m(Category::Violence, 1.0, Severity::Critical, i * 10))
            .collect();
        let a = assess(&matches, 1.0);
        assert!((0.0..=1.0).contains(&a.risk_score));
        assert!((0.0..=1.0).contains(&a.confidence));
    }

    #[test]
    fn risk_is_monotone_in_sensitivity() {
        let matches = vec![
            m(Category::Email, 0.7, Severity::Medium, 0),
            m(Category::Violence, 0.8, Severity::High, 10),
        ];
        let mut prev = -1.0;
        for s in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let a = assess(&matches, s);
            assert!(a.risk_score >= prev);
            prev = a.risk_score;
        }
    }

    #[test]
    fn evidence_bonus_is_capped() {
        let matches: Vec<ScoredMatch> = (0..10)
            .map(|i| m(Category::Email, 0.6, Severity::Medium, i * 10))
            .collect();
        let a = assess(&matches, 0.5);
        // mean 0.6 + capped bonus 0.2
        assert!((a.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn critical_category_forces_critical_severity() {
        // Low-confidence child-safety match still yields critical severity.
        let matches = vec![m(Category::ChildSafety, 0.3, Severity::Medium, 0)];
        let a = assess(&matches, 0.5);
        assert_eq!(a.severity, Severity::Critical);
    }

    #[test]
    fn severity_is_max_across_factors() {
        let matches = vec![
            m(Category::Email, 0.9, Severity::Medium, 0),
            m(Category::Violence, 0.9, Severity::High, 10),
        ];
        let a = assess(&matches, 0.5);
        assert_eq!(a.severity, Severity::High);
    }

    #[test]
    fn factors_preserve_first_encounter_order() {
        let matches = vec![
            m(Category::Violence, 0.9, Severity::High, 0),
            m(Category::Email, 0.9, Severity::Medium, 10),
            m(Category::Violence, 0.8, Severity::High, 20),
        ];
        let a = assess(&matches, 0.5);
        assert_eq!(a.factors[0].category, Category::Violence);
        assert_eq!(a.factors[1].category, Category::Email);
    }
}
