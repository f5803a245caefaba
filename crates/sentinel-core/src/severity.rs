//! Ordered severity levels for detections and decisions.

use serde::{Deserialize, Serialize};

/// Qualitative impact level of a detection.
///
/// The derived `Ord` follows declaration order, so
/// `None < Low < Medium < High < Critical` holds by construction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// No detected impact.
    #[default]
    None,
    /// Minor policy relevance.
    Low,
    /// Moderate policy relevance.
    Medium,
    /// Serious policy relevance.
    High,
    /// Maximum impact; forces blocking regardless of caller policy.
    Critical,
}

impl Severity {
    /// Returns all severity levels in ascending order.
    pub fn all() -> &'static [Severity] {
        &[
            Severity::None,
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ]
    }

    /// Returns a human-readable name for this severity.
    pub fn name(&self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    /// Risk weight on the deployment's single weight scale.
    ///
    /// `none 0.0 / low 0.25 / medium 0.5 / high 0.75 / critical 1.0`.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::None => 0.0,
            Severity::Low => 0.25,
            Severity::Medium => 0.5,
            Severity::High => 0.75,
            Severity::Critical => 1.0,
        }
    }
}

/// Clamps a confidence or risk value into `[0, 1]`.
pub(crate) fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
