//! Detection categories and their static policy metadata.

use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// Closed set of content categories the engine can detect.
///
/// Unknown category strings are rejected at the validation boundary
/// (see [`Category::parse`]), never inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Email addresses.
    Email,
    /// Phone numbers.
    Phone,
    /// US social security numbers.
    Ssn,
    /// Payment card numbers.
    CreditCard,
    /// IPv4 addresses.
    IpAddress,
    /// Provider API keys and bearer tokens.
    ApiKey,
    /// Password or secret assignments.
    Credential,
    /// Insults and abusive language.
    Toxicity,
    /// Hate speech or discrimination.
    HateSpeech,
    /// Attempts to override model instructions.
    PromptInjection,
    /// Model extraction and system-prompt exfiltration probes.
    ModelAbuse,
    /// Sexually explicit adult content.
    AdultContent,
    /// Gambling and betting content.
    Gambling,
    /// Child sexual exploitation content.
    ChildSafety,
    /// Self-harm or suicide content.
    SelfHarm,
    /// Violence and weapons content.
    Violence,
    /// Drugs, fraud, and other illegal activity.
    IllegalActivity,
}

impl Category {
    /// Returns all known categories.
    pub fn all() -> &'static [Category] {
        &[
            Category::Email,
            Category::Phone,
            Category::Ssn,
            Category::CreditCard,
            Category::IpAddress,
            Category::ApiKey,
            Category::Credential,
            Category::Toxicity,
            Category::HateSpeech,
            Category::PromptInjection,
            Category::ModelAbuse,
            Category::AdultContent,
            Category::Gambling,
            Category::ChildSafety,
            Category::SelfHarm,
            Category::Violence,
            Category::IllegalActivity,
        ]
    }

    /// Returns a human-readable name for this category.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Email => "Email",
            Category::Phone => "Phone",
            Category::Ssn => "SSN",
            Category::CreditCard => "Credit Card",
            Category::IpAddress => "IP Address",
            Category::ApiKey => "API Key",
            Category::Credential => "Credential",
            Category::Toxicity => "Toxicity",
            Category::HateSpeech => "Hate Speech",
            Category::PromptInjection => "Prompt Injection",
            Category::ModelAbuse => "Model Abuse",
            Category::AdultContent => "Adult Content",
            Category::Gambling => "Gambling",
            Category::ChildSafety => "Child Safety",
            Category::SelfHarm => "Self-Harm",
            Category::Violence => "Violence",
            Category::IllegalActivity => "Illegal Activity",
        }
    }

    /// Uppercase label used by label-style redaction placeholders.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Email => "EMAIL",
            Category::Phone => "PHONE",
            Category::Ssn => "SSN",
            Category::CreditCard => "CREDIT_CARD",
            Category::IpAddress => "IP_ADDRESS",
            Category::ApiKey => "API_KEY",
            Category::Credential => "CREDENTIAL",
            Category::Toxicity => "TOXICITY",
            Category::HateSpeech => "HATE_SPEECH",
            Category::PromptInjection => "PROMPT_INJECTION",
            Category::ModelAbuse => "MODEL_ABUSE",
            Category::AdultContent => "ADULT_CONTENT",
            Category::Gambling => "GAMBLING",
            Category::ChildSafety => "CHILD_SAFETY",
            Category::SelfHarm => "SELF_HARM",
            Category::Violence => "VIOLENCE",
            Category::IllegalActivity => "ILLEGAL_ACTIVITY",
        }
    }

    /// Parses a snake_case category string at the validation boundary.
    pub fn parse(value: &str) -> Option<Category> {
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == value)
    }

    /// The snake_case wire form of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Email => "email",
            Category::Phone => "phone",
            Category::Ssn => "ssn",
            Category::CreditCard => "credit_card",
            Category::IpAddress => "ip_address",
            Category::ApiKey => "api_key",
            Category::Credential => "credential",
            Category::Toxicity => "toxicity",
            Category::HateSpeech => "hate_speech",
            Category::PromptInjection => "prompt_injection",
            Category::ModelAbuse => "model_abuse",
            Category::AdultContent => "adult_content",
            Category::Gambling => "gambling",
            Category::ChildSafety => "child_safety",
            Category::SelfHarm => "self_harm",
            Category::Violence => "violence",
            Category::IllegalActivity => "illegal_activity",
        }
    }

    /// Static policy metadata for this category.
    pub fn metadata(&self) -> CategoryMetadata {
        match self {
            Category::Email => CategoryMetadata::standard(Severity::Medium),
            Category::Phone => CategoryMetadata::standard(Severity::Medium),
            Category::Ssn => CategoryMetadata::standard(Severity::High),
            Category::CreditCard => CategoryMetadata::standard(Severity::High),
            Category::IpAddress => CategoryMetadata::standard(Severity::Low),
            Category::ApiKey => CategoryMetadata::standard(Severity::High),
            Category::Credential => CategoryMetadata::standard(Severity::High),
            Category::Toxicity => CategoryMetadata::standard(Severity::Medium),
            Category::HateSpeech => CategoryMetadata::standard(Severity::High),
            Category::PromptInjection => CategoryMetadata::standard(Severity::High),
            Category::ModelAbuse => CategoryMetadata::standard(Severity::Medium),
            Category::AdultContent => CategoryMetadata::age_restricted(
                Severity::Medium,
                "This content is intended for adult audiences.",
            ),
            Category::Gambling => CategoryMetadata::age_restricted(
                Severity::Low,
                "Gambling content is restricted to verified adults.",
            ),
            Category::ChildSafety => CategoryMetadata::critical(Severity::Critical),
            Category::SelfHarm => CategoryMetadata::critical(Severity::Critical),
            Category::Violence => CategoryMetadata::standard(Severity::High),
            Category::IllegalActivity => CategoryMetadata::standard(Severity::High),
        }
    }
}

/// Static per-category policy attributes, fixed at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetadata {
    /// Severity assigned when a rule does not override it.
    pub default_severity: Severity,
    /// Forces a block irrespective of caller policy.
    pub critical: bool,
    /// Allowed for age-verified callers (with a warning).
    pub age_restricted_allowed: bool,
    /// Warning text attached to age-gate and warn decisions.
    pub default_warning: Option<String>,
}

impl CategoryMetadata {
    fn standard(default_severity: Severity) -> Self {
        Self {
            default_severity,
            critical: false,
            age_restricted_allowed: false,
            default_warning: None,
        }
    }

    fn critical(default_severity: Severity) -> Self {
        Self {
            default_severity,
            critical: true,
            age_restricted_allowed: false,
            default_warning: None,
        }
    }

    fn age_restricted(default_severity: Severity, warning: &str) -> Self {
        Self {
            default_severity,
            critical: false,
            age_restricted_allowed: true,
            default_warning: Some(warning.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_all_covers_parse_roundtrip() {
        for category in Category::all() {
            assert_eq!(Category::parse(category.as_str()), Some(*category));
        }
    }

    #[test]
    fn category_parse_rejects_unknown() {
        assert_eq!(Category::parse("astrology"), None);
        assert_eq!(Category::parse(""), None);
        assert_eq!(Category::parse("EMAIL"), None);
    }

    #[test]
    fn category_serialization_matches_as_str() {
        for category in Category::all() {
            let json = serde_json::to_string(category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn critical_categories_are_marked() {
        assert!(Category::ChildSafety.metadata().critical);
        assert!(Category::SelfHarm.metadata().critical);
        assert!(!Category::Email.metadata().critical);
    }

    #[test]
    fn age_restricted_categories_carry_warnings() {
        let meta = Category::AdultContent.metadata();
        assert!(meta.age_restricted_allowed);
        assert!(meta.default_warning.is_some());

        let meta = Category::Gambling.metadata();
        assert!(meta.age_restricted_allowed);
        assert!(meta.default_warning.is_some());
    }

    #[test]
    fn critical_categories_are_never_age_gateable() {
        for category in Category::all() {
            let meta = category.metadata();
            assert!(
                !(meta.critical && meta.age_restricted_allowed),
                "{} is both critical and age-gateable",
                category.name()
            );
        }
    }
}
