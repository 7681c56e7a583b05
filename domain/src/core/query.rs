//! User query package value object

use super::correlation::CorrelationId;
use serde::{Deserialize, Serialize};

/// Jurisdiction / language of a legal query (Value Object)
///
/// Swiss federal law is published in the three official languages, and the
/// tag decides which citation conventions the parser applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LanguageTag {
    De,
    Fr,
    It,
}

impl LanguageTag {
    pub const ALL: [LanguageTag; 3] = [LanguageTag::De, LanguageTag::Fr, LanguageTag::It];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::De => "DE",
            LanguageTag::Fr => "FR",
            LanguageTag::It => "IT",
        }
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LanguageTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DE" => Ok(LanguageTag::De),
            "FR" => Ok(LanguageTag::Fr),
            "IT" => Ok(LanguageTag::It),
            _ => Err(s.to_string()),
        }
    }
}

/// The workflow's sole external input (Value Object)
///
/// The language is kept as the raw tag the caller submitted so that Input
/// Validation can report an unrecognized tag instead of the caller failing
/// at construction time. Once a run accepts the package it is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQueryPackage {
    question: String,
    language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prior_context: Option<String>,
    correlation_id: CorrelationId,
}

impl UserQueryPackage {
    /// Create a package with a freshly generated correlation id
    pub fn new(question: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            language: language.into(),
            prior_context: None,
            correlation_id: CorrelationId::new(),
        }
    }

    pub fn with_prior_context(mut self, context: impl Into<String>) -> Self {
        self.prior_context = Some(context.into());
        self
    }

    pub fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = id;
        self
    }

    /// Same content, new correlation id (for an independent re-submission)
    pub fn resubmitted(&self) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            ..self.clone()
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// The raw language tag as submitted
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The parsed language tag, if recognized
    pub fn language_tag(&self) -> Option<LanguageTag> {
        self.language.parse().ok()
    }

    pub fn prior_context(&self) -> Option<&str> {
        self.prior_context.as_deref()
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tag_parse_case_insensitive() {
        assert_eq!("de".parse::<LanguageTag>(), Ok(LanguageTag::De));
        assert_eq!(" Fr ".parse::<LanguageTag>(), Ok(LanguageTag::Fr));
        assert_eq!("IT".parse::<LanguageTag>(), Ok(LanguageTag::It));
        assert!("EN".parse::<LanguageTag>().is_err());
    }

    #[test]
    fn test_language_tag_serde_uppercase() {
        let json = serde_json::to_string(&LanguageTag::Fr).unwrap();
        assert_eq!(json, "\"FR\"");
    }

    #[test]
    fn test_package_builders() {
        let id = CorrelationId::new();
        let query = UserQueryPackage::new("Is clause X enforceable?", "DE")
            .with_prior_context("Employment contract, 2019")
            .with_correlation_id(id);

        assert_eq!(query.question(), "Is clause X enforceable?");
        assert_eq!(query.language_tag(), Some(LanguageTag::De));
        assert_eq!(query.prior_context(), Some("Employment contract, 2019"));
        assert_eq!(query.correlation_id(), id);
    }

    #[test]
    fn test_unrecognized_language_is_kept_raw() {
        let query = UserQueryPackage::new("Question", "EN");
        assert_eq!(query.language(), "EN");
        assert_eq!(query.language_tag(), None);
    }

    #[test]
    fn test_resubmitted_gets_new_correlation_id() {
        let query = UserQueryPackage::new("Question", "IT");
        let again = query.resubmitted();
        assert_eq!(again.question(), query.question());
        assert_ne!(again.correlation_id(), query.correlation_id());
    }
}
