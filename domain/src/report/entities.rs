//! Agent role and report entities

use crate::core::correlation::CorrelationId;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Role of an agent in the tribunal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Argues for the position raised by the query
    Advocate,
    /// Argues against it
    Adversary,
    /// Synthesizes an objective judgment from both
    Judicial,
}

impl AgentRole {
    /// The two roles that research in parallel
    pub const RESEARCH: [AgentRole; 2] = [AgentRole::Advocate, AgentRole::Adversary];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Advocate => "advocate",
            AgentRole::Adversary => "adversary",
            AgentRole::Judicial => "judicial",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentRole::Advocate => "Advocate",
            AgentRole::Adversary => "Adversary",
            AgentRole::Judicial => "Judicial",
        }
    }

    pub fn is_research(&self) -> bool {
        matches!(self, AgentRole::Advocate | AgentRole::Adversary)
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advocate" => Ok(AgentRole::Advocate),
            "adversary" => Ok(AgentRole::Adversary),
            "judicial" | "judge" => Ok(AgentRole::Judicial),
            _ => Err(DomainError::UnknownRole(s.to_string())),
        }
    }
}

/// Strength of a report's position, clamped to `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self(0.5)
    }
}

/// Output of one agent invocation (Entity)
///
/// Citations are kept as raw strings in the order the agent produced them;
/// they are parsed lazily by the Report Validation gate. Fields are private so
/// that a report's role cannot change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReport {
    role: AgentRole,
    position: String,
    citations: Vec<String>,
    #[serde(default)]
    confidence: Confidence,
    correlation_id: CorrelationId,
}

impl AgentReport {
    /// Create a report, rejecting empty citation strings
    pub fn new(
        role: AgentRole,
        correlation_id: CorrelationId,
        position: impl Into<String>,
        citations: Vec<String>,
    ) -> Result<Self, DomainError> {
        if let Some(index) = citations.iter().position(|c| c.trim().is_empty()) {
            return Err(DomainError::EmptyCitation(index));
        }

        Ok(Self {
            role,
            position: position.into(),
            citations,
            confidence: Confidence::default(),
            correlation_id,
        })
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Confidence::new(confidence);
        self
    }

    /// Re-check the citation invariant (for reports that arrived through serde)
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        match self.citations.iter().position(|c| c.trim().is_empty()) {
            Some(index) => Err(DomainError::EmptyCitation(index)),
            None => Ok(()),
        }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn citations(&self) -> &[String] {
        &self.citations
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("Advocate".parse::<AgentRole>(), Ok(AgentRole::Advocate));
        assert_eq!("judge".parse::<AgentRole>(), Ok(AgentRole::Judicial));
        assert!("clerk".parse::<AgentRole>().is_err());
        assert_eq!(AgentRole::Adversary.to_string(), "adversary");
    }

    #[test]
    fn test_research_roles() {
        assert!(AgentRole::Advocate.is_research());
        assert!(AgentRole::Adversary.is_research());
        assert!(!AgentRole::Judicial.is_research());
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Confidence::new(1.7).value(), 1.0);
        assert_eq!(Confidence::new(-0.2).value(), 0.0);
        assert_eq!(Confidence::new(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_report_rejects_empty_citation() {
        let err = AgentReport::new(
            AgentRole::Advocate,
            CorrelationId::new(),
            "Clause X is enforceable",
            vec!["Art. 20 OR".into(), "  ".into()],
        )
        .unwrap_err();
        assert_eq!(err, DomainError::EmptyCitation(1));
    }

    #[test]
    fn test_report_accessors() {
        let id = CorrelationId::new();
        let report = AgentReport::new(
            AgentRole::Adversary,
            id,
            "Clause X is void",
            vec!["Art. 20 OR".into()],
        )
        .unwrap()
        .with_confidence(0.8);

        assert_eq!(report.role(), AgentRole::Adversary);
        assert_eq!(report.citations(), &["Art. 20 OR".to_string()]);
        assert_eq!(report.confidence().value(), 0.8);
        assert_eq!(report.correlation_id(), id);
        assert!(report.check_invariants().is_ok());
    }

    #[test]
    fn test_deserialized_report_invariant_check() {
        let json = serde_json::json!({
            "role": "advocate",
            "position": "p",
            "citations": [""],
            "correlation_id": CorrelationId::new(),
        });
        let report: AgentReport = serde_json::from_value(json).unwrap();
        assert_eq!(report.check_invariants(), Err(DomainError::EmptyCitation(0)));
    }
}
