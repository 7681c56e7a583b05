//! Validation verdict value object

use crate::report::AgentRole;
use serde::{Deserialize, Serialize};

/// Identity of a quality gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    Input,
    Report,
    Objectivity,
}

impl GateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateKind::Input => "input",
            GateKind::Report => "report",
            GateKind::Objectivity => "objectivity",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GateKind::Input => "Input Validation",
            GateKind::Report => "Report Validation",
            GateKind::Objectivity => "Objectivity Validation",
        }
    }
}

impl std::fmt::Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Output of one gate invocation
///
/// A failing verdict always carries at least one diagnostic; there is no
/// constructor that produces a reasonless failure. Non-fatal observations on
/// a passing verdict (e.g. one unparseable citation among several good ones)
/// go into `notes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VerdictRecord")]
pub struct ValidationVerdict {
    gate: GateKind,
    passed: bool,
    diagnostics: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<AgentRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}

/// Wire form of a verdict, checked before it becomes a [`ValidationVerdict`]
#[derive(Deserialize)]
struct VerdictRecord {
    gate: GateKind,
    passed: bool,
    diagnostics: Vec<String>,
    #[serde(default)]
    notes: Vec<String>,
    #[serde(default)]
    subject: Option<AgentRole>,
    #[serde(default)]
    score: Option<f64>,
}

impl TryFrom<VerdictRecord> for ValidationVerdict {
    type Error = String;

    fn try_from(record: VerdictRecord) -> Result<Self, Self::Error> {
        if record.passed != record.diagnostics.is_empty() {
            return Err(format!(
                "{} verdict with passed = {} must {} diagnostics",
                record.gate,
                record.passed,
                if record.passed { "not carry" } else { "carry" }
            ));
        }
        Ok(Self {
            gate: record.gate,
            passed: record.passed,
            diagnostics: record.diagnostics,
            notes: record.notes,
            subject: record.subject,
            score: record.score,
        })
    }
}

impl ValidationVerdict {
    pub fn pass(gate: GateKind) -> Self {
        Self {
            gate,
            passed: true,
            diagnostics: Vec::new(),
            notes: Vec::new(),
            subject: None,
            score: None,
        }
    }

    /// Passes when `diagnostics` is empty, fails with them otherwise
    pub fn from_diagnostics(gate: GateKind, diagnostics: Vec<String>) -> Self {
        Self {
            gate,
            passed: diagnostics.is_empty(),
            diagnostics,
            notes: Vec::new(),
            subject: None,
            score: None,
        }
    }

    pub fn with_subject(mut self, role: AgentRole) -> Self {
        self.subject = Some(role);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn gate(&self) -> GateKind {
        self.gate
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn subject(&self) -> Option<AgentRole> {
        self.subject
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn into_diagnostics(self) -> Vec<String> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_has_no_diagnostics() {
        let verdict = ValidationVerdict::pass(GateKind::Input);
        assert!(verdict.passed());
        assert!(verdict.diagnostics().is_empty());
    }

    #[test]
    fn test_from_diagnostics() {
        let ok = ValidationVerdict::from_diagnostics(GateKind::Report, vec![]);
        assert!(ok.passed());

        let failed =
            ValidationVerdict::from_diagnostics(GateKind::Report, vec!["bad".to_string()])
                .with_subject(AgentRole::Adversary);
        assert!(!failed.passed());
        assert_eq!(failed.diagnostics(), &["bad".to_string()]);
        assert_eq!(failed.subject(), Some(AgentRole::Adversary));
    }

    #[test]
    fn test_notes_do_not_fail_verdict() {
        let verdict = ValidationVerdict::pass(GateKind::Report)
            .with_notes(vec!["citation 2 could not be parsed".into()]);
        assert!(verdict.passed());
        assert_eq!(verdict.notes().len(), 1);
    }

    #[test]
    fn test_deserialize_keeps_pass_fail_invariant() {
        let reasonless = serde_json::json!({
            "gate": "report",
            "passed": false,
            "diagnostics": [],
        });
        assert!(serde_json::from_value::<ValidationVerdict>(reasonless).is_err());

        let contradictory = serde_json::json!({
            "gate": "input",
            "passed": true,
            "diagnostics": ["question text must not be empty"],
        });
        assert!(serde_json::from_value::<ValidationVerdict>(contradictory).is_err());

        let verdict = ValidationVerdict::from_diagnostics(GateKind::Objectivity, vec!["low".into()])
            .with_subject(AgentRole::Judicial)
            .with_score(0.2);
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(serde_json::from_value::<ValidationVerdict>(json).unwrap(), verdict);
    }

    #[test]
    fn test_gate_display() {
        assert_eq!(GateKind::Objectivity.to_string(), "Objectivity Validation");
        assert_eq!(GateKind::Input.as_str(), "input");
    }
}
