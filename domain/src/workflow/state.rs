//! Workflow states and the legal transition graph

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::error::DomainError;

/// State of a workflow run
///
/// Every run starts at `Idle` and terminates at either `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    /// Input Validation of the query package
    Initializing,
    /// Advocate and Adversary researching concurrently
    ParallelResearch,
    /// Report Validation of both research reports
    ValidatingReports,
    /// Judicial agent synthesizing from both reports
    JudicialSynthesis,
    /// Objectivity Validation of the judicial report
    ValidatingObjectivity,
    /// Terminal: judicial report accepted
    Completed,
    /// A stage failed; deciding between retry and `Failed`
    Error,
    /// Terminal: the run could not produce an accepted judicial report
    Failed,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 9] = [
        WorkflowState::Idle,
        WorkflowState::Initializing,
        WorkflowState::ParallelResearch,
        WorkflowState::ValidatingReports,
        WorkflowState::JudicialSynthesis,
        WorkflowState::ValidatingObjectivity,
        WorkflowState::Completed,
        WorkflowState::Error,
        WorkflowState::Failed,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// States whose failure may be retried through `Error`
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::ParallelResearch
                | Self::ValidatingReports
                | Self::JudicialSynthesis
                | Self::ValidatingObjectivity
        )
    }

    /// The stage to re-enter after this state failed.
    ///
    /// Validation failures re-run the stage that produced the rejected
    /// report; agent failures re-run their own stage.
    pub fn retry_target(self) -> Option<WorkflowState> {
        match self {
            Self::ParallelResearch | Self::ValidatingReports => Some(Self::ParallelResearch),
            Self::JudicialSynthesis | Self::ValidatingObjectivity => Some(Self::JudicialSynthesis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::ParallelResearch => "parallel_research",
            Self::ValidatingReports => "validating_reports",
            Self::JudicialSynthesis => "judicial_synthesis",
            Self::ValidatingObjectivity => "validating_objectivity",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Failed => "failed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Initializing => "Initializing",
            Self::ParallelResearch => "Parallel Research",
            Self::ValidatingReports => "Validating Reports",
            Self::JudicialSynthesis => "Judicial Synthesis",
            Self::ValidatingObjectivity => "Validating Objectivity",
            Self::Completed => "Completed",
            Self::Error => "Error",
            Self::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for WorkflowState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == key)
            .ok_or_else(|| DomainError::UnknownState(s.to_string()))
    }
}

/// Legal transitions between workflow states.
///
/// ```text
/// Idle → Initializing
/// Initializing → ParallelResearch | Failed
/// ParallelResearch → ValidatingReports | Error
/// ValidatingReports → JudicialSynthesis | Error
/// JudicialSynthesis → ValidatingObjectivity | Error
/// ValidatingObjectivity → Completed | Error
/// Error → ParallelResearch | JudicialSynthesis | Failed
/// ```
///
/// Any non-terminal state may also move to `Error` or `Failed`; which of
/// those the orchestrator actually uses is decided by the failure kind
/// (input errors and deadline expiry go straight to `Failed`).
pub fn is_legal_transition(from: WorkflowState, to: WorkflowState) -> bool {
    use WorkflowState::*;

    if from.is_terminal() {
        return false;
    }

    if to == Failed {
        return true;
    }

    if to == Error {
        return from != Error && from != Idle;
    }

    matches!(
        (from, to),
        (Idle, Initializing)
            | (Initializing, ParallelResearch)
            | (ParallelResearch, ValidatingReports)
            | (ValidatingReports, JudicialSynthesis)
            | (JudicialSynthesis, ValidatingObjectivity)
            | (ValidatingObjectivity, Completed)
            // Retry edges
            | (Error, ParallelResearch)
            | (Error, JudicialSynthesis)
    )
}

/// A single recorded state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an illegal transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Illegal workflow transition: {from} → {to}")]
pub struct IllegalTransition {
    pub from: WorkflowState,
    pub to: WorkflowState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkflowState::*;

    #[test]
    fn test_happy_path_is_legal() {
        let path = [
            Idle,
            Initializing,
            ParallelResearch,
            ValidatingReports,
            JudicialSynthesis,
            ValidatingObjectivity,
            Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                is_legal_transition(pair[0], pair[1]),
                "{} → {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for to in WorkflowState::ALL {
            assert!(!is_legal_transition(Completed, to));
            assert!(!is_legal_transition(Failed, to));
        }
    }

    #[test]
    fn test_failed_reachable_from_any_non_terminal() {
        for from in WorkflowState::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(is_legal_transition(from, Failed), "{from} → Failed");
        }
    }

    #[test]
    fn test_no_skipping_or_backtracking() {
        assert!(!is_legal_transition(Initializing, JudicialSynthesis));
        assert!(!is_legal_transition(ValidatingReports, ParallelResearch));
        assert!(!is_legal_transition(ValidatingObjectivity, JudicialSynthesis));
        assert!(!is_legal_transition(Idle, Error));
        assert!(!is_legal_transition(Error, Error));
        assert!(!is_legal_transition(Error, Initializing));
    }

    #[test]
    fn test_retry_targets() {
        assert_eq!(ParallelResearch.retry_target(), Some(ParallelResearch));
        assert_eq!(ValidatingReports.retry_target(), Some(ParallelResearch));
        assert_eq!(JudicialSynthesis.retry_target(), Some(JudicialSynthesis));
        assert_eq!(ValidatingObjectivity.retry_target(), Some(JudicialSynthesis));
        assert_eq!(Initializing.retry_target(), None);
        assert!(!Initializing.is_retryable());
    }

    #[test]
    fn test_parse_state_names() {
        assert_eq!("parallel_research".parse::<WorkflowState>(), Ok(ParallelResearch));
        assert_eq!(
            "Validating Objectivity".parse::<WorkflowState>(),
            Ok(ValidatingObjectivity)
        );
        assert!("reviewing".parse::<WorkflowState>().is_err());
    }

    #[test]
    fn test_illegal_transition_display() {
        let err = IllegalTransition {
            from: Idle,
            to: Completed,
        };
        assert_eq!(err.to_string(), "Illegal workflow transition: Idle → Completed");
    }
}
