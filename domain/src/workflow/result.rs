//! Workflow result value objects - what `submit` hands back to the caller.

use super::diagnostic::{Diagnostic, ErrorKind};
use super::state::{TransitionRecord, WorkflowState};
use crate::core::correlation::CorrelationId;
use crate::report::AgentReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Archived record of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub correlation_id: CorrelationId,
    pub question: String,
    pub language: String,
    pub final_state: WorkflowState,
    pub transitions: Vec<TransitionRecord>,
    /// Ordered failure history
    pub diagnostics: Vec<Diagnostic>,
    /// Non-fatal gate observations, e.g. citations that could not be parsed
    /// in a report that still passed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Failure count per failing state
    pub failures: BTreeMap<WorkflowState, u32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Number of times `state` was entered during the run
    pub fn entries(&self, state: WorkflowState) -> usize {
        self.transitions.iter().filter(|t| t.to == state).count()
    }

    pub fn diagnostics_of(&self, kind: ErrorKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

/// A run that reached `Completed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedRun {
    pub judicial: AgentReport,
    pub advocate: AgentReport,
    pub adversary: AgentReport,
    pub summary: RunSummary,
}

/// A run that reached `Failed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowFailure {
    /// The stage that caused the run to give up
    pub failed_in: WorkflowState,
    pub summary: RunSummary,
}

impl WorkflowFailure {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.summary.diagnostics
    }

    /// All diagnostic messages in order, flattened
    pub fn messages(&self) -> Vec<&str> {
        self.summary
            .diagnostics
            .iter()
            .flat_map(|d| d.messages.iter().map(String::as_str))
            .collect()
    }
}

/// Outcome of a single `submit`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowResult {
    Completed(CompletedRun),
    Failed(WorkflowFailure),
}

impl WorkflowResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, WorkflowResult::Completed(_))
    }

    pub fn summary(&self) -> &RunSummary {
        match self {
            WorkflowResult::Completed(run) => &run.summary,
            WorkflowResult::Failed(failure) => &failure.summary,
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.summary().correlation_id
    }

    pub fn final_state(&self) -> WorkflowState {
        self.summary().final_state
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.summary().diagnostics
    }

    pub fn judicial(&self) -> Option<&AgentReport> {
        match self {
            WorkflowResult::Completed(run) => Some(&run.judicial),
            WorkflowResult::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(final_state: WorkflowState, diagnostics: Vec<Diagnostic>) -> RunSummary {
        let now = Utc::now();
        RunSummary {
            correlation_id: CorrelationId::new(),
            question: "q".into(),
            language: "DE".into(),
            final_state,
            transitions: Vec::new(),
            diagnostics,
            notes: Vec::new(),
            failures: BTreeMap::new(),
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_failure_messages_flattened() {
        let failure = WorkflowFailure {
            failed_in: WorkflowState::Error,
            summary: summary(
                WorkflowState::Failed,
                vec![
                    Diagnostic::timeout(WorkflowState::ParallelResearch, "deadline"),
                    Diagnostic::input(vec!["a".into(), "b".into()]),
                ],
            ),
        };
        assert_eq!(failure.messages(), vec!["deadline", "a", "b"]);

        let result = WorkflowResult::Failed(failure);
        assert!(!result.is_completed());
        assert!(result.judicial().is_none());
        assert_eq!(result.final_state(), WorkflowState::Failed);
        assert_eq!(
            result.summary().diagnostics_of(ErrorKind::InputError).count(),
            1
        );
    }

    #[test]
    fn test_result_serializes_with_status_tag() {
        let result = WorkflowResult::Failed(WorkflowFailure {
            failed_in: WorkflowState::Initializing,
            summary: summary(WorkflowState::Failed, Vec::new()),
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failed_in"], "initializing");
        assert_eq!(json["summary"]["final_state"], "failed");
    }
}
