//! Diagnostic history entries

use super::state::WorkflowState;
use crate::gate::GateKind;
use crate::report::AgentRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failure taxonomy of a workflow run
///
/// Bus delivery failures are not listed here: they abort `submit` as an
/// infrastructure fault instead of becoming part of the run's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed query package; terminal, never retried
    InputError,
    /// Adapter exception, timeout or malformed output; retryable
    AgentFailure,
    /// A gate rejected a report; retryable by re-running the producing stage
    ValidationFailure,
    /// Overall deadline exceeded; always terminal
    TimeoutError,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::AgentFailure | ErrorKind::ValidationFailure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InputError => "input_error",
            ErrorKind::AgentFailure => "agent_failure",
            ErrorKind::ValidationFailure => "validation_failure",
            ErrorKind::TimeoutError => "timeout_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One failure event in a run's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// State in which the failure happened
    pub state: WorkflowState,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<AgentRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateKind>,
    /// 1-based attempt of the failing stage; filled in by the run
    pub attempt: u32,
    pub messages: Vec<String>,
    pub at: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(state: WorkflowState, kind: ErrorKind, messages: Vec<String>) -> Self {
        Self {
            state,
            kind,
            role: None,
            gate: None,
            attempt: 0,
            messages,
            at: Utc::now(),
        }
    }

    pub fn input(messages: Vec<String>) -> Self {
        Self::new(WorkflowState::Initializing, ErrorKind::InputError, messages)
            .with_gate(GateKind::Input)
    }

    pub fn agent(state: WorkflowState, role: AgentRole, message: impl Into<String>) -> Self {
        Self::new(state, ErrorKind::AgentFailure, vec![message.into()]).with_role(role)
    }

    pub fn validation(state: WorkflowState, gate: GateKind, messages: Vec<String>) -> Self {
        Self::new(state, ErrorKind::ValidationFailure, messages).with_gate(gate)
    }

    pub fn timeout(state: WorkflowState, message: impl Into<String>) -> Self {
        Self::new(state, ErrorKind::TimeoutError, vec![message.into()])
    }

    pub fn with_role(mut self, role: AgentRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_gate(mut self, gate: GateKind) -> Self {
        self.gate = Some(gate);
        self
    }

    /// One-line summary, e.g. `[parallel_research#1] agent_failure (advocate): timed out`
    pub fn summary(&self) -> String {
        let mut line = format!("[{}#{}] {}", self.state.as_str(), self.attempt, self.kind);
        if let Some(role) = self.role {
            line.push_str(&format!(" ({role})"));
        }
        line.push_str(": ");
        line.push_str(&self.messages.join("; "));
        line
    }
}
