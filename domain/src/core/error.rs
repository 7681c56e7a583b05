//! Domain error types

use crate::report::AgentRole;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Citation at position {0} is empty")]
    EmptyCitation(usize),

    #[error("Report for role {0} has already been collected")]
    ReportAlreadySet(AgentRole),

    #[error("Invalid correlation id: {0}")]
    InvalidCorrelationId(String),

    #[error("Unknown agent role: {0}")]
    UnknownRole(String),

    #[error("Unknown workflow state: {0}")]
    UnknownState(String),

    #[error("No accepted report for role {0}")]
    MissingReport(AgentRole),

    #[error("Workflow run has not completed")]
    RunFinished,
}
