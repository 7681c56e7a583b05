//! Domain layer for tribunal
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Adversarial workflow
//!
//! Every legal query is analysed by three parties:
//!
//! - **Advocate**: argues for the position in the query
//! - **Adversary**: argues against it
//! - **Judicial**: weighs both reports and produces the final analysis
//!
//! The two research reports are produced in parallel and must pass the
//! Report Validation gate before the Judicial agent sees them. The judicial
//! report must pass the Objectivity Validation gate before the run completes.
//!
//! ## Workflow run
//!
//! A [`WorkflowRun`] walks the state graph in [`workflow::state`]. Failures
//! move it to `Error`, from where it either retries the failing stage or,
//! once that stage's attempt budget is spent, terminates in `Failed`.

pub mod bus;
pub mod config;
pub mod core;
pub mod gate;
pub mod report;
pub mod workflow;

// Re-export commonly used types
pub use bus::{FailureNote, Message, MessageSource, Payload, ProgressNote, Topic, TopicFilter};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{
    correlation::CorrelationId,
    error::DomainError,
    query::{LanguageTag, UserQueryPackage},
};
pub use gate::{
    BalanceScorer, CitationBalanceScorer, CitationKind, CitationParseError, CitationParser,
    GateKind, InputValidation, ObjectivityValidation, ReportValidation, StructuredCitation,
    ValidationVerdict,
};
pub use report::{AgentReport, AgentRole, Confidence};
pub use workflow::{
    CompletedRun, Diagnostic, ErrorKind, IllegalTransition, RunSummary, TransitionRecord,
    WorkflowFailure, WorkflowResult, WorkflowRun, WorkflowState,
};
