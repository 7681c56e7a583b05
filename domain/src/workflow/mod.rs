//! Workflow state machine model
//!
//! The state graph, the [`WorkflowRun`] aggregate that the orchestrator
//! drives through it, and the result types produced when a run terminates.

pub mod diagnostic;
pub mod result;
pub mod run;
pub mod state;

pub use diagnostic::{Diagnostic, ErrorKind};
pub use result::{CompletedRun, RunSummary, WorkflowFailure, WorkflowResult};
pub use run::WorkflowRun;
pub use state::{IllegalTransition, TransitionRecord, WorkflowState, is_legal_transition};
