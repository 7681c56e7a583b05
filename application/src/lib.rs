//! Application layer for tribunal
//!
//! This crate contains the workflow state machine, the agent adapters, port
//! definitions, and application configuration. It depends only on the
//! domain layer.

pub mod adapters;
pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use adapters::{AgentAdapter, AgentFailure};
pub use config::WorkflowOptions;
pub use ports::{
    legal_agent::{AgentContext, AgentError, AgentSet, LegalAgent},
    message_bus::{BusError, MessageBus, MessageStream},
    message_sink::{MessageSink, NoMessageSink, attach_sink, join_sinks},
};
pub use use_cases::submit_query::{SubmitError, SubmitQueryUseCase};
