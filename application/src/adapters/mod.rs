//! Agent adapters
//!
//! Wrap a [`LegalAgent`](crate::ports::legal_agent::LegalAgent) with the
//! timeout, cancellation and failure-translation policy of one role.

pub mod agent_adapter;

pub use agent_adapter::{AgentAdapter, AgentFailure};
