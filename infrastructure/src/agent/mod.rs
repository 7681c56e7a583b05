//! Agent implementations
//!
//! [`ProcessAgent`] runs an external command per invocation and exchanges
//! JSON with it over stdin/stdout.

mod process;

pub use process::{AgentRequest, AgentResponse, ProcessAgent, ProcessAgentError};
