//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod legal_agent;
pub mod message_bus;
pub mod message_sink;
