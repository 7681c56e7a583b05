//! Agent reports
//!
//! The three parties of the tribunal and the report each one produces.

pub mod entities;

pub use entities::{AgentReport, AgentRole, Confidence};
