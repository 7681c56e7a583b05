//! Infrastructure layer for tribunal
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the in-process message bus, process-backed agents,
//! the default citation parser, message journaling and configuration
//! file loading.

pub mod agent;
pub mod bus;
pub mod citation;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use agent::{ProcessAgent, ProcessAgentError};
pub use bus::InProcessMessageBus;
pub use citation::SwissCitationParser;
pub use config::{
    ConfigLoader, ConfigSources, ConfigValidationError, FileAgentCommand, FileAgentsConfig,
    FileConfig, FileLoggingConfig, FileOutputConfig, FileWorkflowConfig,
};
pub use logging::{JsonlMessageLogger, TracingSink};
