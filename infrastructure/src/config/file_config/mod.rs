//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod agents;
mod logging;
mod output;
mod workflow;

pub use agents::{FileAgentCommand, FileAgentsConfig};
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use workflow::FileWorkflowConfig;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tribunal_application::WorkflowOptions;
use tribunal_domain::ConfigIssue;

/// Raised when a configuration contains at least one error-level issue
#[derive(Debug, Error)]
#[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ConfigValidationError(pub Vec<ConfigIssue>);

impl ConfigValidationError {
    pub fn issues(&self) -> &[ConfigIssue] {
        &self.0
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Workflow timing, retry and objectivity settings
    pub workflow: FileWorkflowConfig,
    /// Agent commands per role
    pub agents: FileAgentsConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Message journal settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Workflow scalars (zero durations, zero attempts, threshold range)
    /// 2. Role timeout and stage attempt keys and values
    /// 3. Agent commands for every role
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.workflow.validate();
        issues.extend(self.workflow.parse_role_timeouts().1);
        issues.extend(self.workflow.parse_stage_attempts().1);
        issues.extend(self.agents.validate());
        issues
    }

    /// Fail on error-level issues, passing warnings through
    pub fn check(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            self.validate().into_iter().partition(ConfigIssue::is_error);
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigValidationError(errors))
        }
    }

    /// Build the options that bound a workflow run.
    ///
    /// Invalid map entries are skipped; [`validate`](Self::validate) reports them.
    pub fn to_workflow_options(&self) -> WorkflowOptions {
        let workflow = &self.workflow;
        WorkflowOptions {
            agent_timeout: Duration::from_secs(workflow.agent_timeout_seconds),
            role_timeouts: workflow.parse_role_timeouts().0,
            max_attempts: workflow.max_attempts,
            stage_max_attempts: workflow.parse_stage_attempts().0,
            deadline: Duration::from_secs(workflow.deadline_seconds),
            objectivity_threshold: workflow.objectivity_threshold,
        }
    }
}
