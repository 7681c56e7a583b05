//! Workflow configuration from TOML (`[workflow]` section)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tribunal_domain::{AgentRole, ConfigIssue, ConfigIssueCode, WorkflowState};

/// Raw workflow configuration from TOML
///
/// # Example
///
/// ```toml
/// [workflow]
/// agent_timeout_seconds = 120
/// deadline_seconds = 600
/// max_attempts = 3
/// objectivity_threshold = 0.5
///
/// [workflow.role_timeouts]
/// judicial = 240
///
/// [workflow.stage_attempts]
/// validating_objectivity = 2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileWorkflowConfig {
    /// Default timeout of one agent invocation
    pub agent_timeout_seconds: u64,
    /// Overall deadline of a run
    pub deadline_seconds: u64,
    /// Default attempt budget of a failing stage
    pub max_attempts: u32,
    /// Minimum balance score of the judicial report
    pub objectivity_threshold: f64,
    /// Per-role timeout overrides (role → seconds)
    pub role_timeouts: BTreeMap<String, u64>,
    /// Per-state attempt overrides (failing state → attempts)
    pub stage_attempts: BTreeMap<String, u32>,
}

impl Default for FileWorkflowConfig {
    fn default() -> Self {
        Self {
            agent_timeout_seconds: 120,
            deadline_seconds: 600,
            max_attempts: 3,
            objectivity_threshold: 0.5,
            role_timeouts: BTreeMap::new(),
            stage_attempts: BTreeMap::new(),
        }
    }
}

impl FileWorkflowConfig {
    /// Parse `role_timeouts`, skipping and reporting unusable entries
    pub fn parse_role_timeouts(&self) -> (HashMap<AgentRole, Duration>, Vec<ConfigIssue>) {
        let mut timeouts = HashMap::new();
        let mut issues = Vec::new();

        for (key, &seconds) in &self.role_timeouts {
            let Ok(role) = key.parse::<AgentRole>() else {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownRole,
                    format!(
                        "workflow.role_timeouts: unknown role '{}' (expected advocate, adversary or judicial)",
                        key
                    ),
                ));
                continue;
            };
            if seconds == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroDuration,
                    format!("workflow.role_timeouts.{}: timeout cannot be 0", key),
                ));
                continue;
            }
            if seconds > self.deadline_seconds {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::TimeoutExceedsDeadline,
                    format!(
                        "workflow.role_timeouts.{}: {}s exceeds the {}s deadline",
                        key, seconds, self.deadline_seconds
                    ),
                ));
            }
            timeouts.insert(role, Duration::from_secs(seconds));
        }

        (timeouts, issues)
    }

    /// Parse `stage_attempts`, skipping and reporting unusable entries
    pub fn parse_stage_attempts(&self) -> (HashMap<WorkflowState, u32>, Vec<ConfigIssue>) {
        let mut attempts = HashMap::new();
        let mut issues = Vec::new();

        for (key, &count) in &self.stage_attempts {
            let state = match key.parse::<WorkflowState>() {
                Ok(state) if state.is_retryable() => state,
                _ => {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::UnknownStage,
                        format!(
                            "workflow.stage_attempts: '{}' is not a retryable stage (expected parallel_research, validating_reports, judicial_synthesis or validating_objectivity)",
                            key
                        ),
                    ));
                    continue;
                }
            };
            if count == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroAttempts,
                    format!("workflow.stage_attempts.{}: attempts cannot be 0", key),
                ));
                continue;
            }
            attempts.insert(state, count);
        }

        (attempts, issues)
    }

    /// Scalar checks; map entries are checked by the `parse_*` methods
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.agent_timeout_seconds == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroDuration,
                "workflow.agent_timeout_seconds cannot be 0",
            ));
        }
        if self.deadline_seconds == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroDuration,
                "workflow.deadline_seconds cannot be 0",
            ));
        }
        if self.max_attempts == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroAttempts,
                "workflow.max_attempts cannot be 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.objectivity_threshold) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ThresholdOutOfRange,
                format!(
                    "workflow.objectivity_threshold must be within [0, 1], got {}",
                    self.objectivity_threshold
                ),
            ));
        }
        if self.agent_timeout_seconds > self.deadline_seconds && self.deadline_seconds > 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::TimeoutExceedsDeadline,
                format!(
                    "workflow.agent_timeout_seconds ({}s) exceeds deadline_seconds ({}s)",
                    self.agent_timeout_seconds, self.deadline_seconds
                ),
            ));
        }

        issues
    }
}
