//! Workflow options: state machine loop control.
//!
//! [`WorkflowOptions`] groups the static parameters that bound a workflow
//! run: how long each agent may take, how often a failing stage may be
//! attempted, and how long the whole run may last. These are
//! application-layer concerns, not domain policy.

use std::collections::HashMap;
use std::time::Duration;
use tribunal_domain::{AgentRole, WorkflowState};

/// Workflow loop control parameters.
///
/// | Parameter | Default | Scope |
/// |-----------|---------|-------|
/// | `agent_timeout` | 120s | each adapter invocation, unless overridden per role |
/// | `max_attempts` | 3 | each failing stage, unless overridden per state |
/// | `deadline` | 600s | the whole run |
/// | `objectivity_threshold` | 0.5 | Objectivity Validation |
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOptions {
    /// Default timeout for a single agent invocation.
    pub agent_timeout: Duration,
    /// Per-role timeout overrides.
    pub role_timeouts: HashMap<AgentRole, Duration>,
    /// Default number of attempts of a failing stage before the run fails.
    pub max_attempts: u32,
    /// Per-state attempt overrides, keyed by the failing state.
    pub stage_max_attempts: HashMap<WorkflowState, u32>,
    /// Overall deadline for a run.
    pub deadline: Duration,
    /// Minimum balance score accepted by Objectivity Validation.
    pub objectivity_threshold: f64,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(120),
            role_timeouts: HashMap::new(),
            max_attempts: 3,
            stage_max_attempts: HashMap::new(),
            deadline: Duration::from_secs(600),
            objectivity_threshold: 0.5,
        }
    }
}

impl WorkflowOptions {
    /// Timeout that applies to `role`
    pub fn timeout_for(&self, role: AgentRole) -> Duration {
        self.role_timeouts
            .get(&role)
            .copied()
            .unwrap_or(self.agent_timeout)
    }

    /// Attempt budget of the failing state `state` (never below 1)
    pub fn max_attempts_for(&self, state: WorkflowState) -> u32 {
        self.stage_max_attempts
            .get(&state)
            .copied()
            .unwrap_or(self.max_attempts)
            .max(1)
    }

    // ==================== Builder Methods ====================

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_role_timeout(mut self, role: AgentRole, timeout: Duration) -> Self {
        self.role_timeouts.insert(role, timeout);
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_stage_max_attempts(mut self, state: WorkflowState, attempts: u32) -> Self {
        self.stage_max_attempts.insert(state, attempts);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_objectivity_threshold(mut self, threshold: f64) -> Self {
        self.objectivity_threshold = threshold;
        self
    }
}
