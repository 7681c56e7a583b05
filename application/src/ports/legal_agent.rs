//! Legal agent port
//!
//! Defines the capability the state machine needs from an analysis agent.
//! The state machine never knows how an agent reasons; it only hands over a
//! context and receives a report.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tribunal_domain::{AgentReport, AgentRole, UserQueryPackage};

/// Errors that an agent implementation can report
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent unavailable: {0}")]
    Unavailable(String),

    #[error("Invocation failed: {0}")]
    InvocationFailed(String),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(String),
}

/// Input handed to an agent
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentContext {
    /// Advocate and Adversary research the query on their own
    Research { query: UserQueryPackage },
    /// The Judicial agent weighs both accepted research reports
    Synthesis {
        query: UserQueryPackage,
        advocate: AgentReport,
        adversary: AgentReport,
    },
}

impl AgentContext {
    pub fn research(query: UserQueryPackage) -> Self {
        AgentContext::Research { query }
    }

    pub fn query(&self) -> &UserQueryPackage {
        match self {
            AgentContext::Research { query } | AgentContext::Synthesis { query, .. } => query,
        }
    }
}

/// An analysis agent
///
/// Implementations should observe `cancel` and return
/// [`AgentError::Cancelled`] promptly once it fires; the adapter aborts the
/// invocation task regardless.
#[async_trait]
pub trait LegalAgent: Send + Sync {
    /// Produce a report for `role` with the given context
    async fn invoke(
        &self,
        role: AgentRole,
        context: AgentContext,
        cancel: CancellationToken,
    ) -> Result<AgentReport, AgentError>;
}

/// One agent per role
#[derive(Clone)]
pub struct AgentSet {
    pub advocate: Arc<dyn LegalAgent>,
    pub adversary: Arc<dyn LegalAgent>,
    pub judicial: Arc<dyn LegalAgent>,
}

impl AgentSet {
    pub fn new(
        advocate: Arc<dyn LegalAgent>,
        adversary: Arc<dyn LegalAgent>,
        judicial: Arc<dyn LegalAgent>,
    ) -> Self {
        Self {
            advocate,
            adversary,
            judicial,
        }
    }

    /// Use one agent implementation for all three roles
    pub fn uniform(agent: Arc<dyn LegalAgent>) -> Self {
        Self::new(Arc::clone(&agent), Arc::clone(&agent), agent)
    }

    pub fn get(&self, role: AgentRole) -> &Arc<dyn LegalAgent> {
        match role {
            AgentRole::Advocate => &self.advocate,
            AgentRole::Adversary => &self.adversary,
            AgentRole::Judicial => &self.judicial,
        }
    }
}

impl std::fmt::Debug for AgentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSet").finish_non_exhaustive()
    }
}
