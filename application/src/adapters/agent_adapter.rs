//! Agent adapter
//!
//! Every agent call made by the state machine goes through an
//! [`AgentAdapter`]. The adapter runs the call on its own task, bounds it by
//! the role's timeout, observes the run's cancellation token, and turns
//! every way the call can go wrong into an [`AgentFailure`]. It publishes
//! exactly one message per invocation: the report, or a failure note.

use crate::ports::legal_agent::{AgentContext, AgentError, LegalAgent};
use crate::ports::message_bus::{BusError, MessageBus};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tribunal_domain::{
    AgentReport, AgentRole, ErrorKind, FailureNote, Message, MessageSource, WorkflowState,
};

/// Why an invocation produced no usable report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentFailure {
    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("agent failed: {0}")]
    Failed(String),

    #[error("malformed report: {0}")]
    Malformed(String),

    #[error("agent task panicked")]
    Panicked,
}

/// One role's gateway to its agent
pub struct AgentAdapter {
    role: AgentRole,
    agent: Arc<dyn LegalAgent>,
    bus: Arc<dyn MessageBus>,
    timeout: Duration,
}

impl AgentAdapter {
    pub fn new(
        role: AgentRole,
        agent: Arc<dyn LegalAgent>,
        bus: Arc<dyn MessageBus>,
        timeout: Duration,
    ) -> Self {
        Self {
            role,
            agent,
            bus,
            timeout,
        }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invoke the agent once.
    ///
    /// The outer `Result` only fails when the bus rejects the outcome
    /// message. Dropping the returned future aborts the agent task.
    pub async fn invoke(
        &self,
        state: WorkflowState,
        context: AgentContext,
        cancel: &CancellationToken,
    ) -> Result<Result<AgentReport, AgentFailure>, BusError> {
        let correlation_id = context.query().correlation_id();
        info!(role = %self.role, run = %correlation_id.short(), "Invoking agent");

        let outcome = self.run(context, cancel).await;
        let outcome = outcome.and_then(|report| {
            if report.role() != self.role {
                return Err(AgentFailure::Malformed(format!(
                    "report role '{}' does not match adapter role '{}'",
                    report.role(),
                    self.role
                )));
            }
            if report.correlation_id() != correlation_id {
                return Err(AgentFailure::Malformed(format!(
                    "report correlation id {} does not match run {}",
                    report.correlation_id(),
                    correlation_id
                )));
            }
            report
                .check_invariants()
                .map_err(|e| AgentFailure::Malformed(e.to_string()))?;
            Ok(report)
        });

        let message = match &outcome {
            Ok(report) => {
                debug!(role = %self.role, citations = report.citations().len(), "Agent report received");
                Message::report(report.clone())
            }
            Err(failure) => {
                warn!(role = %self.role, run = %correlation_id.short(), "Agent failed: {}", failure);
                Message::failure(
                    correlation_id,
                    MessageSource::Adapter(self.role),
                    FailureNote {
                        state,
                        kind: ErrorKind::AgentFailure,
                        role: Some(self.role),
                        message: failure.to_string(),
                    },
                )
            }
        };
        self.bus.publish(message)?;

        Ok(outcome)
    }

    async fn run(
        &self,
        context: AgentContext,
        cancel: &CancellationToken,
    ) -> Result<AgentReport, AgentFailure> {
        // The JoinSet owns the task: dropping this future aborts it.
        let mut task = JoinSet::new();
        let agent = Arc::clone(&self.agent);
        let role = self.role;
        let agent_cancel = cancel.child_token();
        let token = agent_cancel.clone();
        task.spawn(async move { agent.invoke(role, context, token).await });

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentFailure::Cancelled),
            joined = tokio::time::timeout(self.timeout, task.join_next()) => match joined {
                Err(_) => Err(AgentFailure::Timeout(self.timeout)),
                Ok(None) => Err(AgentFailure::Failed("agent task was not started".into())),
                Ok(Some(Err(e))) if e.is_panic() => Err(AgentFailure::Panicked),
                Ok(Some(Err(_))) => Err(AgentFailure::Cancelled),
                Ok(Some(Ok(Err(AgentError::Cancelled)))) => Err(AgentFailure::Cancelled),
                Ok(Some(Ok(Err(AgentError::MalformedOutput(detail))))) => {
                    Err(AgentFailure::Malformed(detail))
                }
                Ok(Some(Ok(Err(e)))) => Err(AgentFailure::Failed(e.to_string())),
                Ok(Some(Ok(Ok(report)))) => Ok(report),
            },
        };

        agent_cancel.cancel();
        task.abort_all();
        outcome
    }
}

impl std::fmt::Debug for AgentAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentAdapter")
            .field("role", &self.role)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::message_bus::MessageStream;
    use crate::test_support::RecordingBus;
    use async_trait::async_trait;
    use tribunal_domain::{CorrelationId, Payload, TopicFilter, UserQueryPackage};

    // ==================== Mock Agents ====================

    enum Behavior {
        Succeed,
        Fail,
        Hang,
        Panic,
        ForeignCorrelation,
        WrongRole,
    }

    struct MockAgent {
        behavior: Behavior,
    }

    #[async_trait]
    impl LegalAgent for MockAgent {
        async fn invoke(
            &self,
            role: AgentRole,
            context: AgentContext,
            _cancel: CancellationToken,
        ) -> Result<AgentReport, AgentError> {
            let id = context.query().correlation_id();
            match self.behavior {
                Behavior::Succeed => Ok(AgentReport::new(
                    role,
                    id,
                    "Position",
                    vec!["Art. 20 OR".into()],
                )
                .unwrap()),
                Behavior::Fail => Err(AgentError::InvocationFailed("backend down".into())),
                Behavior::Hang => std::future::pending().await,
                Behavior::Panic => panic!("agent bug"),
                Behavior::WrongRole => Ok(AgentReport::new(
                    AgentRole::Judicial,
                    id,
                    "Position",
                    vec!["Art. 20 OR".into()],
                )
                .unwrap()),
                Behavior::ForeignCorrelation => Ok(AgentReport::new(
                    role,
                    CorrelationId::new(),
                    "Position",
                    vec!["Art. 20 OR".into()],
                )
                .unwrap()),
            }
        }
    }

    fn adapter(behavior: Behavior, bus: Arc<RecordingBus>) -> AgentAdapter {
        AgentAdapter::new(
            AgentRole::Advocate,
            Arc::new(MockAgent { behavior }),
            bus,
            Duration::from_secs(5),
        )
    }

    fn context() -> AgentContext {
        AgentContext::research(UserQueryPackage::new("Ist der Vertrag nichtig?", "DE"))
    }

    async fn invoke(behavior: Behavior) -> (Result<AgentReport, AgentFailure>, Vec<Message>) {
        let bus = Arc::new(RecordingBus::default());
        let adapter = adapter(behavior, Arc::clone(&bus));
        let outcome = adapter
            .invoke(
                WorkflowState::ParallelResearch,
                context(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        let messages = bus.messages();
        (outcome, messages)
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_success_publishes_report() {
        let (outcome, messages) = invoke(Behavior::Succeed).await;
        assert!(outcome.is_ok());
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0].payload, Payload::Report(_)));
        assert_eq!(messages[0].source, MessageSource::Adapter(AgentRole::Advocate));
    }

    #[tokio::test]
    async fn test_error_becomes_failure_note() {
        let (outcome, messages) = invoke(Behavior::Fail).await;
        assert_eq!(
            outcome.unwrap_err(),
            AgentFailure::Failed("Invocation failed: backend down".into())
        );
        assert_eq!(messages.len(), 1);
        match &messages[0].payload {
            Payload::Failure(note) => {
                assert_eq!(note.role, Some(AgentRole::Advocate));
                assert_eq!(note.state, WorkflowState::ParallelResearch);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let (outcome, messages) = invoke(Behavior::Hang).await;
        assert_eq!(outcome.unwrap_err(), AgentFailure::Timeout(Duration::from_secs(5)));
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let (outcome, _) = invoke(Behavior::Panic).await;
        assert_eq!(outcome.unwrap_err(), AgentFailure::Panicked);
    }

    #[tokio::test]
    async fn test_foreign_correlation_is_malformed() {
        let (outcome, messages) = invoke(Behavior::ForeignCorrelation).await;
        assert!(matches!(outcome, Err(AgentFailure::Malformed(_))));
        assert!(matches!(messages[0].payload, Payload::Failure(_)));
    }

    #[tokio::test]
    async fn test_wrong_role_is_malformed() {
        let (outcome, _) = invoke(Behavior::WrongRole).await;
        assert_eq!(
            outcome.unwrap_err(),
            AgentFailure::Malformed(
                "report role 'judicial' does not match adapter role 'advocate'".into()
            )
        );
    }

    #[tokio::test]
    async fn test_cancellation() {
        let bus = Arc::new(RecordingBus::default());
        let adapter = adapter(Behavior::Hang, Arc::clone(&bus));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = adapter
            .invoke(WorkflowState::ParallelResearch, context(), &cancel)
            .await
            .unwrap();
        assert_eq!(outcome.unwrap_err(), AgentFailure::Cancelled);
        assert_eq!(bus.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_bus_error_propagates() {
        struct ClosedBus;
        impl MessageBus for ClosedBus {
            fn publish(&self, _message: Message) -> Result<(), BusError> {
                Err(BusError::Shutdown)
            }
            fn subscribe(&self, _filter: TopicFilter, _id: &CorrelationId) -> MessageStream {
                Box::pin(futures::stream::empty())
            }
            fn close_run(&self, _id: &CorrelationId) {}
            fn shutdown(&self) {}
        }

        let adapter = AgentAdapter::new(
            AgentRole::Judicial,
            Arc::new(MockAgent {
                behavior: Behavior::Succeed,
            }),
            Arc::new(ClosedBus),
            Duration::from_secs(5),
        );
        let result = adapter
            .invoke(
                WorkflowState::JudicialSynthesis,
                context(),
                &CancellationToken::new(),
            )
            .await;
        assert_eq!(result.unwrap_err(), BusError::Shutdown);
    }
}
