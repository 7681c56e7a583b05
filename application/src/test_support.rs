//! Test doubles shared by the application layer's unit tests

use crate::ports::legal_agent::{AgentContext, AgentError, LegalAgent};
use crate::ports::message_bus::{BusError, MessageBus, MessageStream};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tribunal_domain::{
    AgentReport, AgentRole, CitationKind, CitationParseError, CitationParser, CorrelationId,
    LanguageTag, Message, StructuredCitation, TopicFilter,
};

// ==================== Bus ====================

/// Bus that records everything published to it
#[derive(Default)]
pub(crate) struct RecordingBus {
    messages: Mutex<Vec<Message>>,
    closed: Mutex<Vec<CorrelationId>>,
    reject: bool,
}

impl RecordingBus {
    /// A bus whose `publish` always fails
    pub(crate) fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub(crate) fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub(crate) fn closed(&self) -> Vec<CorrelationId> {
        self.closed.lock().unwrap().clone()
    }
}

impl MessageBus for RecordingBus {
    fn publish(&self, message: Message) -> Result<(), BusError> {
        if self.reject {
            return Err(BusError::Shutdown);
        }
        self.messages.lock().unwrap().push(message);
        Ok(())
    }

    fn subscribe(&self, _filter: TopicFilter, _id: &CorrelationId) -> MessageStream {
        Box::pin(futures::stream::empty())
    }

    fn close_run(&self, correlation_id: &CorrelationId) {
        self.closed.lock().unwrap().push(*correlation_id);
    }

    fn shutdown(&self) {}
}

// ==================== Agents ====================

/// What a scripted agent does on one invocation
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Return a report with these citations
    Report(Vec<&'static str>),
    /// Sleep, then return a report with these citations
    Delayed(Duration, Vec<&'static str>),
    /// Return an invocation error
    Fail(&'static str),
    /// Never return
    Hang,
}

/// Agent that replays a script, then repeats a fallback step
pub(crate) struct ScriptedAgent {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
}

impl ScriptedAgent {
    pub(crate) fn new(fallback: Step) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    /// Citing the given references on every call
    pub(crate) fn citing(citations: Vec<&'static str>) -> Self {
        Self::new(Step::Report(citations))
    }

    pub(crate) fn then(self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script.lock().unwrap().extend(steps);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

fn report(role: AgentRole, context: &AgentContext, citations: Vec<&'static str>) -> AgentReport {
    AgentReport::new(
        role,
        context.query().correlation_id(),
        format!("{} position", role.display_name()),
        citations.into_iter().map(str::to_string).collect(),
    )
    .unwrap()
}

#[async_trait]
impl LegalAgent for ScriptedAgent {
    async fn invoke(
        &self,
        role: AgentRole,
        context: AgentContext,
        _cancel: CancellationToken,
    ) -> Result<AgentReport, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Report(citations) => Ok(report(role, &context, citations)),
            Step::Delayed(delay, citations) => {
                tokio::time::sleep(delay).await;
                Ok(report(role, &context, citations))
            }
            Step::Fail(reason) => Err(AgentError::InvocationFailed(reason.to_string())),
            Step::Hang => std::future::pending().await,
        }
    }
}

// ==================== Citation parser ====================

/// Accepts anything starting with `Art.` or `BGE`
pub(crate) struct PrefixParser;

impl CitationParser for PrefixParser {
    fn parse(
        &self,
        citation: &str,
        _language: LanguageTag,
    ) -> Result<StructuredCitation, CitationParseError> {
        let kind = if citation.starts_with("Art.") {
            CitationKind::Statute
        } else if citation.starts_with("BGE") {
            CitationKind::CourtDecision
        } else {
            return Err(CitationParseError::Unrecognized(citation.to_string()));
        };
        Ok(StructuredCitation {
            kind,
            reference: citation.to_string(),
            article: None,
            paragraph: None,
            code: None,
        })
    }
}
