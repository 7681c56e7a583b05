//! Message envelope carried by the workflow message bus

use crate::core::correlation::CorrelationId;
use crate::gate::ValidationVerdict;
use crate::report::{AgentReport, AgentRole};
use crate::workflow::{ErrorKind, TransitionRecord, WorkflowState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message topic, always derived from the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Progress,
    Report,
    Verdict,
    Failure,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Progress, Topic::Report, Topic::Verdict, Topic::Failure];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Progress => "progress",
            Topic::Report => "report",
            Topic::Verdict => "verdict",
            Topic::Failure => "failure",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which topics a subscription receives
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TopicFilter {
    #[default]
    All,
    Only(Vec<Topic>),
}

impl TopicFilter {
    pub fn only(topics: impl IntoIterator<Item = Topic>) -> Self {
        TopicFilter::Only(topics.into_iter().collect())
    }

    pub fn matches(&self, topic: Topic) -> bool {
        match self {
            TopicFilter::All => true,
            TopicFilter::Only(topics) => topics.contains(&topic),
        }
    }
}

/// State change announcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressNote {
    pub from: WorkflowState,
    pub to: WorkflowState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<TransitionRecord> for ProgressNote {
    fn from(record: TransitionRecord) -> Self {
        Self {
            from: record.from,
            to: record.to,
            reason: record.reason,
        }
    }
}

/// Failure announcement from an adapter or the state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureNote {
    pub state: WorkflowState,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<AgentRole>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Progress(ProgressNote),
    Report(AgentReport),
    Verdict(ValidationVerdict),
    Failure(FailureNote),
}

impl Payload {
    pub fn topic(&self) -> Topic {
        match self {
            Payload::Progress(_) => Topic::Progress,
            Payload::Report(_) => Topic::Report,
            Payload::Verdict(_) => Topic::Verdict,
            Payload::Failure(_) => Topic::Failure,
        }
    }
}

/// Who published a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    StateMachine,
    Adapter(AgentRole),
}

impl std::fmt::Display for MessageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageSource::StateMachine => write!(f, "state-machine"),
            MessageSource::Adapter(role) => write!(f, "{role}-adapter"),
        }
    }
}

/// A bus message. Every message carries the correlation id of its run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub correlation_id: CorrelationId,
    pub source: MessageSource,
    pub payload: Payload,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(correlation_id: CorrelationId, source: MessageSource, payload: Payload) -> Self {
        Self {
            correlation_id,
            source,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn progress(correlation_id: CorrelationId, note: impl Into<ProgressNote>) -> Self {
        Self::new(
            correlation_id,
            MessageSource::StateMachine,
            Payload::Progress(note.into()),
        )
    }

    /// The report's own correlation id is used for the envelope
    pub fn report(report: AgentReport) -> Self {
        let source = MessageSource::Adapter(report.role());
        Self::new(report.correlation_id(), source, Payload::Report(report))
    }

    pub fn verdict(correlation_id: CorrelationId, verdict: ValidationVerdict) -> Self {
        Self::new(
            correlation_id,
            MessageSource::StateMachine,
            Payload::Verdict(verdict),
        )
    }

    pub fn failure(correlation_id: CorrelationId, source: MessageSource, note: FailureNote) -> Self {
        Self::new(correlation_id, source, Payload::Failure(note))
    }

    pub fn topic(&self) -> Topic {
        self.payload.topic()
    }
}
