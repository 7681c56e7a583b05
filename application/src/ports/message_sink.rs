//! Port for message journaling.
//!
//! A [`MessageSink`] records bus messages somewhere outside the process
//! (a JSONL file, the tracing subscriber). Sinks are attached per run with
//! [`attach_sink`], which drains a dedicated subscription on its own task,
//! so a slow sink never holds up the bus.

use crate::ports::message_bus::MessageBus;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;
use tribunal_domain::{CorrelationId, Message, TopicFilter};

/// Records bus messages.
///
/// `record` is intentionally synchronous and non-fallible: journaling
/// failures must not disrupt the workflow.
pub trait MessageSink: Send + Sync {
    fn record(&self, message: &Message);

    /// Called once the run's subscription has ended
    fn finish(&self, _correlation_id: &CorrelationId) {}
}

/// No-op implementation for tests and when journaling is disabled.
pub struct NoMessageSink;

impl MessageSink for NoMessageSink {
    fn record(&self, _message: &Message) {}
}

/// Subscribe `sink` to every message of one run.
///
/// The subscription is registered before this function returns, so no
/// message published afterwards is missed. The returned task ends when the
/// run is closed.
pub fn attach_sink(
    bus: &dyn MessageBus,
    sink: Arc<dyn MessageSink>,
    correlation_id: CorrelationId,
) -> JoinHandle<()> {
    let mut stream = bus.subscribe(TopicFilter::All, &correlation_id);
    tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            sink.record(&message);
        }
        sink.finish(&correlation_id);
    })
}

/// Wait for attached sinks to drain.
///
/// A sink task that panicked is logged and skipped; returns how many failed.
pub async fn join_sinks(handles: Vec<JoinHandle<()>>) -> usize {
    let mut failed = 0;
    for handle in handles {
        if let Err(e) = handle.await {
            warn!("Message sink task failed: {}", e);
            failed += 1;
        }
    }
    failed
}
