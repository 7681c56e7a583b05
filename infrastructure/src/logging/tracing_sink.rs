//! Re-emits bus messages as `tracing` events.

use tracing::{debug, info, warn};
use tribunal_application::MessageSink;
use tribunal_domain::{Message, Payload};

/// Message sink that logs through the global tracing subscriber.
///
/// State changes are logged at `info`, reports and passing verdicts at
/// `debug`, failures and rejecting verdicts at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl MessageSink for TracingSink {
    fn record(&self, message: &Message) {
        let run = message.correlation_id.short();
        match &message.payload {
            Payload::Progress(note) => match &note.reason {
                Some(reason) => info!(run = %run, "{} -> {} ({})", note.from, note.to, reason),
                None => info!(run = %run, "{} -> {}", note.from, note.to),
            },
            Payload::Report(report) => debug!(
                run = %run,
                role = %report.role(),
                citations = report.citations().len(),
                "Report received"
            ),
            Payload::Verdict(verdict) if verdict.passed() => {
                debug!(run = %run, gate = %verdict.gate(), "Gate passed")
            }
            Payload::Verdict(verdict) => warn!(
                run = %run,
                gate = %verdict.gate(),
                "Gate rejected: {}",
                verdict.diagnostics().join("; ")
            ),
            Payload::Failure(note) => warn!(
                run = %run,
                source = %message.source,
                state = %note.state,
                kind = %note.kind,
                "{}",
                note.message
            ),
        }
    }
}
