//! Progress reporting for workflow runs
//!
//! Both reporters are [`MessageSink`]s: the binary attaches them to a run's
//! bus subscription, so progress is rendered from the same messages every
//! other observer sees.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tribunal_application::MessageSink;
use tribunal_domain::{
    CorrelationId, FailureNote, Message, Payload, ProgressNote, ValidationVerdict, WorkflowState,
};

/// Reports progress during a run with a spinner
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self::with_bar(bar)
    }

    /// Use a caller-provided bar (e.g. [`ProgressBar::hidden`])
    pub fn with_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {prefix:.bold.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Message shown while a run is in `state`
    pub fn stage_message(state: WorkflowState) -> &'static str {
        match state {
            WorkflowState::Idle => "Waiting...",
            WorkflowState::Initializing => "Validating query...",
            WorkflowState::ParallelResearch => "Advocate and adversary researching...",
            WorkflowState::ValidatingReports => "Checking research reports...",
            WorkflowState::JudicialSynthesis => "Judicial synthesis...",
            WorkflowState::ValidatingObjectivity => "Checking objectivity...",
            WorkflowState::Completed => "Analysis complete",
            WorkflowState::Error => "Recovering...",
            WorkflowState::Failed => "Analysis failed",
        }
    }

    /// Current spinner message
    pub fn message(&self) -> String {
        self.bar.message()
    }

    fn on_progress(&self, note: &ProgressNote) {
        self.bar.set_prefix(note.to.display_name());
        match note.to {
            WorkflowState::Completed => self
                .bar
                .finish_with_message(format!("{}", Self::stage_message(note.to).green())),
            WorkflowState::Failed => self
                .bar
                .finish_with_message(format!("{}", Self::stage_message(note.to).red())),
            _ => self.bar.set_message(Self::stage_message(note.to)),
        }
    }

    fn on_failure(&self, note: &FailureNote) {
        let who = note
            .role
            .map(|role| role.display_name().to_string())
            .unwrap_or_else(|| note.state.display_name().to_string());
        self.bar
            .println(format!("  {} {}: {}", "x".red(), who, note.message));
    }

    fn on_verdict(&self, verdict: &ValidationVerdict) {
        if !verdict.passed() {
            self.bar.println(format!(
                "  {} {} gate: {}",
                "!".yellow(),
                verdict.gate(),
                verdict.diagnostics().join("; ")
            ));
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSink for ProgressReporter {
    fn record(&self, message: &Message) {
        match &message.payload {
            Payload::Progress(note) => self.on_progress(note),
            Payload::Report(report) => self.bar.println(format!(
                "  {} {} report ({} citations)",
                "v".green(),
                report.role().display_name(),
                report.citations().len()
            )),
            Payload::Verdict(verdict) => self.on_verdict(verdict),
            Payload::Failure(note) => self.on_failure(note),
        }
    }

    fn finish(&self, _correlation_id: &CorrelationId) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// Simple text-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl MessageSink for SimpleProgress {
    fn record(&self, message: &Message) {
        match &message.payload {
            Payload::Progress(note) => {
                eprintln!(
                    "{} {}",
                    "->".cyan(),
                    ProgressReporter::stage_message(note.to).bold()
                );
            }
            Payload::Report(report) => {
                eprintln!("  {} {} report", "v".green(), report.role().display_name());
            }
            Payload::Verdict(verdict) if !verdict.passed() => {
                eprintln!(
                    "  {} {} gate: {}",
                    "!".yellow(),
                    verdict.gate(),
                    verdict.diagnostics().join("; ")
                );
            }
            Payload::Verdict(_) => {}
            Payload::Failure(note) => {
                eprintln!("  {} {}", "x".red(), note.message);
            }
        }
    }
}
