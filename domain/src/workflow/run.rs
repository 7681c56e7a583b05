//! Workflow run aggregate

use super::diagnostic::Diagnostic;
use super::result::{CompletedRun, RunSummary, WorkflowFailure};
use super::state::{IllegalTransition, TransitionRecord, WorkflowState, is_legal_transition};
use crate::core::correlation::CorrelationId;
use crate::core::error::DomainError;
use crate::core::query::UserQueryPackage;
use crate::report::{AgentReport, AgentRole};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// The aggregate owned by the state machine for one query lifecycle (Entity)
///
/// Reports move through two slots. A freshly produced report is *pending*
/// until its gate accepts it; a rejected pending report is simply dropped so
/// the producing stage can run again. An *accepted* report is set once per
/// role and never replaced.
///
/// Failure counters are kept per failing state, so a research failure never
/// consumes the objectivity stage's retry budget.
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    query: UserQueryPackage,
    state: WorkflowState,
    pending: BTreeMap<AgentRole, AgentReport>,
    accepted: BTreeMap<AgentRole, AgentReport>,
    diagnostics: Vec<Diagnostic>,
    notes: Vec<String>,
    failures: BTreeMap<WorkflowState, u32>,
    failed_stage: Option<WorkflowState>,
    transitions: Vec<TransitionRecord>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    pub fn new(query: UserQueryPackage) -> Self {
        Self {
            query,
            state: WorkflowState::Idle,
            pending: BTreeMap::new(),
            accepted: BTreeMap::new(),
            diagnostics: Vec::new(),
            notes: Vec::new(),
            failures: BTreeMap::new(),
            failed_stage: None,
            transitions: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    // ==================== Accessors ====================

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn query(&self) -> &UserQueryPackage {
        &self.query
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.query.correlation_id()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// How many times `state` has failed so far
    pub fn failures(&self, state: WorkflowState) -> u32 {
        self.failures.get(&state).copied().unwrap_or(0)
    }

    /// The stage whose failure led into `Error`
    pub fn failed_stage(&self) -> Option<WorkflowState> {
        self.failed_stage
    }

    pub fn accepted(&self, role: AgentRole) -> Option<&AgentReport> {
        self.accepted.get(&role)
    }

    pub fn pending(&self, role: AgentRole) -> Option<&AgentReport> {
        self.pending.get(&role)
    }

    /// Research roles that have neither an accepted nor a pending report
    pub fn missing_research_roles(&self) -> Vec<AgentRole> {
        AgentRole::RESEARCH
            .into_iter()
            .filter(|role| !self.accepted.contains_key(role) && !self.pending.contains_key(role))
            .collect()
    }

    /// Number of times `state` has been entered
    pub fn entries(&self, state: WorkflowState) -> usize {
        self.transitions.iter().filter(|t| t.to == state).count()
    }

    // ==================== State transitions ====================

    /// Move to `to` if the transition graph allows it, recording the edge
    pub fn transition(
        &mut self,
        to: WorkflowState,
        reason: Option<&str>,
    ) -> Result<TransitionRecord, IllegalTransition> {
        if !is_legal_transition(self.state, to) {
            return Err(IllegalTransition {
                from: self.state,
                to,
            });
        }

        let record = TransitionRecord {
            from: self.state,
            to,
            at: Utc::now(),
            reason: reason.map(str::to_string),
        };

        self.state = to;
        if to.is_terminal() {
            self.finished_at = Some(record.at);
        }
        self.transitions.push(record.clone());
        Ok(record)
    }

    // ==================== Reports ====================

    /// Hold a freshly produced report until its gate has run
    pub fn set_pending(&mut self, report: AgentReport) -> Result<(), DomainError> {
        let role = report.role();
        if self.accepted.contains_key(&role) {
            return Err(DomainError::ReportAlreadySet(role));
        }
        self.pending.insert(role, report);
        Ok(())
    }

    pub fn take_pending(&mut self, role: AgentRole) -> Option<AgentReport> {
        self.pending.remove(&role)
    }

    /// Accept a validated report; each role can be accepted only once
    pub fn accept(&mut self, report: AgentReport) -> Result<(), DomainError> {
        let role = report.role();
        if self.accepted.contains_key(&role) {
            return Err(DomainError::ReportAlreadySet(role));
        }
        self.accepted.insert(role, report);
        Ok(())
    }

    // ==================== Diagnostics ====================

    /// Record one failed attempt of the current stage.
    ///
    /// All diagnostics share the attempt number; the stage's failure counter
    /// is incremented once. Returns the attempt number.
    pub fn fail_stage(&mut self, diagnostics: Vec<Diagnostic>) -> u32 {
        let stage = self.state;
        let attempt = self.failures(stage) + 1;
        self.failures.insert(stage, attempt);
        self.failed_stage = Some(stage);

        for mut diagnostic in diagnostics {
            diagnostic.attempt = attempt;
            self.diagnostics.push(diagnostic);
        }
        attempt
    }

    /// Record a diagnostic that does not count against a retry budget
    /// (input rejection, deadline expiry)
    pub fn record(&mut self, mut diagnostic: Diagnostic) {
        diagnostic.attempt = self.failures(diagnostic.state) + 1;
        self.diagnostics.push(diagnostic);
    }

    /// Record a non-fatal observation; it does not affect the run's outcome
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    // ==================== Archiving ====================

    fn summary(&self) -> RunSummary {
        RunSummary {
            correlation_id: self.correlation_id(),
            question: self.query.question().to_string(),
            language: self.query.language().to_string(),
            final_state: self.state,
            transitions: self.transitions.clone(),
            diagnostics: self.diagnostics.clone(),
            notes: self.notes.clone(),
            failures: self.failures.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at.unwrap_or_else(Utc::now),
        }
    }

    /// Archive a completed run
    pub fn into_completed(mut self) -> Result<CompletedRun, DomainError> {
        if self.state != WorkflowState::Completed {
            return Err(DomainError::RunFinished);
        }
        let summary = self.summary();
        let mut take = |role: AgentRole| {
            self.accepted
                .remove(&role)
                .ok_or(DomainError::MissingReport(role))
        };

        Ok(CompletedRun {
            advocate: take(AgentRole::Advocate)?,
            adversary: take(AgentRole::Adversary)?,
            judicial: take(AgentRole::Judicial)?,
            summary,
        })
    }

    /// Archive a failed run.
    ///
    /// `failed_in` is the stage that exhausted its budget when the run went
    /// through `Error`, otherwise the state it left for `Failed`.
    pub fn into_failure(self) -> WorkflowFailure {
        let failed_in = match self.transitions.last() {
            Some(t) if t.to == WorkflowState::Failed && t.from == WorkflowState::Error => {
                self.failed_stage.unwrap_or(WorkflowState::Error)
            }
            Some(t) if t.to == WorkflowState::Failed => t.from,
            _ => self.state,
        };

        WorkflowFailure {
            failed_in,
            summary: self.summary(),
        }
    }
}
