//! Submit Query use case
//!
//! Drives one legal query through the adversarial workflow:
//!
//! ```text
//! Idle → Initializing → ParallelResearch → ValidatingReports
//!      → JudicialSynthesis → ValidatingObjectivity → Completed
//! ```
//!
//! Any stage failure moves the run to `Error`, which either re-enters the
//! producing stage or, once that stage's attempt budget is spent, ends the
//! run in `Failed`. Input rejection and deadline expiry go straight to
//! `Failed`. Every transition is published on the bus as a progress message.

use crate::adapters::AgentAdapter;
use crate::config::WorkflowOptions;
use crate::ports::legal_agent::{AgentContext, AgentSet};
use crate::ports::message_bus::{BusError, MessageBus};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tribunal_domain::{
    AgentRole, BalanceScorer, CitationBalanceScorer, CitationParser, Diagnostic, DomainError,
    ErrorKind, GateKind, IllegalTransition, InputValidation, LanguageTag, Message,
    ObjectivityValidation, ReportValidation, UserQueryPackage, ValidationVerdict, WorkflowResult,
    WorkflowRun, WorkflowState,
};

const CANCELLED: &str = "run cancelled before reaching a terminal state";

/// Errors that abort `execute` without a workflow result
///
/// Workflow failures are not errors: they come back as
/// [`WorkflowResult::Failed`]. Only the bus can fail a submission; the
/// remaining variants signal a broken internal invariant.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Message bus error: {0}")]
    Bus(#[from] BusError),

    #[error(transparent)]
    Transition(#[from] IllegalTransition),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Use case for running the adversarial workflow on a query
///
/// All per-run state lives in the `execute` call, so one instance can drive
/// any number of runs concurrently.
pub struct SubmitQueryUseCase {
    agents: AgentSet,
    bus: Arc<dyn MessageBus>,
    input_gate: InputValidation,
    report_gate: ReportValidation,
    objectivity_gate: ObjectivityValidation,
    options: WorkflowOptions,
    cancellation: Option<CancellationToken>,
}

impl SubmitQueryUseCase {
    pub fn new(
        agents: AgentSet,
        bus: Arc<dyn MessageBus>,
        parser: Arc<dyn CitationParser>,
        options: WorkflowOptions,
    ) -> Self {
        let objectivity_gate =
            ObjectivityValidation::new(Arc::new(CitationBalanceScorer), options.objectivity_threshold);
        Self {
            agents,
            bus,
            input_gate: InputValidation::new(),
            report_gate: ReportValidation::new(parser),
            objectivity_gate,
            options,
            cancellation: None,
        }
    }

    /// Replace the default balance scorer of Objectivity Validation
    pub fn with_scorer(mut self, scorer: Arc<dyn BalanceScorer>) -> Self {
        self.objectivity_gate =
            ObjectivityValidation::new(scorer, self.options.objectivity_threshold);
        self
    }

    /// Runs observe (a child of) this token in addition to their deadline
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    /// Run `query` to a terminal state.
    ///
    /// Resolves within the configured deadline: when it elapses, in-flight
    /// agent tasks are abandoned and the run fails with a timeout diagnostic.
    pub async fn execute(&self, query: UserQueryPackage) -> Result<WorkflowResult, SubmitError> {
        let correlation_id = query.correlation_id();
        let cancel = match &self.cancellation {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        info!(run = %correlation_id.short(), language = query.language(), "Workflow submitted");
        let mut run = WorkflowRun::new(query);

        let driven = tokio::time::timeout(self.options.deadline, self.drive(&mut run, &cancel)).await;
        let outcome = match driven {
            Ok(outcome) => outcome,
            Err(_) => {
                cancel.cancel();
                let message = format!(
                    "overall deadline of {}s exceeded",
                    self.options.deadline.as_secs_f64()
                );
                self.abandon(&mut run, &message)
            }
        };

        self.bus.close_run(&correlation_id);
        outcome?;

        let result = if run.state() == WorkflowState::Completed {
            WorkflowResult::Completed(run.into_completed()?)
        } else {
            WorkflowResult::Failed(run.into_failure())
        };

        info!(
            run = %correlation_id.short(),
            state = %result.final_state(),
            diagnostics = result.diagnostics().len(),
            "Workflow finished"
        );
        Ok(result)
    }

    /// Step the run until it reaches a terminal state
    async fn drive(
        &self,
        run: &mut WorkflowRun,
        cancel: &CancellationToken,
    ) -> Result<(), SubmitError> {
        self.transition(run, WorkflowState::Initializing, Some("query submitted"))?;

        loop {
            if run.state().is_terminal() {
                return Ok(());
            }
            if cancel.is_cancelled() {
                return self.abandon(run, CANCELLED);
            }

            match run.state() {
                WorkflowState::Initializing => self.initialize(run)?,
                WorkflowState::ParallelResearch => self.research(run, cancel).await?,
                WorkflowState::ValidatingReports => self.validate_reports(run)?,
                WorkflowState::JudicialSynthesis => self.synthesize(run, cancel).await?,
                WorkflowState::ValidatingObjectivity => self.validate_objectivity(run)?,
                WorkflowState::Error => self.recover(run)?,
                WorkflowState::Idle | WorkflowState::Completed | WorkflowState::Failed => {
                    return Ok(());
                }
            }
        }
    }

    // ==================== Stages ====================

    /// Initializing: Input Validation. Rejection is terminal.
    fn initialize(&self, run: &mut WorkflowRun) -> Result<(), SubmitError> {
        let verdict = self.input_gate.verify(run.query());
        self.publish_verdict(run, &verdict)?;

        if verdict.passed() {
            return self.transition(run, WorkflowState::ParallelResearch, Some("input accepted"));
        }

        warn!(
            run = %run.correlation_id().short(),
            "Input rejected: {}",
            verdict.diagnostics().join("; ")
        );
        run.record(Diagnostic::input(verdict.into_diagnostics()));
        self.transition(run, WorkflowState::Failed, Some("input rejected"))
    }

    /// ParallelResearch: fork/join over the research roles still missing a report
    async fn research(
        &self,
        run: &mut WorkflowRun,
        cancel: &CancellationToken,
    ) -> Result<(), SubmitError> {
        let roles = run.missing_research_roles();
        info!(
            run = %run.correlation_id().short(),
            "Research: invoking {} agent(s)",
            roles.len()
        );

        let mut join_set = JoinSet::new();
        for role in roles {
            let adapter = self.adapter(role);
            let context = AgentContext::research(run.query().clone());
            let cancel = cancel.clone();

            join_set.spawn(async move {
                let outcome = adapter
                    .invoke(WorkflowState::ParallelResearch, context, &cancel)
                    .await;
                (role, outcome)
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((role, outcome)) => match outcome? {
                    Ok(report) => {
                        debug!(role = %role, "Research report pending validation");
                        run.set_pending(report)?;
                    }
                    Err(failure) => failures.push(Diagnostic::agent(
                        WorkflowState::ParallelResearch,
                        role,
                        failure.to_string(),
                    )),
                },
                Err(e) => {
                    warn!("Research task join error: {}", e);
                    failures.push(Diagnostic::new(
                        WorkflowState::ParallelResearch,
                        ErrorKind::AgentFailure,
                        vec![format!("research task failed: {e}")],
                    ));
                }
            }
        }

        // Cancelled adapters are not agent failures
        if cancel.is_cancelled() {
            return self.abandon(run, CANCELLED);
        }
        if failures.is_empty() {
            return self.transition(
                run,
                WorkflowState::ValidatingReports,
                Some("research reports received"),
            );
        }
        failures.sort_by_key(|d| d.role);
        self.fail_stage(run, failures, "research agent failed")
    }

    /// ValidatingReports: Report Validation of every pending research report
    fn validate_reports(&self, run: &mut WorkflowRun) -> Result<(), SubmitError> {
        // Input Validation has already guaranteed a supported tag
        let language = run.query().language_tag().unwrap_or(LanguageTag::De);
        let mut failures = Vec::new();

        for role in AgentRole::RESEARCH {
            let Some(report) = run.take_pending(role) else {
                continue;
            };
            let verdict = self.report_gate.verify(&report, role, language);
            self.publish_verdict(run, &verdict)?;

            if verdict.passed() {
                for note in verdict.notes() {
                    run.note(format!("{role} report: {note}"));
                }
                run.accept(report)?;
            } else {
                failures.push(
                    Diagnostic::validation(
                        WorkflowState::ValidatingReports,
                        GateKind::Report,
                        verdict.into_diagnostics(),
                    )
                    .with_role(role),
                );
            }
        }

        if failures.is_empty() {
            return self.transition(
                run,
                WorkflowState::JudicialSynthesis,
                Some("research reports accepted"),
            );
        }
        self.fail_stage(run, failures, "research report rejected")
    }

    /// JudicialSynthesis: the Judicial agent weighs both accepted reports
    async fn synthesize(
        &self,
        run: &mut WorkflowRun,
        cancel: &CancellationToken,
    ) -> Result<(), SubmitError> {
        let context = AgentContext::Synthesis {
            query: run.query().clone(),
            advocate: accepted(run, AgentRole::Advocate)?.clone(),
            adversary: accepted(run, AgentRole::Adversary)?.clone(),
        };

        info!(run = %run.correlation_id().short(), "Judicial synthesis");
        let outcome = self
            .adapter(AgentRole::Judicial)
            .invoke(WorkflowState::JudicialSynthesis, context, cancel)
            .await?;
        if cancel.is_cancelled() {
            return self.abandon(run, CANCELLED);
        }

        match outcome {
            Ok(report) => {
                run.set_pending(report)?;
                self.transition(
                    run,
                    WorkflowState::ValidatingObjectivity,
                    Some("judicial report received"),
                )
            }
            Err(failure) => {
                let diagnostic = Diagnostic::agent(
                    WorkflowState::JudicialSynthesis,
                    AgentRole::Judicial,
                    failure.to_string(),
                );
                self.fail_stage(run, vec![diagnostic], "judicial agent failed")
            }
        }
    }

    /// ValidatingObjectivity: Objectivity Validation of the judicial report
    fn validate_objectivity(&self, run: &mut WorkflowRun) -> Result<(), SubmitError> {
        let judicial = run
            .take_pending(AgentRole::Judicial)
            .ok_or(DomainError::MissingReport(AgentRole::Judicial))?;
        let verdict = self.objectivity_gate.verify(
            &judicial,
            accepted(run, AgentRole::Advocate)?,
            accepted(run, AgentRole::Adversary)?,
        );
        self.publish_verdict(run, &verdict)?;

        if verdict.passed() {
            run.accept(judicial)?;
            return self.transition(run, WorkflowState::Completed, Some("judicial report accepted"));
        }

        let diagnostic = Diagnostic::validation(
            WorkflowState::ValidatingObjectivity,
            GateKind::Objectivity,
            verdict.into_diagnostics(),
        )
        .with_role(AgentRole::Judicial);
        self.fail_stage(run, vec![diagnostic], "judicial report rejected")
    }

    /// Error: retry the failed stage or give up
    fn recover(&self, run: &mut WorkflowRun) -> Result<(), SubmitError> {
        let Some(stage) = run.failed_stage() else {
            return self.transition(run, WorkflowState::Failed, Some("no failed stage recorded"));
        };
        let attempts = run.failures(stage);
        let budget = self.options.max_attempts_for(stage);

        match stage.retry_target() {
            Some(target) if attempts < budget => {
                info!(
                    run = %run.correlation_id().short(),
                    "Retrying {} after {} failure(s) ({}/{})",
                    target,
                    stage,
                    attempts + 1,
                    budget
                );
                let reason = format!("retry after {stage} failure ({}/{budget})", attempts + 1);
                self.transition(run, target, Some(&reason))
            }
            _ => {
                warn!(
                    run = %run.correlation_id().short(),
                    "{} failed {} time(s); giving up",
                    stage,
                    attempts
                );
                let reason = format!("{stage} failed {attempts} time(s); attempt budget exhausted");
                self.transition(run, WorkflowState::Failed, Some(&reason))
            }
        }
    }

    // ==================== Helpers ====================

    fn adapter(&self, role: AgentRole) -> AgentAdapter {
        AgentAdapter::new(
            role,
            Arc::clone(self.agents.get(role)),
            Arc::clone(&self.bus),
            self.options.timeout_for(role),
        )
    }

    fn transition(
        &self,
        run: &mut WorkflowRun,
        to: WorkflowState,
        reason: Option<&str>,
    ) -> Result<(), SubmitError> {
        let record = run.transition(to, reason)?;
        let id = run.correlation_id();

        match to {
            WorkflowState::Error | WorkflowState::Failed => {
                warn!(run = %id.short(), "{} → {}", record.from, record.to)
            }
            _ => info!(run = %id.short(), "{} → {}", record.from, record.to),
        }

        self.bus.publish(Message::progress(id, record))?;
        Ok(())
    }

    fn publish_verdict(
        &self,
        run: &WorkflowRun,
        verdict: &ValidationVerdict,
    ) -> Result<(), SubmitError> {
        debug!(
            gate = %verdict.gate(),
            passed = verdict.passed(),
            "Gate verdict"
        );
        self.bus
            .publish(Message::verdict(run.correlation_id(), verdict.clone()))?;
        Ok(())
    }

    /// Record one failed attempt of the current stage and enter `Error`
    fn fail_stage(
        &self,
        run: &mut WorkflowRun,
        diagnostics: Vec<Diagnostic>,
        reason: &str,
    ) -> Result<(), SubmitError> {
        for diagnostic in &diagnostics {
            warn!(run = %run.correlation_id().short(), "{}", diagnostic.summary());
        }
        let attempt = run.fail_stage(diagnostics);
        let reason = format!("{reason} (attempt {attempt})");
        self.transition(run, WorkflowState::Error, Some(&reason))
    }

    /// Terminate a run that ran out of time or was cancelled
    fn abandon(&self, run: &mut WorkflowRun, message: &str) -> Result<(), SubmitError> {
        if run.state().is_terminal() {
            return Ok(());
        }
        warn!(run = %run.correlation_id().short(), "Abandoning run in {}: {}", run.state(), message);
        run.record(Diagnostic::timeout(run.state(), message));
        self.transition(run, WorkflowState::Failed, Some(message))
    }
}

fn accepted(
    run: &WorkflowRun,
    role: AgentRole,
) -> Result<&tribunal_domain::AgentReport, DomainError> {
    run.accepted(role).ok_or(DomainError::MissingReport(role))
}
