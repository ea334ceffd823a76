//! Analysis runner
//!
//! Executes the fixed step sequence acquire-tree -> prepare-artifact ->
//! invoke-tool. The runner only accepts a [`Clearance`], which only the gate
//! can produce, so there is no code path that reaches a step without an
//! affirmative, successful gate.
//!
//! Steps run strictly one after another. The first failing step fails the
//! runner and no later step is started. Nothing is retried.

pub mod plan;
pub mod process;

use crate::error::{RunnerError, StepError};
use crate::gate::Clearance;
use crate::journal::{redact, Journal};
use crate::state_machine::JobTracker;
use crate::types::{Credential, JobKind, JobState, StepKind};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub use plan::{CommandSpec, RunPlan, StepPlan};
pub use process::ProcessExecutor;

/// Step executor trait
///
/// Implement this trait to define how a step's commands are carried out.
/// `credential` is `Some` only for steps that need it.
#[async_trait::async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute_step(
        &self,
        step: &StepPlan,
        credential: Option<&Credential>,
    ) -> Result<(), StepError>;
}

/// Timing of one completed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub kind: StepKind,
    pub state: JobState,
    pub duration_ms: u64,
}

/// Result of a successful runner invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunnerReport {
    pub steps: Vec<StepRecord>,
    pub duration_ms: u64,
}

/// The analysis job
pub struct AnalysisRunner {
    plan: RunPlan,
    executor: Arc<dyn StepExecutor>,
}

impl AnalysisRunner {
    #[must_use]
    pub fn new(plan: RunPlan, executor: Arc<dyn StepExecutor>) -> Self {
        Self { plan, executor }
    }

    #[must_use]
    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// Run every step in order.
    ///
    /// # Errors
    /// Returns `RunnerError::StepFailed` for the first step that fails; the
    /// remaining steps are not started.
    pub async fn run(
        &self,
        clearance: Clearance,
        journal: &Journal,
    ) -> Result<RunnerReport, RunnerError> {
        let started = Instant::now();
        let credential = clearance.credential();
        let mut job = JobTracker::new();
        job.advance(JobState::Running)?;
        journal.record(JobKind::AnalysisRunner, None, JobState::Running, "starting analysis");

        let mut steps = Vec::with_capacity(self.plan.steps().len());
        for step in self.plan.steps() {
            match self.run_step(step, credential, journal).await {
                Ok(record) => steps.push(record),
                Err(source) => {
                    job.advance(JobState::Failed)?;
                    let detail = redact(&format!("{} failed: {source}", step.kind), Some(credential));
                    journal.record(JobKind::AnalysisRunner, None, JobState::Failed, detail);
                    return Err(RunnerError::StepFailed {
                        step: step.kind,
                        source,
                    });
                }
            }
        }

        job.advance(JobState::Succeeded)?;
        journal.record(
            JobKind::AnalysisRunner,
            None,
            JobState::Succeeded,
            format!("{} steps completed", steps.len()),
        );
        tracing::info!(steps = steps.len(), "analysis completed");

        Ok(RunnerReport {
            steps,
            duration_ms: elapsed_ms(started),
        })
    }

    async fn run_step(
        &self,
        step: &StepPlan,
        credential: &Credential,
        journal: &Journal,
    ) -> Result<StepRecord, StepError> {
        let started = Instant::now();
        tracing::info!(step = %step.kind, commands = step.commands.len(), "step started");
        journal.record(
            JobKind::AnalysisRunner,
            Some(step.kind),
            JobState::Running,
            describe(step),
        );

        let forwarded = step.kind.needs_credential().then_some(credential);
        match self.executor.execute_step(step, forwarded).await {
            Ok(()) => {
                journal.record(
                    JobKind::AnalysisRunner,
                    Some(step.kind),
                    JobState::Succeeded,
                    "",
                );
                Ok(StepRecord {
                    kind: step.kind,
                    state: JobState::Succeeded,
                    duration_ms: elapsed_ms(started),
                })
            }
            Err(e) => {
                let detail = redact(&e.to_string(), Some(credential));
                tracing::warn!(step = %step.kind, error = %detail, "step failed");
                journal.record(
                    JobKind::AnalysisRunner,
                    Some(step.kind),
                    JobState::Failed,
                    detail,
                );
                Err(e)
            }
        }
    }
}

fn describe(step: &StepPlan) -> String {
    step.commands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" && ")
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
