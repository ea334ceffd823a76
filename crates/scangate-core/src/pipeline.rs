//! Gate-then-run orchestration
//!
//! # Workflow
//! 1. Evaluate the gate with the explicitly supplied credential
//! 2. Evaluate the runner entry condition (decision is Run AND gate succeeded)
//! 3. Run the analysis steps, or record the runner as skipped
//! 4. Fold everything into a [`PipelineReport`]

use crate::config::ScanGateConfig;
use crate::gate::{GateCheck, GateReport, GateStatus};
use crate::journal::{redact, Journal, JournalEvent};
use crate::outputs::OutputSink;
use crate::runner::{AnalysisRunner, ProcessExecutor, RunPlan, RunnerReport, StepExecutor};
use crate::trigger::Trigger;
use crate::types::{Credential, ExitStatus, JobKind, JobState, RunDecision, StepKind};
use serde::Serialize;
use std::sync::Arc;

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Succeeded,
    /// Intentional skip; quiet for monitoring
    Skipped,
    Failed,
}

impl Outcome {
    #[must_use]
    pub fn exit_status(self) -> ExitStatus {
        match self {
            Self::Succeeded => ExitStatus::Success,
            Self::Skipped => ExitStatus::Skipped,
            Self::Failed => ExitStatus::Failure,
        }
    }
}

/// Everything an operator needs to triage a run. Never contains the credential.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub trigger: Trigger,
    pub outcome: Outcome,
    pub decision: RunDecision,
    pub gate: GateStatus,
    pub runner: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<StepKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner_report: Option<RunnerReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub journal: Vec<JournalEvent>,
}

impl PipelineReport {
    #[must_use]
    pub fn exit_status(&self) -> ExitStatus {
        self.outcome.exit_status()
    }

    /// Steps the runner started, in order
    #[must_use]
    pub fn executed_steps(&self) -> Vec<StepKind> {
        self.journal
            .iter()
            .filter(|e| e.job == JobKind::AnalysisRunner && e.state == JobState::Running)
            .filter_map(|e| e.step)
            .collect()
    }
}

/// The two-job pipeline
pub struct Pipeline {
    config: ScanGateConfig,
    trigger: Trigger,
    outputs: Arc<dyn OutputSink>,
    executor: Arc<dyn StepExecutor>,
}

impl Pipeline {
    /// Pipeline that spawns real processes
    #[must_use]
    pub fn new(config: ScanGateConfig, trigger: Trigger, outputs: Arc<dyn OutputSink>) -> Self {
        Self::with_executor(config, trigger, outputs, Arc::new(ProcessExecutor::new()))
    }

    /// Create with custom step executor
    #[must_use]
    pub fn with_executor(
        config: ScanGateConfig,
        trigger: Trigger,
        outputs: Arc<dyn OutputSink>,
        executor: Arc<dyn StepExecutor>,
    ) -> Self {
        Self {
            config,
            trigger,
            outputs,
            executor,
        }
    }

    /// The runner plan this pipeline would execute
    #[must_use]
    pub fn plan(&self) -> RunPlan {
        RunPlan::from_config(&self.config)
    }

    fn gate(&self, credential: Option<Credential>, journal: &Journal) -> GateReport {
        tracing::info!(trigger = %self.trigger, "evaluating gate");
        GateCheck::new(
            self.config.gate.credential_env.clone(),
            credential,
            self.outputs.as_ref(),
        )
        .evaluate(journal)
    }

    /// Run the gate alone.
    #[must_use]
    pub fn check(&self, credential: Option<Credential>) -> PipelineReport {
        let journal = Journal::new();
        let gate = self.gate(credential, &journal);
        let outcome = match gate.status() {
            GateStatus::Succeeded => Outcome::Succeeded,
            GateStatus::Skipped => Outcome::Skipped,
            GateStatus::Failed => {
                self.notify_gate_fault(&gate);
                Outcome::Skipped
            }
        };

        PipelineReport {
            trigger: self.trigger.clone(),
            outcome,
            decision: gate.decision().clone(),
            gate: gate.status(),
            runner: JobState::Pending,
            failed_step: None,
            runner_report: None,
            error: None,
            journal: journal.events(),
        }
    }

    /// A failed gate ends the run quietly: one notice, no escalation.
    fn notify_gate_fault(&self, gate: &GateReport) {
        let cause = gate.error().unwrap_or("unknown error");
        self.outputs.notice(&format!(
            "gate check failed ({cause}); static analysis was not run"
        ));
    }

    /// Run the gate and, when cleared, the analysis.
    pub async fn execute(&self, credential: Option<Credential>) -> PipelineReport {
        let journal = Journal::new();
        let gate = self.gate(credential, &journal);
        let decision = gate.decision().clone();
        let gate_status = gate.status();
        if gate_status == GateStatus::Failed {
            self.notify_gate_fault(&gate);
        }
        let secret = gate.credential().cloned();

        let Some(clearance) = gate.into_clearance() else {
            journal.record(
                JobKind::AnalysisRunner,
                None,
                JobState::Skipped,
                "entry condition not met",
            );
            return PipelineReport {
                trigger: self.trigger.clone(),
                outcome: Outcome::Skipped,
                decision,
                gate: gate_status,
                runner: JobState::Skipped,
                failed_step: None,
                runner_report: None,
                error: None,
                journal: journal.events(),
            };
        };

        let runner = AnalysisRunner::new(self.plan(), Arc::clone(&self.executor));
        let (outcome, runner_state, runner_report, failed_step, error) =
            match runner.run(clearance, &journal).await {
                Ok(report) => (Outcome::Succeeded, JobState::Succeeded, Some(report), None, None),
                Err(e) => {
                    let message = redact(&e.to_string(), secret.as_ref());
                    tracing::error!(error = %message, "analysis failed");
                    (
                        Outcome::Failed,
                        JobState::Failed,
                        None,
                        e.failed_step(),
                        Some(message),
                    )
                }
            };

        PipelineReport {
            trigger: self.trigger.clone(),
            outcome,
            decision,
            gate: gate_status,
            runner: runner_state,
            failed_step,
            runner_report,
            error,
            journal: journal.events(),
        }
    }
}
