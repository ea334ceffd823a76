//! Gate check
//!
//! Decides whether the analysis job may run. The only input is the credential,
//! passed in explicitly. The gate never reveals the value: notices and logs
//! name the variable, never its contents.
//!
//! # Critical Invariant
//!
//! A [`Clearance`] can only be obtained from a [`GateReport`] whose decision is
//! `Run` and whose status is `Succeeded`. The runner accepts nothing else.

use crate::error::GateError;
use crate::journal::Journal;
use crate::outputs::{OutputSink, SHOULD_RUN_OUTPUT};
use crate::state_machine::JobTracker;
use crate::types::{Credential, Decision, JobKind, JobState, RunDecision};
use serde::Serialize;

/// How the gate job itself ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Succeeded,
    /// Credential absent; an intentional skip, not a crash
    Skipped,
    /// The gate could not complete (e.g. its output could not be written)
    Failed,
}

/// Proof that the gate allowed this run
///
/// Not constructible outside this module and not `Clone`, so each clearance
/// is consumed by exactly one runner invocation.
#[derive(Debug)]
pub struct Clearance {
    credential: Credential,
}

impl Clearance {
    pub(crate) fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// Result of evaluating the gate
#[derive(Debug)]
pub struct GateReport {
    decision: RunDecision,
    status: GateStatus,
    error: Option<String>,
    credential: Option<Credential>,
}

impl GateReport {
    #[inline]
    #[must_use]
    pub fn decision(&self) -> &RunDecision {
        &self.decision
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> GateStatus {
        self.status
    }

    /// Why the gate itself failed, if it did
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// The runner entry condition: decision is `Run` AND the gate succeeded.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.decision.should_run() && self.status == GateStatus::Succeeded
    }

    /// Consume the report, yielding a clearance only when the entry condition holds.
    #[must_use]
    pub fn into_clearance(self) -> Option<Clearance> {
        if !self.is_cleared() {
            return None;
        }
        self.credential.map(|credential| Clearance { credential })
    }
}

/// The gate job
pub struct GateCheck<'a> {
    credential_name: String,
    credential: Option<Credential>,
    outputs: &'a dyn OutputSink,
}

impl<'a> GateCheck<'a> {
    /// Create a gate for the credential known to operators as `credential_name`.
    pub fn new(
        credential_name: impl Into<String>,
        credential: Option<Credential>,
        outputs: &'a dyn OutputSink,
    ) -> Self {
        Self {
            credential_name: credential_name.into(),
            credential,
            outputs,
        }
    }

    /// Pure presence rule: non-empty means present. No trimming.
    #[must_use]
    pub fn decide(credential: Option<&Credential>) -> Decision {
        match credential {
            Some(c) if c.is_present() => Decision::Run,
            _ => Decision::Skip,
        }
    }

    /// Evaluate the gate once, publishing the decision and recording it in `journal`.
    pub fn evaluate(self, journal: &Journal) -> GateReport {
        let mut tracker = JobTracker::new();
        let decision = Self::decide(self.credential.as_ref());

        let result = match decision {
            Decision::Run => self.publish_run(&mut tracker, journal),
            Decision::Skip => self.publish_skip(&mut tracker, journal),
        };

        let (status, error) = match result {
            Ok(status) => (status, None),
            Err(e) => {
                tracing::warn!(error = %e, "gate check failed");
                if let Err(state) = tracker.advance(JobState::Failed) {
                    tracing::warn!(error = %state, "gate state left unchanged");
                }
                journal.record(JobKind::GateCheck, None, JobState::Failed, e.to_string());
                (GateStatus::Failed, Some(e.to_string()))
            }
        };

        let reason = match decision {
            Decision::Run => format!("{} is configured", self.credential_name),
            Decision::Skip => format!("{} is not set", self.credential_name),
        };

        GateReport {
            decision: RunDecision::new(decision, reason),
            status,
            error,
            credential: self.credential,
        }
    }

    fn publish_run(
        &self,
        tracker: &mut JobTracker,
        journal: &Journal,
    ) -> Result<GateStatus, GateError> {
        tracker.advance(JobState::Running)?;
        journal.record(JobKind::GateCheck, None, JobState::Running, "checking credential");

        self.outputs.set_output(SHOULD_RUN_OUTPUT, "true")?;
        tracker.advance(JobState::Succeeded)?;
        journal.record(
            JobKind::GateCheck,
            None,
            JobState::Succeeded,
            format!("{SHOULD_RUN_OUTPUT}=true"),
        );
        tracing::info!(credential = %self.credential_name, "credential present, analysis will run");
        Ok(GateStatus::Succeeded)
    }

    fn publish_skip(
        &self,
        tracker: &mut JobTracker,
        journal: &Journal,
    ) -> Result<GateStatus, GateError> {
        let notice = format!(
            "{} is not set; static analysis is not going to run",
            self.credential_name
        );
        self.outputs.notice(&notice);
        self.outputs.set_output(SHOULD_RUN_OUTPUT, "false")?;
        tracker.advance(JobState::Skipped)?;
        journal.record(JobKind::GateCheck, None, JobState::Skipped, notice);
        tracing::info!(credential = %self.credential_name, "credential absent, skipping analysis");
        Ok(GateStatus::Skipped)
    }
}
