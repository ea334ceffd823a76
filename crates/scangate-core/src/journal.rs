//! Append-only record of what a run did
//!
//! Every job and step transition lands here. The journal ends up in the run
//! report, so nothing recorded may contain the credential: callers pass free
//! text through [`redact`] first.

use crate::types::{Credential, JobKind, JobState, StepKind, REDACTED};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct JournalEvent {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub job: JobKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<StepKind>,
    pub state: JobState,
    pub detail: String,
}

#[derive(Debug, Default)]
pub struct Journal {
    inner: Mutex<Vec<JournalEvent>>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        job: JobKind,
        step: Option<StepKind>,
        state: JobState,
        detail: impl Into<String>,
    ) -> u64 {
        let mut guard = self.inner.lock();
        let seq = guard.len() as u64;
        guard.push(JournalEvent {
            seq,
            timestamp: Utc::now(),
            job,
            step,
            state,
            detail: detail.into(),
        });
        seq
    }

    #[must_use]
    pub fn events(&self) -> Vec<JournalEvent> {
        self.inner.lock().clone()
    }

    /// Steps that reached `Running`, in the order they started
    #[must_use]
    pub fn started_steps(&self) -> Vec<StepKind> {
        self.inner
            .lock()
            .iter()
            .filter(|e| e.state == JobState::Running)
            .filter_map(|e| e.step)
            .collect()
    }
}

/// Replace every occurrence of the credential in `text`.
#[must_use]
pub fn redact(text: &str, credential: Option<&Credential>) -> String {
    match credential {
        Some(c) if c.is_present() => text.replace(c.expose(), REDACTED),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_dense() {
        let journal = Journal::new();
        journal.record(JobKind::GateCheck, None, JobState::Running, "");
        journal.record(JobKind::GateCheck, None, JobState::Succeeded, "");
        let seqs: Vec<u64> = journal.events().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn started_steps_ignore_terminal_events() {
        let journal = Journal::new();
        let runner = JobKind::AnalysisRunner;
        journal.record(runner, Some(StepKind::AcquireTree), JobState::Running, "");
        journal.record(runner, Some(StepKind::AcquireTree), JobState::Failed, "");
        assert_eq!(journal.started_steps(), vec![StepKind::AcquireTree]);
    }

    #[test]
    fn redact_scrubs_credential() {
        let cred = Credential::new("s3cr3t");
        let out = redact("token=s3cr3t; again s3cr3t", Some(&cred));
        assert_eq!(out, "token=[REDACTED]; again [REDACTED]");
    }

    #[test]
    fn redact_with_empty_credential_is_identity() {
        let cred = Credential::new("");
        assert_eq!(redact("unchanged", Some(&cred)), "unchanged");
        assert_eq!(redact("unchanged", None), "unchanged");
    }
}
