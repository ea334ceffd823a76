use crate::error::StateError;
use crate::types::JobState;

/// Validates a job state transition.
pub fn validate_transition(from: JobState, to: JobState) -> Result<(), StateError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(StateError::IllegalTransition { from, to })
    }
}

#[must_use]
pub fn allowed_transitions(from: JobState) -> Vec<JobState> {
    use JobState::{Failed, Pending, Running, Skipped, Succeeded};
    match from {
        Pending => vec![Running, Skipped, Failed],
        Running => vec![Succeeded, Failed],
        Succeeded | Failed | Skipped => vec![],
    }
}

fn allowed(from: JobState, to: JobState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

/// Tracks one job's state, rejecting illegal moves
#[derive(Debug, Clone, Copy)]
pub struct JobTracker {
    state: JobState,
}

impl Default for JobTracker {
    fn default() -> Self {
        Self {
            state: JobState::Pending,
        }
    }
}

impl JobTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn advance(&mut self, to: JobState) -> Result<JobState, StateError> {
        validate_transition(self.state, to)?;
        self.state = to;
        Ok(to)
    }
}
