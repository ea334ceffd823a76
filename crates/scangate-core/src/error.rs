//! Error types for scangate
//!
//! Two kinds of outcome are kept apart:
//! - An intentional skip is not an error at all; it is `GateStatus::Skipped`.
//! - A genuine failure is one of the enums below and ends the run.

use crate::types::{JobState, StepKind};
use std::path::PathBuf;

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected schema
    #[error("cannot parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A field holds a value the pipeline cannot work with
    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Job state transition errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("illegal job state transition: {from:?} -> {to:?}")]
    IllegalTransition { from: JobState, to: JobState },
}

/// Errors raised by the gate itself, as opposed to a missing credential
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The named decision output could not be published
    #[error("cannot write step output: {0}")]
    Output(#[from] std::io::Error),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Failure of a single runner step
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// The step's program could not be started
    #[error("cannot spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The step's program ran and exited unsuccessfully
    #[error("`{program}` exited with {}", describe_exit(.exit_code))]
    NonZeroExit {
        program: String,
        exit_code: Option<i32>,
    },

    /// The step has nothing to execute
    #[error("empty command")]
    EmptyCommand,

    /// Injected or executor-specific failure
    #[error("{0}")]
    Other(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_string(),
    }
}

/// Runner errors
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A step failed; every later step was left unexecuted
    #[error("step {step} failed: {source}")]
    StepFailed {
        step: StepKind,
        #[source]
        source: StepError,
    },

    #[error(transparent)]
    State(#[from] StateError),
}

impl RunnerError {
    /// The step that failed, if the failure came from a step
    #[must_use]
    pub fn failed_step(&self) -> Option<StepKind> {
        match self {
            Self::StepFailed { step, .. } => Some(*step),
            Self::State(_) => None,
        }
    }

    /// Runner failures are terminal for the run; the operator re-triggers manually.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_exit_display() {
        let err = StepError::NonZeroExit {
            program: "make".to_string(),
            exit_code: Some(2),
        };
        assert_eq!(err.to_string(), "`make` exited with code 2");

        let err = StepError::NonZeroExit {
            program: "make".to_string(),
            exit_code: None,
        };
        assert_eq!(err.to_string(), "`make` exited with a signal");
    }

    #[test]
    fn runner_error_is_never_retryable() {
        let err = RunnerError::StepFailed {
            step: StepKind::InvokeTool,
            source: StepError::Other("upload rejected".to_string()),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.failed_step(), Some(StepKind::InvokeTool));
        assert!(err.to_string().contains("invoke-tool"));
    }

    #[test]
    fn invalid_field_display() {
        let err = ConfigError::invalid("tool.program", "must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid value for `tool.program`: must not be empty"
        );
    }
}
