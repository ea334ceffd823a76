//! Core types shared by the gate, the runner, and the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder printed wherever a credential would otherwise appear
pub const REDACTED: &str = "[REDACTED]";

/// Opaque authentication value
///
/// `Debug` and `Display` never print the value. Use [`Credential::expose`]
/// at the single point where it is handed to a child process.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value. Never log or print the result.
    #[inline]
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Presence is "non-empty string"; whitespace counts as present.
    #[inline]
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&REDACTED).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Gate verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Run,
    Skip,
}

impl Decision {
    #[inline]
    #[must_use]
    pub fn should_run(self) -> bool {
        matches!(self, Self::Run)
    }
}

/// One-shot decision produced by the gate
///
/// `reason` is advisory text for humans; nothing parses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunDecision {
    decision: Decision,
    reason: String,
}

impl RunDecision {
    pub(crate) fn new(decision: Decision, reason: impl Into<String>) -> Self {
        Self {
            decision,
            reason: reason.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision
    }

    #[inline]
    #[must_use]
    pub fn should_run(&self) -> bool {
        self.decision.should_run()
    }

    #[inline]
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Lifecycle of a job (the gate or the runner)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl JobState {
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }
}

/// The two jobs of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    GateCheck,
    AnalysisRunner,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GateCheck => "gate-check",
            Self::AnalysisRunner => "analysis-runner",
        })
    }
}

/// Runner steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    AcquireTree,
    PrepareArtifact,
    InvokeTool,
}

impl StepKind {
    /// Fixed execution order
    pub const ORDER: [StepKind; 3] = [
        StepKind::AcquireTree,
        StepKind::PrepareArtifact,
        StepKind::InvokeTool,
    ];

    /// Only the tool invocation receives the credential.
    #[inline]
    #[must_use]
    pub fn needs_credential(self) -> bool {
        matches!(self, Self::InvokeTool)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AcquireTree => "acquire-tree",
            Self::PrepareArtifact => "prepare-artifact",
            Self::InvokeTool => "invoke-tool",
        })
    }
}

/// Process exit status of a scangate invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatus {
    Success,
    /// Intentional skip; callers must not treat this as a failure.
    Skipped,
    Failure,
    Usage,
}

impl ExitStatus {
    /// Neutral exit code, distinct from both success and crash
    pub const SKIPPED_CODE: i32 = 78;

    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Usage => 2,
            Self::Skipped => Self::SKIPPED_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_never_formats_its_value() {
        let cred = Credential::new("abc123");
        assert_eq!(format!("{cred}"), REDACTED);
        assert!(!format!("{cred:?}").contains("abc123"));
        assert_eq!(cred.expose(), "abc123");
    }

    #[test]
    fn whitespace_credential_is_present() {
        assert!(Credential::new("   ").is_present());
        assert!(Credential::new("\t").is_present());
        assert!(!Credential::new("").is_present());
    }

    #[test]
    fn step_order_is_fixed() {
        assert_eq!(
            StepKind::ORDER,
            [
                StepKind::AcquireTree,
                StepKind::PrepareArtifact,
                StepKind::InvokeTool
            ]
        );
        assert!(StepKind::ORDER.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failure.code(), 1);
        assert_eq!(ExitStatus::Usage.code(), 2);
        assert_eq!(ExitStatus::Skipped.code(), 78);
    }

    #[test]
    fn decision_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Decision::Run).unwrap(), "\"run\"");
        assert_eq!(serde_json::to_string(&Decision::Skip).unwrap(), "\"skip\"");
    }
}
