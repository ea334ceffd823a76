//! Step executor backed by child processes

use super::plan::{CommandSpec, StepPlan};
use super::StepExecutor;
use crate::error::StepError;
use crate::types::Credential;
use tokio::process::Command;

/// Runs each command of a step as a child process, stopping at the first failure.
///
/// Child stdout and stderr are inherited so the external tools' own output
/// reaches the operator unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn run_command(
        spec: &CommandSpec,
        credential: Option<&Credential>,
    ) -> Result<(), StepError> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).kill_on_drop(true);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }
        if let (Some(key), Some(credential)) = (&spec.credential_env, credential) {
            command.env(key, credential.expose());
        }

        tracing::debug!(command = %spec, "spawning");
        let status = command
            .status()
            .await
            .map_err(|source| StepError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(StepError::NonZeroExit {
                program: spec.program.clone(),
                exit_code: status.code(),
            })
        }
    }
}

#[async_trait::async_trait]
impl StepExecutor for ProcessExecutor {
    async fn execute_step(
        &self,
        step: &StepPlan,
        credential: Option<&Credential>,
    ) -> Result<(), StepError> {
        if step.commands.is_empty() {
            return Err(StepError::EmptyCommand);
        }
        for spec in &step.commands {
            Self::run_command(spec, credential).await?;
        }
        Ok(())
    }
}
