//! The fixed three-step plan and the commands each step runs
//!
//! Building a plan executes nothing. The credential is not part of a plan:
//! a command only names the environment key it should be delivered under,
//! and the executor fills in the value when the step is cleared to run.

use crate::config::ScanGateConfig;
use crate::types::{StepKind, REDACTED};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// One external program invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Environment key the credential is delivered under, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_env: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            credential_env: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_credential_env(mut self, key: impl Into<String>) -> Self {
        self.credential_env = Some(key.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key) = &self.credential_env {
            write!(f, "{key}={REDACTED} ")?;
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// One runner step and its commands, run in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepPlan {
    pub kind: StepKind,
    pub commands: Vec<CommandSpec>,
}

/// The runner's steps in their fixed order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunPlan {
    steps: Vec<StepPlan>,
}

impl RunPlan {
    /// Build the plan from configuration.
    ///
    /// The clone command is included only when a repository is configured and
    /// `workdir` is not already a checkout.
    #[must_use]
    pub fn from_config(config: &ScanGateConfig) -> Self {
        let workdir = config.checkout.workdir.clone();
        let needs_clone =
            config.checkout.repository.is_some() && !workdir.join(".git").exists();

        Self {
            steps: vec![
                acquire_tree(config, needs_clone),
                prepare_artifact(config),
                invoke_tool(config),
            ],
        }
    }

    /// Plan with caller-supplied steps; they are reordered into the fixed order.
    #[must_use]
    pub fn from_steps(mut steps: Vec<StepPlan>) -> Self {
        steps.sort_by_key(|s| s.kind);
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[StepPlan] {
        &self.steps
    }

    #[must_use]
    pub fn step(&self, kind: StepKind) -> Option<&StepPlan> {
        self.steps.iter().find(|s| s.kind == kind)
    }
}

fn acquire_tree(config: &ScanGateConfig, needs_clone: bool) -> StepPlan {
    let checkout = &config.checkout;
    let mut commands = Vec::new();

    if let (true, Some(repository)) = (needs_clone, &checkout.repository) {
        commands.push(
            CommandSpec::new("git")
                .args(["clone", "--recurse-submodules", "--quiet"])
                .arg(repository)
                .arg(checkout.workdir.display().to_string()),
        );
    }
    commands.push(
        CommandSpec::new("git")
            .args(["checkout", "--quiet"])
            .arg(&checkout.reference)
            .current_dir(&checkout.workdir),
    );
    commands.push(
        CommandSpec::new("git")
            .args(["submodule", "update", "--init", "--recursive"])
            .current_dir(&checkout.workdir),
    );

    StepPlan {
        kind: StepKind::AcquireTree,
        commands,
    }
}

fn prepare_artifact(config: &ScanGateConfig) -> StepPlan {
    let mut parts = config.prepare.command.iter();
    let commands = parts
        .next()
        .map(|program| {
            vec![CommandSpec::new(program)
                .args(parts.cloned())
                .current_dir(&config.checkout.workdir)]
        })
        .unwrap_or_default();

    StepPlan {
        kind: StepKind::PrepareArtifact,
        commands,
    }
}

fn invoke_tool(config: &ScanGateConfig) -> StepPlan {
    let tool = &config.tool;
    let mut command = CommandSpec::new(&tool.program)
        .args(["--mode", tool.mode.as_str()])
        .args(["--project", tool.project.as_str()])
        .args(["--viewer-url", tool.viewer_url.as_str()]);
    if tool.install_if_absent {
        command = command.arg("--install-tics");
    }
    command = command
        .args(["--filelist", tool.filelist.as_str()])
        .current_dir(&config.checkout.workdir)
        .with_credential_env(&config.gate.credential_env);

    StepPlan {
        kind: StepKind::InvokeTool,
        commands: vec![command],
    }
}
