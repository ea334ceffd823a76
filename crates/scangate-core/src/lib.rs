//! scangate core
//!
//! Credential-gated static analysis in two jobs:
//! 1. **Gate check**: decides from the presence of a credential whether the
//!    analysis may run, and publishes that decision as `should-run`
//! 2. **Analysis runner**: acquires the source tree, prepares the coverage
//!    artifact, and invokes the analysis tool, strictly in that order
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scangate_core::prelude::*;
//!
//! let outputs = Arc::new(WorkflowOutputs::new(None));
//! let pipeline = Pipeline::new(ScanGateConfig::default(), Trigger::Manual, outputs);
//!
//! let credential = std::env::var("TICSAUTHTOKEN").ok().map(Credential::new);
//! let report = pipeline.execute(credential).await;
//! std::process::exit(report.exit_status().code());
//! ```

#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod gate;
pub mod journal;
pub mod outputs;
pub mod pipeline;
pub mod runner;
pub mod state_machine;
pub mod trigger;
pub mod types;

pub use error::*;
pub use types::*;

/// Common imports for driving a pipeline
pub mod prelude {
    pub use crate::config::ScanGateConfig;
    pub use crate::error::{ConfigError, RunnerError, StepError};
    pub use crate::gate::{Clearance, GateCheck, GateReport, GateStatus};
    pub use crate::journal::Journal;
    pub use crate::outputs::{MemoryOutputs, OutputSink, WorkflowOutputs, SHOULD_RUN_OUTPUT};
    pub use crate::pipeline::{Outcome, Pipeline, PipelineReport};
    pub use crate::runner::{AnalysisRunner, CommandSpec, RunPlan, StepExecutor, StepPlan};
    pub use crate::trigger::{Trigger, TriggerKind};
    pub use crate::types::{Credential, Decision, ExitStatus, JobState, RunDecision, StepKind};
    pub use std::sync::Arc;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
