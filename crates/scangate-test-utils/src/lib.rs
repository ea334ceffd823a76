//! Testing utilities for the scangate workspace
//!
//! Shared step executors, fixtures, and assertions.

#![allow(missing_docs)]

use parking_lot::Mutex;
use scangate_core::config::ScanGateConfig;
use scangate_core::error::StepError;
use scangate_core::outputs::{MemoryOutputs, OutputSink};
use scangate_core::pipeline::Pipeline;
use scangate_core::runner::{StepExecutor, StepPlan};
use scangate_core::trigger::Trigger;
use scangate_core::types::{Credential, StepKind};
use std::collections::HashSet;
use std::sync::Arc;

/// One call observed by [`RecordingExecutor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedStep {
    pub kind: StepKind,
    /// Whether a credential was handed to the step
    pub received_credential: bool,
}

/// Step executor that records calls instead of spawning processes
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<ExecutedStep>>,
    fail_on: HashSet<StepKind>,
}

impl RecordingExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail whenever `kind` is executed
    #[must_use]
    pub fn failing_at(kind: StepKind) -> Self {
        Self {
            fail_on: HashSet::from([kind]),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn calls(&self) -> Vec<ExecutedStep> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn executed(&self) -> Vec<StepKind> {
        self.calls.lock().iter().map(|c| c.kind).collect()
    }
}

#[async_trait::async_trait]
impl StepExecutor for RecordingExecutor {
    async fn execute_step(
        &self,
        step: &StepPlan,
        credential: Option<&Credential>,
    ) -> Result<(), StepError> {
        self.calls.lock().push(ExecutedStep {
            kind: step.kind,
            received_credential: credential.is_some(),
        });
        if self.fail_on.contains(&step.kind) {
            return Err(StepError::Other(format!("injected failure in {}", step.kind)));
        }
        Ok(())
    }
}

/// A pipeline wired to in-memory outputs and a recording executor
pub struct TestPipeline {
    pub pipeline: Pipeline,
    pub outputs: Arc<MemoryOutputs>,
    pub executor: Arc<RecordingExecutor>,
}

#[must_use]
pub fn setup_pipeline(executor: RecordingExecutor) -> TestPipeline {
    setup_pipeline_with(ScanGateConfig::default(), MemoryOutputs::new(), executor)
}

#[must_use]
pub fn setup_pipeline_with(
    config: ScanGateConfig,
    outputs: MemoryOutputs,
    executor: RecordingExecutor,
) -> TestPipeline {
    let outputs = Arc::new(outputs);
    let executor = Arc::new(executor);
    let sink: Arc<dyn OutputSink> = outputs.clone();
    let steps: Arc<dyn StepExecutor> = executor.clone();
    let pipeline = Pipeline::with_executor(config, Trigger::Manual, sink, steps);
    TestPipeline {
        pipeline,
        outputs,
        executor,
    }
}

/// Assert that `needle` appears nowhere in `haystack`
pub fn assert_not_leaked(haystack: &str, needle: &str) {
    assert!(
        !haystack.contains(needle),
        "credential leaked into output: {haystack}"
    );
}
