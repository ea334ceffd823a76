//! End-to-end pipeline behaviour with a recording executor

use pretty_assertions::assert_eq;
use scangate_core::prelude::*;
use scangate_test_utils::{assert_not_leaked, setup_pipeline, setup_pipeline_with, RecordingExecutor};

const SECRET: &str = "abc123";

#[tokio::test]
async fn scenario_a_empty_credential_skips_quietly() {
    let t = setup_pipeline(RecordingExecutor::new());

    let report = t.pipeline.execute(Some(Credential::new(""))).await;

    assert_eq!(report.outcome, Outcome::Skipped);
    assert_eq!(report.gate, GateStatus::Skipped);
    assert_eq!(report.runner, JobState::Skipped);
    assert!(!report.decision.should_run());
    assert_eq!(report.exit_status(), ExitStatus::Skipped);
    assert_eq!(report.exit_status().code(), 78);
    assert!(report.error.is_none());

    assert!(t.executor.executed().is_empty());
    assert!(report.executed_steps().is_empty());
    assert_eq!(t.outputs.notices().len(), 1);
    assert_eq!(t.outputs.output(SHOULD_RUN_OUTPUT).as_deref(), Some("false"));
}

#[tokio::test]
async fn unset_credential_never_executes_a_step() {
    let t = setup_pipeline(RecordingExecutor::new());
    let report = t.pipeline.execute(None).await;

    assert_eq!(report.outcome, Outcome::Skipped);
    assert!(t.executor.calls().is_empty());
}

#[tokio::test]
async fn scenario_b_all_steps_run_in_order() {
    let t = setup_pipeline(RecordingExecutor::new());

    let report = t.pipeline.execute(Some(Credential::new(SECRET))).await;

    assert_eq!(report.outcome, Outcome::Succeeded);
    assert_eq!(report.gate, GateStatus::Succeeded);
    assert_eq!(report.runner, JobState::Succeeded);
    assert!(report.decision.should_run());
    assert_eq!(t.executor.executed(), StepKind::ORDER.to_vec());
    assert_eq!(report.executed_steps(), StepKind::ORDER.to_vec());
    assert_eq!(t.outputs.output(SHOULD_RUN_OUTPUT).as_deref(), Some("true"));

    let runner_report = report.runner_report.expect("runner report");
    assert_eq!(runner_report.steps.len(), 3);
    assert!(runner_report
        .steps
        .iter()
        .all(|s| s.state == JobState::Succeeded));
}

#[tokio::test]
async fn scenario_c_tree_failure_stops_everything_after_it() {
    let t = setup_pipeline(RecordingExecutor::failing_at(StepKind::AcquireTree));

    let report = t.pipeline.execute(Some(Credential::new(SECRET))).await;

    assert_eq!(report.outcome, Outcome::Failed);
    assert_eq!(report.gate, GateStatus::Succeeded);
    assert_eq!(report.runner, JobState::Failed);
    assert_eq!(report.failed_step, Some(StepKind::AcquireTree));
    assert_eq!(report.exit_status(), ExitStatus::Failure);
    assert_eq!(t.executor.executed(), vec![StepKind::AcquireTree]);
    assert!(report.runner_report.is_none());
}

#[tokio::test]
async fn prepare_failure_prevents_tool_invocation() {
    let t = setup_pipeline(RecordingExecutor::failing_at(StepKind::PrepareArtifact));

    let report = t.pipeline.execute(Some(Credential::new(SECRET))).await;

    assert_eq!(report.failed_step, Some(StepKind::PrepareArtifact));
    assert_eq!(
        t.executor.executed(),
        vec![StepKind::AcquireTree, StepKind::PrepareArtifact]
    );
}

#[tokio::test]
async fn whitespace_credential_counts_as_present() {
    let t = setup_pipeline(RecordingExecutor::new());
    let report = t.pipeline.execute(Some(Credential::new("  "))).await;

    assert_eq!(report.outcome, Outcome::Succeeded);
    assert_eq!(t.executor.executed().len(), 3);
}

#[tokio::test]
async fn only_tool_step_receives_credential() {
    let t = setup_pipeline(RecordingExecutor::new());
    let _ = t.pipeline.execute(Some(Credential::new(SECRET))).await;

    for call in t.executor.calls() {
        assert_eq!(call.received_credential, call.kind.needs_credential());
    }
}

#[tokio::test]
async fn gate_fault_skips_runner_without_escalating() {
    let t = setup_pipeline_with(
        ScanGateConfig::default(),
        MemoryOutputs::failing(),
        RecordingExecutor::new(),
    );

    let report = t.pipeline.execute(Some(Credential::new(SECRET))).await;

    assert_eq!(report.gate, GateStatus::Failed);
    assert_eq!(report.runner, JobState::Skipped);
    assert_eq!(report.outcome, Outcome::Skipped);
    assert_eq!(report.exit_status(), ExitStatus::Skipped);
    assert!(report.error.is_none());
    assert!(t.executor.executed().is_empty());

    let notices = t.outputs.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].starts_with("gate check failed"));
    assert!(notices[0].ends_with("static analysis was not run"));
}

#[test]
fn gate_fault_during_check_is_quiet() {
    let t = setup_pipeline_with(
        ScanGateConfig::default(),
        MemoryOutputs::failing(),
        RecordingExecutor::new(),
    );

    let report = t.pipeline.check(None);

    assert_eq!(report.gate, GateStatus::Failed);
    assert_eq!(report.exit_status(), ExitStatus::Skipped);
    assert!(report.error.is_none());
    // Skip notice from the gate, then the fault notice
    assert_eq!(t.outputs.notices().len(), 2);
}

#[tokio::test]
async fn report_never_contains_credential() {
    for executor in [
        RecordingExecutor::new(),
        RecordingExecutor::failing_at(StepKind::InvokeTool),
    ] {
        let t = setup_pipeline(executor);
        let report = t.pipeline.execute(Some(Credential::new(SECRET))).await;

        let json = serde_json::to_string(&report).unwrap();
        assert_not_leaked(&json, SECRET);
        for (_, value) in t.outputs.outputs() {
            assert_not_leaked(&value, SECRET);
        }
        for notice in t.outputs.notices() {
            assert_not_leaked(&notice, SECRET);
        }
    }
}

#[tokio::test]
async fn journal_records_tool_command_with_redacted_credential() {
    let t = setup_pipeline(RecordingExecutor::new());
    let report = t.pipeline.execute(Some(Credential::new(SECRET))).await;

    let tool_start = report
        .journal
        .iter()
        .find(|e| e.step == Some(StepKind::InvokeTool) && e.state == JobState::Running)
        .expect("tool step started");
    assert!(tool_start.detail.contains("TICSAUTHTOKEN=[REDACTED]"));
    assert!(tool_start.detail.contains("--mode qserver"));
}

#[test]
fn check_only_evaluates_gate() {
    let t = setup_pipeline(RecordingExecutor::new());

    let report = t.pipeline.check(Some(Credential::new(SECRET)));
    assert_eq!(report.outcome, Outcome::Succeeded);
    assert_eq!(report.runner, JobState::Pending);

    let report = t.pipeline.check(None);
    assert_eq!(report.outcome, Outcome::Skipped);
    assert!(t.executor.executed().is_empty());
}
