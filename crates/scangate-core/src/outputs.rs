//! Named outputs and human-facing notices
//!
//! Inside the crate the decision travels as a typed [`Decision`]. This module
//! is the outer boundary where it becomes the textual `should-run=true|false`
//! line a workflow runner reads from its step-output file.
//!
//! [`Decision`]: crate::types::Decision

use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// Name of the single inter-job output
pub const SHOULD_RUN_OUTPUT: &str = "should-run";

/// Destination for named outputs and notices
pub trait OutputSink: Send + Sync {
    /// Publish a named output for downstream jobs.
    fn set_output(&self, name: &str, value: &str) -> io::Result<()>;

    /// Emit an informational, non-error notice.
    fn notice(&self, message: &str);
}

/// Workflow-runner outputs: `name=value` lines appended to a step-output file,
/// notices printed as `::notice::` annotations on stdout.
#[derive(Debug, Clone, Default)]
pub struct WorkflowOutputs {
    output_file: Option<PathBuf>,
}

impl WorkflowOutputs {
    #[must_use]
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }
}

impl OutputSink for WorkflowOutputs {
    fn set_output(&self, name: &str, value: &str) -> io::Result<()> {
        let Some(path) = &self.output_file else {
            tracing::debug!(output = name, "no step-output file configured");
            return Ok(());
        };
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{name}={value}")
    }

    fn notice(&self, message: &str) {
        println!("::notice::{}", escape_annotation(message));
    }
}

/// Annotation payloads must stay on one line.
fn escape_annotation(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// In-memory sink for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryOutputs {
    outputs: Mutex<Vec<(String, String)>>,
    notices: Mutex<Vec<String>>,
    fail_writes: bool,
}

impl MemoryOutputs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose `set_output` always fails, for exercising gate faults
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn outputs(&self) -> Vec<(String, String)> {
        self.outputs.lock().clone()
    }

    #[must_use]
    pub fn output(&self, name: &str) -> Option<String> {
        self.outputs
            .lock()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    #[must_use]
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().clone()
    }
}

impl OutputSink for MemoryOutputs {
    fn set_output(&self, name: &str, value: &str) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "step-output file is read-only",
            ));
        }
        self.outputs
            .lock()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn notice(&self, message: &str) {
        self.notices.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_outputs_append_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "existing=1\n").unwrap();

        let sink = WorkflowOutputs::new(Some(path.clone()));
        sink.set_output(SHOULD_RUN_OUTPUT, "true").unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "existing=1\nshould-run=true\n");
    }

    #[test]
    fn workflow_outputs_without_file_is_noop() {
        let sink = WorkflowOutputs::new(None);
        assert!(sink.set_output(SHOULD_RUN_OUTPUT, "false").is_ok());
    }

    #[test]
    fn annotation_escaping() {
        assert_eq!(escape_annotation("a\nb%c"), "a%0Ab%25c");
    }

    #[test]
    fn memory_outputs_latest_value_wins() {
        let sink = MemoryOutputs::new();
        sink.set_output("x", "1").unwrap();
        sink.set_output("x", "2").unwrap();
        assert_eq!(sink.output("x").as_deref(), Some("2"));
        assert!(MemoryOutputs::failing().set_output("x", "1").is_err());
    }
}
