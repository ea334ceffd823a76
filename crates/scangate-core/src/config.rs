//! Configuration
//!
//! Precedence, lowest first: built-in defaults, the TOML config file, then
//! command-line overrides applied by the binary. The credential is never part
//! of the configuration; only the name of the variable that carries it is.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is named
pub const DEFAULT_CONFIG_FILE: &str = "scangate.toml";

/// Full pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanGateConfig {
    pub gate: GateConfig,
    pub checkout: CheckoutConfig,
    pub prepare: PrepareConfig,
    pub tool: ToolConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Environment variable holding the credential
    pub credential_env: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            credential_env: "TICSAUTHTOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckoutConfig {
    /// Remote to clone when `workdir` is not yet a checkout
    pub repository: Option<String>,
    /// Reference that triggered the run
    pub reference: String,
    pub workdir: PathBuf,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            repository: None,
            reference: "HEAD".to_string(),
            workdir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrepareConfig {
    /// Program followed by its arguments
    pub command: Vec<String>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            command: vec!["make".to_string(), "coverage".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub program: String,
    pub mode: String,
    pub project: String,
    pub viewer_url: String,
    pub install_if_absent: bool,
    /// File scope; `.` means the entire tree
    pub filelist: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "tics-client".to_string(),
            mode: "qserver".to_string(),
            project: "landscape-client".to_string(),
            viewer_url: "https://canonical.tiobe.com/tiobeweb/TICS/api/cfg?name=default"
                .to_string(),
            install_if_absent: true,
            filelist: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Five-field cron expression for the daily run
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: "0 3 * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    /// Only warnings and errors reach the log
    pub quiet: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            quiet: false,
        }
    }
}

impl ScanGateConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load configuration from a file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Resolve the config file to use.
    ///
    /// An explicitly named file must exist. Without one, `scangate.toml` in
    /// `cwd` is used when present, otherwise the defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load_from_path(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gate.credential_env.is_empty() {
            return Err(ConfigError::invalid(
                "gate.credential_env",
                "must name an environment variable",
            ));
        }
        if self.prepare.command.first().map_or(true, String::is_empty) {
            return Err(ConfigError::invalid(
                "prepare.command",
                "must contain at least a program",
            ));
        }
        if self.tool.program.is_empty() {
            return Err(ConfigError::invalid("tool.program", "must not be empty"));
        }
        if self.tool.project.is_empty() {
            return Err(ConfigError::invalid("tool.project", "must not be empty"));
        }
        if !(self.tool.viewer_url.starts_with("https://")
            || self.tool.viewer_url.starts_with("http://"))
        {
            return Err(ConfigError::invalid(
                "tool.viewer_url",
                format!("expected an http(s) URL, got `{}`", self.tool.viewer_url),
            ));
        }
        if self.checkout.reference.is_empty() {
            return Err(ConfigError::invalid("checkout.reference", "must not be empty"));
        }
        let fields = self.schedule.cron.split_whitespace().count();
        if fields != 5 {
            return Err(ConfigError::invalid(
                "schedule.cron",
                format!("expected 5 fields, found {fields}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = ScanGateConfig::new();
        config.validate().unwrap();
        assert_eq!(config.tool.mode, "qserver");
        assert_eq!(config.tool.filelist, ".");
        assert!(config.tool.install_if_absent);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let text = r#"
            [tool]
            project = "other-project"

            [checkout]
            reference = "refs/heads/main"
        "#;
        let config = ScanGateConfig::from_toml_str(text, Path::new("inline")).unwrap();
        assert_eq!(config.tool.project, "other-project");
        assert_eq!(config.tool.mode, "qserver");
        assert_eq!(config.checkout.reference, "refs/heads/main");
        assert_eq!(config.gate, GateConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = "[tool]\ntoken = \"abc\"\n";
        let err = ScanGateConfig::from_toml_str(text, Path::new("inline")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn empty_prepare_command_is_invalid() {
        let mut config = ScanGateConfig::new();
        config.prepare.command.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("prepare.command"));
    }

    #[test]
    fn bad_cron_is_invalid() {
        let mut config = ScanGateConfig::new();
        config.schedule.cron = "@daily".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn viewer_url_needs_scheme() {
        let mut config = ScanGateConfig::new();
        config.tool.viewer_url = "canonical.tiobe.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanGateConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config, ScanGateConfig::default());
    }

    #[test]
    fn discover_reads_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();
        let config = ScanGateConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn discover_requires_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = ScanGateConfig::discover(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
