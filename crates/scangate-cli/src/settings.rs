use clap::ArgMatches;
use scangate_core::config::ScanGateConfig;
use std::path::PathBuf;

/// Command-line values that override the config file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Overrides {
    pub(crate) workdir: Option<PathBuf>,
    pub(crate) reference: Option<String>,
    pub(crate) repository: Option<String>,
    pub(crate) log_level: Option<String>,
    pub(crate) log_json: bool,
    pub(crate) quiet: bool,
}

impl Overrides {
    /// Collect overrides from the top-level matches and, when present, the subcommand's.
    ///
    /// Global flags may be given on either side of the subcommand name.
    pub(crate) fn from_matches(global: &ArgMatches, sub: Option<&ArgMatches>) -> Self {
        let flag = |id: &str| global.get_flag(id) || sub.is_some_and(|m| m.get_flag(id));
        let mut overrides = Self {
            log_level: sub
                .and_then(|m| m.get_one::<String>("log-level"))
                .or_else(|| global.get_one::<String>("log-level"))
                .cloned(),
            log_json: flag("log-json"),
            quiet: flag("quiet"),
            ..Self::default()
        };
        if let Some(sub) = sub {
            if sub.try_contains_id("workdir").unwrap_or(false) {
                overrides.workdir = sub.get_one::<PathBuf>("workdir").cloned();
                overrides.reference = sub.get_one::<String>("ref").cloned();
                overrides.repository = sub.get_one::<String>("repository").cloned();
            }
        }
        overrides
    }

    /// Apply on top of `config`; flags win over file values.
    pub(crate) fn apply(self, config: &mut ScanGateConfig) {
        if let Some(workdir) = self.workdir {
            config.checkout.workdir = workdir;
        }
        if let Some(reference) = self.reference {
            config.checkout.reference = reference;
        }
        if self.repository.is_some() {
            config.checkout.repository = self.repository;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if self.log_json {
            config.logging.json = true;
        }
        if self.quiet {
            config.logging.quiet = true;
        }
    }
}
