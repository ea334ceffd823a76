use scangate_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Filter directive for the configured logging options; `RUST_LOG` takes precedence.
pub(crate) fn filter_directive(config: &LoggingConfig) -> String {
    if config.quiet {
        "warn".to_string()
    } else {
        config.level.clone()
    }
}

/// Install the global subscriber. Logs go to stderr; stdout carries notices and reports.
pub(crate) fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_level() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            json: false,
            quiet: true,
        };
        assert_eq!(filter_directive(&config), "warn");
    }

    #[test]
    fn level_passes_through() {
        let config = LoggingConfig::default();
        assert_eq!(filter_directive(&config), "info");
    }
}
