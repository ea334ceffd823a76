//! What started a run. Carried through to the report; the gate and the runner
//! behave identically for every trigger.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Trigger {
    Manual,
    Scheduled { cron: String },
}

impl Trigger {
    #[must_use]
    pub fn scheduled(cron: impl Into<String>) -> Self {
        Self::Scheduled { cron: cron.into() }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Scheduled { cron } => write!(f, "schedule ({cron})"),
        }
    }
}

/// Trigger kind as named on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Manual,
    Schedule,
}

impl TriggerKind {
    /// Attach the configured cron expression where one applies.
    #[must_use]
    pub fn into_trigger(self, cron: &str) -> Trigger {
        match self {
            Self::Manual => Trigger::Manual,
            Self::Schedule => Trigger::scheduled(cron),
        }
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" | "workflow_dispatch" => Ok(Self::Manual),
            "schedule" => Ok(Self::Schedule),
            other => Err(format!("unknown trigger `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_workflow_event_names() {
        assert_eq!("workflow_dispatch".parse::<TriggerKind>(), Ok(TriggerKind::Manual));
        assert_eq!("schedule".parse::<TriggerKind>(), Ok(TriggerKind::Schedule));
        assert!("push".parse::<TriggerKind>().is_err());
    }

    #[test]
    fn schedule_carries_cron() {
        let trigger = TriggerKind::Schedule.into_trigger("0 3 * * *");
        assert_eq!(trigger.to_string(), "schedule (0 3 * * *)");
        let json = serde_json::to_value(&trigger).unwrap();
        assert_eq!(json["kind"], "scheduled");
        assert_eq!(json["cron"], "0 3 * * *");
    }
}
