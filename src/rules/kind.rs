// src/rules/kind.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Built-in stage kinds understood by [`StandardRules`](crate::rules::StandardRules).
///
/// The name says when a stage of that kind may activate, judged on the
/// stage's forward predecessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardKind {
    /// Always activates.
    Start,
    /// Activates once every predecessor resolved, whatever the outcome.
    End,
    AllSucceeded,
    AllFailed,
    AnySucceeded,
    AnyFailed,
}

impl StandardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StandardKind::Start => "start",
            StandardKind::End => "end",
            StandardKind::AllSucceeded => "all_succeeded",
            StandardKind::AllFailed => "all_failed",
            StandardKind::AnySucceeded => "any_succeeded",
            StandardKind::AnyFailed => "any_failed",
        }
    }
}

impl fmt::Display for StandardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "start" => Ok(StandardKind::Start),
            "end" => Ok(StandardKind::End),
            "all_succeeded" => Ok(StandardKind::AllSucceeded),
            "all_failed" => Ok(StandardKind::AllFailed),
            "any_succeeded" => Ok(StandardKind::AnySucceeded),
            "any_failed" => Ok(StandardKind::AnyFailed),
            other => Err(format!("invalid stage kind: {other}")),
        }
    }
}
