use std::str::FromStr;
use serde::Deserialize;

/// How a stage picks a delay when several predecessors each impose one.
///
/// - `ShortestDelay`: the smallest qualifying incoming-link delay wins
///   (default behaviour).
/// - `LongestDelay`: the largest qualifying incoming-link delay wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum DelayPolicy {
    #[serde(rename = "shortest")]
    ShortestDelay,
    #[serde(rename = "longest")]
    LongestDelay,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        DelayPolicy::ShortestDelay
    }
}

impl FromStr for DelayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shortest" => Ok(DelayPolicy::ShortestDelay),
            "longest" => Ok(DelayPolicy::LongestDelay),
            other => Err(format!(
                "invalid delay policy: {other} (expected \"shortest\" or \"longest\")"
            )),
        }
    }
}

/// How a scripted task reaches its outcome in the simulation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// The task finishes as soon as it is materialised.
    Immediate,
    /// The task stays `Ready` for a number of ticks before finishing.
    Deferred,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Immediate
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(ExecutionMode::Immediate),
            "deferred" => Ok(ExecutionMode::Deferred),
            other => Err(format!(
                "invalid execution mode: {other} (expected \"immediate\" or \"deferred\")"
            )),
        }
    }
}
