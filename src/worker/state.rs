//! Worker lifecycle states.

use std::fmt;

use serde::Serialize;

/// Lifecycle of one worker generation.
///
/// `Installing -> Waiting -> Active -> Redundant`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Pre-warming the static partition
    Installing,
    /// Installed, not yet controlling clients
    Waiting,
    /// Old generations swept, clients claimed
    Active,
    /// Replaced or shut down
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
