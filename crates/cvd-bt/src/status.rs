//! Node tick results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of ticking a node. No other value is ever a legal tick result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Success,
    Failure,
    Running,
}

impl NodeStatus {
    /// Map a leaf decision onto a status: `true` succeeds, `false` fails,
    /// `None` keeps running.
    pub fn from_outcome(outcome: Option<bool>) -> Self {
        match outcome {
            Some(true) => NodeStatus::Success,
            Some(false) => NodeStatus::Failure,
            None => NodeStatus::Running,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, NodeStatus::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, NodeStatus::Failure)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, NodeStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Success => "success",
            NodeStatus::Failure => "failure",
            NodeStatus::Running => "running",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
