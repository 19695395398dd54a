//! Report priority.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How urgently a participant intends to work a report. The SSVC-style
/// names map onto CVSS-like severities (`LOW`..`CRITICAL`).
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportPriority {
    #[default]
    Defer,
    Scheduled,
    OutOfCycle,
    Immediate,
}

impl ReportPriority {
    pub const ALL: [ReportPriority; 4] = [
        ReportPriority::Defer,
        ReportPriority::Scheduled,
        ReportPriority::OutOfCycle,
        ReportPriority::Immediate,
    ];

    /// Priorities that lead to the report being accepted.
    pub const ACTIVE: [ReportPriority; 3] = [
        ReportPriority::Scheduled,
        ReportPriority::OutOfCycle,
        ReportPriority::Immediate,
    ];

    pub fn severity(&self) -> &'static str {
        match self {
            ReportPriority::Defer => "LOW",
            ReportPriority::Scheduled => "MEDIUM",
            ReportPriority::OutOfCycle => "HIGH",
            ReportPriority::Immediate => "CRITICAL",
        }
    }

    pub fn is_defer(&self) -> bool {
        matches!(self, ReportPriority::Defer)
    }
}

impl fmt::Display for ReportPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportPriority::Defer => "DEFER",
            ReportPriority::Scheduled => "SCHEDULED",
            ReportPriority::OutOfCycle => "OUT_OF_CYCLE",
            ReportPriority::Immediate => "IMMEDIATE",
        };
        f.write_str(name)
    }
}
