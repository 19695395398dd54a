//! Report Management states.
//!
//! Each participant tracks its own RM state for a report. Only the forward
//! edges listed in [`RmState::allowed_from`] exist and `Closed` is terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CvdError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RmState {
    #[default]
    Start,
    Received,
    Invalid,
    Valid,
    Deferred,
    Accepted,
    Closed,
}

impl RmState {
    pub const ALL: [RmState; 7] = [
        RmState::Start,
        RmState::Received,
        RmState::Invalid,
        RmState::Valid,
        RmState::Deferred,
        RmState::Accepted,
        RmState::Closed,
    ];

    /// States from which a report may be closed.
    pub const CLOSABLE: [RmState; 3] = [RmState::Invalid, RmState::Deferred, RmState::Accepted];

    pub const UNCLOSED: [RmState; 6] = [
        RmState::Start,
        RmState::Received,
        RmState::Invalid,
        RmState::Valid,
        RmState::Deferred,
        RmState::Accepted,
    ];

    pub const ACTIVE: [RmState; 3] = [RmState::Received, RmState::Valid, RmState::Accepted];

    /// Start states of the transition into `self`.
    pub fn allowed_from(&self) -> &'static [RmState] {
        match self {
            RmState::Start => &[],
            RmState::Received => &[RmState::Start],
            RmState::Invalid => &[RmState::Received],
            RmState::Valid => &[RmState::Received, RmState::Invalid],
            RmState::Deferred => &[RmState::Valid, RmState::Accepted],
            RmState::Accepted => &[RmState::Valid, RmState::Deferred],
            RmState::Closed => &[RmState::Invalid, RmState::Deferred, RmState::Accepted],
        }
    }

    /// Whether a transition request from `self` to `to` would succeed.
    /// Requesting the current state is a no-op success.
    pub fn can_transition_to(&self, to: RmState) -> bool {
        *self == to || to.allowed_from().contains(self)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, RmState::Closed)
    }

    pub fn code(&self) -> &'static str {
        match self {
            RmState::Start => "S",
            RmState::Received => "R",
            RmState::Invalid => "I",
            RmState::Valid => "V",
            RmState::Deferred => "D",
            RmState::Accepted => "A",
            RmState::Closed => "C",
        }
    }
}

impl fmt::Display for RmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RmState {
    type Err = CvdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RmState::ALL
            .into_iter()
            .find(|state| state.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| CvdError::UnknownState(s.to_string()))
    }
}
