//! Embargo Management states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CvdError;

/// Case-wide embargo state. Each actor holds a local copy that may lag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmState {
    #[default]
    NoEmbargo,
    Proposed,
    Active,
    Revise,
    Exited,
}

impl EmState {
    pub const ALL: [EmState; 5] = [
        EmState::NoEmbargo,
        EmState::Proposed,
        EmState::Active,
        EmState::Revise,
        EmState::Exited,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            EmState::NoEmbargo => "N",
            EmState::Proposed => "P",
            EmState::Active => "A",
            EmState::Revise => "R",
            EmState::Exited => "X",
        }
    }

    pub fn is_exited(&self) -> bool {
        matches!(self, EmState::Exited)
    }

    /// An embargo is in force (possibly under revision).
    pub fn is_active_or_revise(&self) -> bool {
        matches!(self, EmState::Active | EmState::Revise)
    }
}

/// The guarded embargo transitions. Each lists its start states and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmTransition {
    Propose,
    Reject,
    Accept,
    Revise,
    RejectRevision,
    Terminate,
}

impl EmTransition {
    pub fn start_states(&self) -> &'static [EmState] {
        match self {
            EmTransition::Propose => &[EmState::NoEmbargo, EmState::Proposed],
            EmTransition::Reject => &[EmState::Proposed],
            EmTransition::Accept => &[EmState::Proposed, EmState::Revise],
            EmTransition::Revise => &[EmState::Active, EmState::Revise],
            EmTransition::RejectRevision => &[EmState::Revise],
            EmTransition::Terminate => &[EmState::Active, EmState::Revise],
        }
    }

    pub fn target(&self) -> EmState {
        match self {
            EmTransition::Propose => EmState::Proposed,
            EmTransition::Reject => EmState::NoEmbargo,
            EmTransition::Accept | EmTransition::RejectRevision => EmState::Active,
            EmTransition::Revise => EmState::Revise,
            EmTransition::Terminate => EmState::Exited,
        }
    }

    pub fn applies_to(&self, from: EmState) -> bool {
        from == self.target() || self.start_states().contains(&from)
    }
}

impl fmt::Display for EmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for EmState {
    type Err = CvdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmState::ALL
            .into_iter()
            .find(|state| state.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| CvdError::UnknownState(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exited_is_terminal() {
        let transitions = [
            EmTransition::Propose,
            EmTransition::Reject,
            EmTransition::Accept,
            EmTransition::Revise,
            EmTransition::RejectRevision,
        ];
        for t in transitions {
            assert!(!t.applies_to(EmState::Exited), "{t:?} from X");
        }
        assert!(EmTransition::Terminate.applies_to(EmState::Exited));
    }

    #[test]
    fn test_terminate_needs_an_embargo() {
        assert!(!EmTransition::Terminate.applies_to(EmState::NoEmbargo));
        assert!(!EmTransition::Terminate.applies_to(EmState::Proposed));
        assert!(EmTransition::Terminate.applies_to(EmState::Revise));
    }
}
