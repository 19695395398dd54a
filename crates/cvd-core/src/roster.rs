//! The case roster: who is in the case and who might yet be notified.

use serde::{Deserialize, Serialize};

use crate::cs::CaseState;
use crate::em::EmState;
use crate::rm::RmState;
use crate::roles::CvdRoles;

/// What one actor knows about another party to the case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub name: String,
    pub role: CvdRoles,
    pub q_rm: RmState,
    pub q_em: EmState,
    pub q_cs: CaseState,
}

impl Participant {
    pub fn new(name: impl Into<String>, role: CvdRoles) -> Self {
        Self {
            name: name.into(),
            role,
            q_rm: RmState::Start,
            q_em: EmState::NoEmbargo,
            q_cs: CaseState::initial(),
        }
    }

    /// Not yet told about the report.
    pub fn is_unnotified(&self) -> bool {
        self.q_rm == RmState::Start
    }
}

/// Parties already engaged plus candidates still to be notified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseRoster {
    pub participants: Vec<Participant>,
    pub potential_participants: Vec<Participant>,
    injected: usize,
}

impl CaseRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a newly identified candidate with a generated name such as
    /// `vendor-3`.
    pub fn inject(&mut self, kind: &str, role: CvdRoles) -> &Participant {
        self.injected += 1;
        let name = format!("{}-{}", kind.to_ascii_lowercase(), self.injected);
        self.potential_participants.push(Participant::new(name, role));
        &self.potential_participants[self.potential_participants.len() - 1]
    }

    pub fn add_potential(&mut self, participant: Participant) {
        self.potential_participants.push(participant);
    }

    pub fn potential(&self, name: &str) -> Option<&Participant> {
        self.potential_participants.iter().find(|p| p.name == name)
    }

    pub fn potential_mut(&mut self, name: &str) -> Option<&mut Participant> {
        self.potential_participants.iter_mut().find(|p| p.name == name)
    }

    /// Drop a candidate. Returns the removed record, if it was present.
    pub fn remove_potential(&mut self, name: &str) -> Option<Participant> {
        let index = self
            .potential_participants
            .iter()
            .position(|p| p.name == name)?;
        Some(self.potential_participants.remove(index))
    }

    /// Move a candidate into the case proper.
    pub fn engage(&mut self, name: &str) -> Option<&Participant> {
        let participant = self.remove_potential(name)?;
        self.participants.push(participant);
        self.participants.last()
    }

    pub fn is_participant(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_generates_unique_names() {
        let mut roster = CaseRoster::new();
        let first = roster.inject("Vendor", CvdRoles::VENDOR).name.clone();
        let second = roster.inject("Vendor", CvdRoles::VENDOR).name.clone();
        assert_eq!(first, "vendor-1");
        assert_ne!(first, second);
        assert_eq!(roster.potential_participants.len(), 2);
    }

    #[test]
    fn test_engage_moves_candidate() {
        let mut roster = CaseRoster::new();
        let name = roster.inject("Coordinator", CvdRoles::COORDINATOR).name.clone();
        assert!(roster.engage(&name).is_some());
        assert!(roster.is_participant(&name));
        assert!(roster.potential(&name).is_none());
        assert!(roster.engage(&name).is_none());
    }
}
