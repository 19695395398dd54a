//! Embargo Management conditions and transitions.

use crate::em::{EmState, EmTransition};
use crate::nodes::common::{in_any_state, in_state, not_in_state, state_change, Spec};

pub fn em_in(state: EmState) -> Spec {
    in_state(state)
}

pub fn em_not_in(state: EmState) -> Spec {
    not_in_state(state)
}

pub fn em_active_or_revise() -> Spec {
    in_any_state("ActiveOrRevise", &[EmState::Active, EmState::Revise])
}

pub fn em_none_or_exited() -> Spec {
    in_any_state("NoneOrExited", &[EmState::NoEmbargo, EmState::Exited])
}

pub fn em_none_or_proposed_or_revise() -> Spec {
    in_any_state(
        "NoneOrProposedOrRevise",
        &[EmState::NoEmbargo, EmState::Proposed, EmState::Revise],
    )
}

fn transition(name: &str, t: EmTransition) -> Spec {
    state_change(name, t.start_states(), t.target())
}

/// N|P -> P
pub fn to_proposed() -> Spec {
    transition("q_em_to_P", EmTransition::Propose)
}

/// P -> N
pub fn to_none() -> Spec {
    transition("q_em_to_N", EmTransition::Reject)
}

/// P|R -> A
pub fn to_active() -> Spec {
    transition("q_em_to_A", EmTransition::Accept)
}

/// A|R -> R
pub fn to_revise() -> Spec {
    transition("q_em_to_R", EmTransition::Revise)
}

/// R -> A, keeping the embargo already in force.
pub fn revise_to_active() -> Spec {
    transition("q_em_R_to_A", EmTransition::RejectRevision)
}

/// A|R -> X
pub fn to_exited() -> Spec {
    transition("q_em_to_X", EmTransition::Terminate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::CvdRoles;
    use crate::state::ActorState;
    use cvd_bt::{BehaviorTree, NodeStatus};

    fn tick_from(from: EmState, spec: Spec) -> (NodeStatus, EmState) {
        let mut bb = ActorState::new("a", CvdRoles::VENDOR);
        bb.q_em = from;
        let mut tree = BehaviorTree::new(spec, bb).unwrap();
        let status = tree.tick();
        (status, tree.blackboard().q_em)
    }

    #[test]
    fn test_exit_only_from_an_embargo() {
        assert_eq!(tick_from(EmState::Active, to_exited()), (NodeStatus::Success, EmState::Exited));
        assert_eq!(tick_from(EmState::Revise, to_exited()), (NodeStatus::Success, EmState::Exited));
        assert_eq!(
            tick_from(EmState::Proposed, to_exited()),
            (NodeStatus::Failure, EmState::Proposed)
        );
    }

    #[test]
    fn test_no_restart_after_exit() {
        for spec in [to_proposed(), to_active(), to_revise(), to_none()] {
            assert_eq!(tick_from(EmState::Exited, spec), (NodeStatus::Failure, EmState::Exited));
        }
    }

    #[test]
    fn test_revision_reject_returns_to_active() {
        assert_eq!(
            tick_from(EmState::Revise, revise_to_active()),
            (NodeStatus::Success, EmState::Active)
        );
        assert_eq!(
            tick_from(EmState::Proposed, revise_to_active()),
            (NodeStatus::Failure, EmState::Proposed)
        );
    }
}
