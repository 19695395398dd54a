//! Building blocks shared by the RM and EM node sets.

use std::fmt;

use cvd_bt::NodeSpec;
use tracing::debug;

use crate::em::EmState;
use crate::rm::RmState;
use crate::state::ActorState;

/// Descriptor type for every protocol sub-tree.
pub type Spec = NodeSpec<ActorState>;

/// A state axis stored on the blackboard with an append-only history.
pub trait ProtocolState: Copy + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    const AXIS: &'static str;

    fn current(bb: &ActorState) -> Self;

    fn store(bb: &mut ActorState, value: Self);

    fn history(bb: &mut ActorState) -> &mut Vec<Self>;
}

impl ProtocolState for RmState {
    const AXIS: &'static str = "RM";

    fn current(bb: &ActorState) -> Self {
        bb.q_rm
    }

    fn store(bb: &mut ActorState, value: Self) {
        bb.q_rm = value;
    }

    fn history(bb: &mut ActorState) -> &mut Vec<Self> {
        &mut bb.q_rm_history
    }
}

impl ProtocolState for EmState {
    const AXIS: &'static str = "EM";

    fn current(bb: &ActorState) -> Self {
        bb.q_em
    }

    fn store(bb: &mut ActorState, value: Self) {
        bb.q_em = value;
    }

    fn history(bb: &mut ActorState) -> &mut Vec<Self> {
        &mut bb.q_em_history
    }
}

/// Succeeds when the axis holds `state`.
pub fn in_state<S: ProtocolState>(state: S) -> Spec {
    Spec::check(format!("{}inState{:?}", S::AXIS, state), move |bb| {
        S::current(bb) == state
    })
}

/// Succeeds when the axis does not hold `state`.
pub fn not_in_state<S: ProtocolState>(state: S) -> Spec {
    Spec::check(format!("{}notInState{:?}", S::AXIS, state), move |bb| {
        S::current(bb) != state
    })
}

/// Succeeds when the axis holds any of `states`.
pub fn in_any_state<S: ProtocolState>(name: &str, states: &'static [S]) -> Spec {
    Spec::check(format!("{}inState{name}", S::AXIS), move |bb| {
        states.contains(&S::current(bb))
    })
}

fn set_state<S: ProtocolState>(target: S) -> Spec {
    Spec::action(format!("Set{}{:?}", S::AXIS, target), move |bb| {
        let from = S::current(bb);
        if from != target {
            S::store(bb, target);
            S::history(bb).push(target);
            debug!(actor = %bb.name, axis = S::AXIS, %from, to = %target, "State change");
        }
        Some(true)
    })
}

/// Guarded transition into `target`.
///
/// Already at `target`: success with no change. Current state in `start`:
/// move and record history. Anything else: failure, state untouched.
pub fn state_change<S: ProtocolState>(name: impl Into<String>, start: &'static [S], target: S) -> Spec {
    let name = name.into();
    Spec::fallback(
        name.clone(),
        vec![
            in_state(target),
            Spec::sequence(
                format!("{name}_Transition"),
                vec![
                    Spec::check(format!("{name}_AllowedStart"), move |bb| {
                        start.contains(&S::current(bb))
                    }),
                    set_state(target),
                ],
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::CvdRoles;
    use cvd_bt::{BehaviorTree, NodeStatus};

    fn run(spec: Spec, bb: ActorState) -> (NodeStatus, ActorState) {
        let mut tree = BehaviorTree::new(spec, bb).unwrap();
        let status = tree.tick();
        (status, tree.into_blackboard())
    }

    #[test]
    fn test_state_change_moves_and_records() {
        let spec = state_change("q_rm_to_R", &[RmState::Start], RmState::Received);
        let (status, bb) = run(spec, ActorState::new("a", CvdRoles::VENDOR));
        assert_eq!(status, NodeStatus::Success);
        assert_eq!(bb.q_rm, RmState::Received);
        assert_eq!(bb.q_rm_history, vec![RmState::Received]);
    }

    #[test]
    fn test_state_change_at_target_is_noop() {
        let mut bb = ActorState::new("a", CvdRoles::VENDOR);
        bb.q_rm = RmState::Received;
        let spec = state_change("q_rm_to_R", &[RmState::Start], RmState::Received);
        let (status, bb) = run(spec, bb);
        assert_eq!(status, NodeStatus::Success);
        assert!(bb.q_rm_history.is_empty());
    }

    #[test]
    fn test_state_change_from_wrong_start_fails_cleanly() {
        let mut bb = ActorState::new("a", CvdRoles::VENDOR);
        bb.q_em = EmState::Exited;
        let spec = state_change("q_em_to_P", &[EmState::NoEmbargo, EmState::Proposed], EmState::Proposed);
        let (status, bb) = run(spec, bb);
        assert_eq!(status, NodeStatus::Failure);
        assert_eq!(bb.q_em, EmState::Exited);
        assert!(bb.q_em_history.is_empty());
    }
}
