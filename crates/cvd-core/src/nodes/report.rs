//! Report Management conditions and transitions.

use crate::nodes::common::{in_any_state, in_state, not_in_state, state_change, Spec};
use crate::rm::RmState;

pub fn rm_in(state: RmState) -> Spec {
    in_state(state)
}

pub fn rm_not_in(state: RmState) -> Spec {
    not_in_state(state)
}

pub fn rm_closable() -> Spec {
    in_any_state("Closable", &RmState::CLOSABLE)
}

pub fn rm_start_or_closed() -> Spec {
    in_any_state("StartOrClosed", &[RmState::Start, RmState::Closed])
}

fn to(state: RmState) -> Spec {
    state_change(format!("q_rm_to_{}", state.code()), state.allowed_from(), state)
}

pub fn to_received() -> Spec {
    to(RmState::Received)
}

pub fn to_invalid() -> Spec {
    to(RmState::Invalid)
}

pub fn to_valid() -> Spec {
    to(RmState::Valid)
}

pub fn to_deferred() -> Spec {
    to(RmState::Deferred)
}

pub fn to_accepted() -> Spec {
    to(RmState::Accepted)
}

pub fn to_closed() -> Spec {
    to(RmState::Closed)
}

/// Every RM transition node, paired with its target.
pub fn all_transitions() -> Vec<(RmState, Spec)> {
    vec![
        (RmState::Received, to_received()),
        (RmState::Invalid, to_invalid()),
        (RmState::Valid, to_valid()),
        (RmState::Deferred, to_deferred()),
        (RmState::Accepted, to_accepted()),
        (RmState::Closed, to_closed()),
    ]
}
