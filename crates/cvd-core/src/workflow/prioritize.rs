//! Report prioritisation.
//!
//! Priority is re-evaluated each time the report is looked at, but the
//! willingness to change it halves with every change already made.

use cvd_bt::{
    Blackboard, Decision, Weight, ALMOST_ALWAYS_SUCCEED, ALWAYS_SUCCEED, PROBABLY_SUCCEED,
    USUALLY_FAIL, USUALLY_SUCCEED,
};
use rand::seq::SliceRandom;
use tracing::debug;

use crate::message::MessageType;
use crate::nodes::common::{in_any_state, Spec};
use crate::nodes::messaging::emit;
use crate::nodes::report::{rm_in, to_accepted, to_deferred};
use crate::priority::ReportPriority;
use crate::rm::RmState;
use crate::state::ActorState;

fn evaluate_priority(bb: &mut ActorState) -> Option<bool> {
    let willingness = 0.5_f64.powi(bb.prioritization_count as i32);
    let willing = bb.decide(&Decision::new("WillingToReprioritize", Weight::Chance(willingness)));
    if willing != Some(true) {
        return Some(true);
    }

    let chosen = if bb.decide(&Decision::new("DeferReport", USUALLY_FAIL)) == Some(true) {
        ReportPriority::Defer
    } else {
        ReportPriority::ACTIVE
            .choose(bb.rng())
            .copied()
            .unwrap_or(ReportPriority::Scheduled)
    };

    if chosen != bb.priority {
        debug!(actor = %bb.name, from = %bb.priority, to = %chosen, "Reprioritized");
        bb.priority = chosen;
        bb.prioritization_count += 1;
    }
    Some(true)
}

fn consider_gathering_more_info() -> Spec {
    Spec::sequence(
        "ConsiderGatheringMorePrioritizationInfo",
        vec![
            in_any_state("DeferredOrAccepted", &[RmState::Deferred, RmState::Accepted]),
            Spec::fallback(
                "EnsureAdequatePrioritizationInfo",
                vec![
                    Spec::fuzzer("EnoughPrioritizationInfo", USUALLY_SUCCEED),
                    Spec::sequence(
                        "GetMorePrioritizationInfo",
                        vec![
                            Spec::fuzzer("GatherPrioritizationInfo", ALMOST_ALWAYS_SUCCEED),
                            Spec::fuzzer("NoNewPrioritizationInfo", PROBABLY_SUCCEED),
                        ],
                    ),
                ],
            ),
        ],
    )
}

fn decide_if_further_action_needed() -> Spec {
    Spec::sequence(
        "DecideIfFurtherActionNeeded",
        vec![
            in_any_state(
                "ValidOrDeferredOrAccepted",
                &[RmState::Valid, RmState::Deferred, RmState::Accepted],
            ),
            Spec::action("EvaluatePriority", evaluate_priority),
            Spec::check("PriorityNotDefer", |bb| !bb.priority.is_defer()),
            Spec::fallback(
                "EnsureRmAccepted",
                vec![
                    rm_in(RmState::Accepted),
                    Spec::sequence(
                        "TransitionToRmAccepted",
                        vec![
                            Spec::fuzzer("OnAccept", ALWAYS_SUCCEED),
                            to_accepted(),
                            emit(MessageType::ReportAccepted),
                        ],
                    ),
                ],
            ),
        ],
    )
}

fn ensure_deferred() -> Spec {
    Spec::fallback(
        "EnsureRmDeferred",
        vec![
            rm_in(RmState::Deferred),
            Spec::sequence(
                "TransitionToRmDeferred",
                vec![
                    Spec::fuzzer("OnDefer", ALWAYS_SUCCEED),
                    to_deferred(),
                    emit(MessageType::ReportDeferred),
                ],
            ),
        ],
    )
}

/// Accept a report whose priority is above `Defer`, otherwise defer it.
pub fn prioritize_report() -> Spec {
    Spec::fallback(
        "RMPrioritizeBt",
        vec![
            consider_gathering_more_info(),
            decide_if_further_action_needed(),
            ensure_deferred(),
        ],
    )
}
