//! Per-tick workflows an actor runs on its own initiative.

pub mod assign_vul_id;
pub mod close;
pub mod deployment;
pub mod develop_fix;
pub mod do_work;
pub mod embargo;
pub mod monitor_threats;
pub mod prioritize;
pub mod publication;
pub mod report_to_others;
pub mod validate;

pub use assign_vul_id::assign_vul_id;
pub use close::close_report;
pub use deployment::deployment;
pub use develop_fix::develop_fix;
pub use do_work::do_work;
pub use embargo::{embargo_management, propose_embargo, terminate_embargo};
pub use monitor_threats::monitor_threats;
pub use prioritize::prioritize_report;
pub use publication::{acquire_exploit, publication};
pub use report_to_others::maybe_report_to_others;
pub use validate::validate_report;

use crate::nodes::common::Spec;
use crate::nodes::report::rm_in;
use crate::rm::RmState;

fn in_rm_then(name: &str, state: RmState, next: Spec) -> Spec {
    Spec::sequence(name, vec![rm_in(state), next])
}

fn close_or(name: &str, next: Spec) -> Spec {
    Spec::fallback(name, vec![close_report(), next])
}

/// Report Management workflow, dispatched on the current RM state.
pub fn report_management() -> Spec {
    Spec::fallback(
        "ReportManagementBt",
        vec![
            rm_in(RmState::Start),
            rm_in(RmState::Closed),
            in_rm_then("RmReceived", RmState::Received, validate_report()),
            in_rm_then(
                "RmInvalid",
                RmState::Invalid,
                close_or("CloseOrValidate", validate_report()),
            ),
            in_rm_then("RmValid", RmState::Valid, prioritize_report()),
            in_rm_then(
                "RmDeferred",
                RmState::Deferred,
                close_or("CloseOrPrioritize", prioritize_report()),
            ),
            in_rm_then(
                "RmAccepted",
                RmState::Accepted,
                close_or(
                    "CloseOrWork",
                    Spec::sequence("PrioritizeAndWork", vec![prioritize_report(), do_work()]),
                ),
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::CvdRoles;
    use crate::state::ActorState;
    use cvd_bt::{BehaviorTree, NodeStatus, ScriptedPolicy};

    #[test]
    fn test_start_and_closed_are_idle() {
        for state in [RmState::Start, RmState::Closed] {
            let mut bb = ActorState::new("v", CvdRoles::VENDOR);
            bb.q_rm = state;
            let mut tree = BehaviorTree::new(report_management(), bb).unwrap();
            assert_eq!(tree.tick(), NodeStatus::Success);
            assert_eq!(tree.blackboard().q_rm, state);
            assert!(tree.blackboard().msgs_emitted_this_tick.is_empty());
        }
    }

    #[test]
    fn test_received_report_gets_validated() {
        let mut bb = ActorState::new("v", CvdRoles::VENDOR);
        bb.q_rm = RmState::Received;
        bb.set_policy(Box::new(
            ScriptedPolicy::new()
                .always("EnoughValidationInfo")
                .always("EvaluateReportCredibility")
                .always("EvaluateReportValidity"),
        ));
        let mut tree = BehaviorTree::new(report_management(), bb).unwrap();
        assert_eq!(tree.tick(), NodeStatus::Success);
        assert_eq!(tree.blackboard().q_rm, RmState::Valid);
    }
}
