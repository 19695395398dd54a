//! Watching for attacks, exploits and public reports.

use cvd_bt::{ALMOST_ALWAYS_FAIL, ALWAYS_SUCCEED, USUALLY_FAIL};

use crate::cs::CsFlag;
use crate::message::MessageType;
use crate::nodes::case::{cs_has, cs_lacks, to_attacks_observed, to_exploit_public, to_public_aware};
use crate::nodes::common::Spec;
use crate::nodes::messaging::emit;
use crate::workflow::embargo::terminate_embargo;

fn move_to_public() -> Spec {
    Spec::sequence(
        "MoveToCsPublic",
        vec![to_public_aware(), emit(MessageType::PublicAware)],
    )
}

fn monitor_external_events() -> Spec {
    Spec::parallel(
        "MonitorExternalEvents",
        1,
        vec![
            Spec::sequence(
                "NoticeAttack",
                vec![
                    Spec::fuzzer("MonitorAttacks", ALMOST_ALWAYS_FAIL),
                    cs_lacks(CsFlag::AttacksObserved),
                    to_attacks_observed(),
                    emit(MessageType::AttacksObserved),
                ],
            ),
            Spec::sequence(
                "NoticeExploit",
                vec![
                    Spec::fuzzer("MonitorExploits", ALMOST_ALWAYS_FAIL),
                    cs_lacks(CsFlag::ExploitPublic),
                    Spec::fallback(
                        "EnsureCsInPublic",
                        vec![cs_has(CsFlag::PublicAware), move_to_public()],
                    ),
                    to_exploit_public(),
                    emit(MessageType::ExploitPublished),
                ],
            ),
            Spec::sequence(
                "NoticePublicReport",
                vec![
                    Spec::fuzzer("MonitorPublicReports", USUALLY_FAIL),
                    cs_lacks(CsFlag::PublicAware),
                    move_to_public(),
                ],
            ),
        ],
    )
}

/// Any newly observed threat ends the embargo and is announced once.
/// Seeing nothing new still succeeds.
pub fn monitor_threats() -> Spec {
    Spec::fallback(
        "MonitorThreats",
        vec![
            Spec::sequence(
                "EndEmbargoIfEventsWarrant",
                vec![monitor_external_events(), terminate_embargo()],
            ),
            Spec::fuzzer("NoThreatsFound", ALWAYS_SUCCEED),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::CaseState;
    use crate::rm::RmState;
    use crate::roles::CvdRoles;
    use crate::state::ActorState;
    use cvd_bt::{BehaviorTree, NodeStatus, ScriptedPolicy};

    fn watcher(q_cs: CaseState, policy: ScriptedPolicy) -> ActorState {
        let mut bb = ActorState::new("f", CvdRoles::FINDER_REPORTER);
        bb.q_rm = RmState::Accepted;
        bb.q_cs = q_cs;
        bb.set_policy(Box::new(policy));
        bb
    }

    fn tick(bb: ActorState) -> (NodeStatus, ActorState) {
        let mut tree = BehaviorTree::new(monitor_threats(), bb).unwrap();
        let status = tree.tick();
        (status, tree.into_blackboard())
    }

    #[test]
    fn test_new_attack_is_announced() {
        let policy = ScriptedPolicy::new()
            .always("MonitorAttacks")
            .never("MonitorExploits")
            .never("MonitorPublicReports");
        let (status, bb) = tick(watcher(CaseState::initial(), policy));
        assert_eq!(status, NodeStatus::Success);
        assert!(bb.q_cs.attacks_observed());
        assert_eq!(bb.msgs_emitted_this_tick, vec![MessageType::AttacksObserved]);
    }

    #[test]
    fn test_exploit_makes_case_public() {
        let policy = ScriptedPolicy::new()
            .never("MonitorAttacks")
            .always("MonitorExploits")
            .never("MonitorPublicReports");
        let (_, bb) = tick(watcher(CaseState::initial(), policy));
        assert_eq!(bb.q_cs.to_string(), "vfdPXa");
        assert_eq!(
            bb.msgs_emitted_this_tick,
            vec![MessageType::PublicAware, MessageType::ExploitPublished]
        );
    }

    #[test]
    fn test_known_threats_are_not_reannounced() {
        let policy = ScriptedPolicy::new()
            .always("MonitorAttacks")
            .always("MonitorExploits")
            .always("MonitorPublicReports");
        let known = CaseState::PXA;
        let (status, bb) = tick(watcher(known, policy));
        assert_eq!(status, NodeStatus::Success);
        assert_eq!(bb.q_cs, known);
        assert_eq!(bb.q_cs_history.len(), 0);
        assert!(bb.msgs_emitted_this_tick.is_empty());
    }
}
