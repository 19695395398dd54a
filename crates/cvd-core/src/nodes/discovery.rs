//! Vulnerability discovery.

use cvd_bt::{ALWAYS_SUCCEED, PROBABLY_SUCCEED};

use crate::cs::CsFlag;
use crate::message::MessageType;
use crate::nodes::case::{cs_has, to_vendor_aware};
use crate::nodes::common::Spec;
use crate::nodes::messaging::emit;
use crate::nodes::report::{rm_not_in, to_received};
use crate::nodes::roles::role_is_not_vendor;
use crate::rm::RmState;

/// A finder that has not yet seen a report may discover the vulnerability
/// itself. Discovery moves RM to `Received`; a vendor that discovers it also
/// becomes vendor aware.
pub fn discover_vulnerability() -> Spec {
    Spec::fallback(
        "DiscoverVulnerabilityBt",
        vec![
            rm_not_in(RmState::Start),
            Spec::sequence(
                "FindVulnerability",
                vec![
                    Spec::check("HaveDiscoveryCapability", |bb| {
                        bb.capabilities.discover_vulnerability
                    }),
                    Spec::fuzzer("HaveDiscoveryPriority", ALWAYS_SUCCEED),
                    Spec::fuzzer("DiscoverVulnerability", PROBABLY_SUCCEED),
                    to_received(),
                    emit(MessageType::ReportSubmission),
                    Spec::fallback(
                        "MaybeBecomeVendorAware",
                        vec![
                            role_is_not_vendor(),
                            cs_has(CsFlag::VendorAware),
                            Spec::sequence(
                                "VendorDiscovery",
                                vec![to_vendor_aware(), emit(MessageType::VendorAware)],
                            ),
                        ],
                    ),
                ],
            ),
            Spec::fuzzer("NoVulFound", ALWAYS_SUCCEED),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::CvdRoles;
    use crate::state::ActorState;
    use cvd_bt::{BehaviorTree, NodeStatus, ScriptedPolicy};

    fn discover(role: CvdRoles) -> ActorState {
        let mut bb = ActorState::new("a", role);
        bb.set_policy(Box::new(ScriptedPolicy::new().always("DiscoverVulnerability")));
        let mut tree = BehaviorTree::new(discover_vulnerability(), bb).unwrap();
        assert_eq!(tree.tick(), NodeStatus::Success);
        tree.into_blackboard()
    }

    #[test]
    fn test_vendor_discovery_sets_vendor_aware() {
        let bb = discover(CvdRoles::VENDOR);
        assert_eq!(bb.q_rm, RmState::Received);
        assert!(bb.q_cs.vendor_aware());
        assert_eq!(
            bb.msgs_emitted_this_tick,
            vec![MessageType::ReportSubmission, MessageType::VendorAware]
        );
    }

    #[test]
    fn test_finder_discovery_leaves_case_state() {
        let bb = discover(CvdRoles::FINDER);
        assert_eq!(bb.q_rm, RmState::Received);
        assert!(!bb.q_cs.vendor_aware());
        assert_eq!(bb.msgs_emitted_this_tick, vec![MessageType::ReportSubmission]);
    }

    #[test]
    fn test_no_discovery_without_capability() {
        let mut bb = ActorState::new("c", CvdRoles::COORDINATOR);
        bb.capabilities.discover_vulnerability = false;
        bb.set_policy(Box::new(ScriptedPolicy::new().always("DiscoverVulnerability")));
        let mut tree = BehaviorTree::new(discover_vulnerability(), bb).unwrap();
        assert_eq!(tree.tick(), NodeStatus::Success);
        assert_eq!(tree.blackboard().q_rm, RmState::Start);
    }
}
