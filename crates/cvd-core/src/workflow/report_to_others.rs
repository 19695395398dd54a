//! Reporting to other parties.
//!
//! Finds further vendors, coordinators and others who should hear about the
//! vulnerability, then notifies them one at a time. Each notification
//! attempt costs one unit of the reporting effort budget.

use cvd_bt::{
    Blackboard, ALMOST_ALWAYS_FAIL, ALMOST_CERTAINLY_FAIL, PROBABLY_SUCCEED,
    UNIFORM_SUCCEED_FAIL, USUALLY_FAIL, USUALLY_SUCCEED,
};
use rand::seq::SliceRandom;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::message::{Message, MessageType};
use crate::nodes::common::Spec;
use crate::nodes::embargo::{em_active_or_revise, em_none_or_proposed_or_revise};
use crate::rm::RmState;
use crate::roles::CvdRoles;
use crate::state::ActorState;

fn identify(kind: &'static str, more: cvd_bt::Weight, role: CvdRoles) -> Spec {
    Spec::force_success(
        format!("Identify{kind}s"),
        Spec::sequence(
            format!("Identify{kind}sSequence"),
            vec![
                Spec::fuzzer(format!("More{kind}s"), more),
                Spec::action(format!("Inject{kind}"), move |bb| {
                    let name = bb.case.inject(kind, role).name.clone();
                    debug!(actor = %bb.name, participant = %name, "Identified potential participant");
                    Some(true)
                }),
            ],
        ),
    )
}

fn identify_participants() -> Spec {
    Spec::fallback(
        "IdentifyParticipants",
        vec![
            Spec::fuzzer("AllPartiesKnown", UNIFORM_SUCCEED_FAIL),
            Spec::sequence(
                "IdentifyPotentialCaseParticipants",
                vec![
                    identify("Vendor", USUALLY_FAIL, CvdRoles::VENDOR),
                    identify("Coordinator", ALMOST_ALWAYS_FAIL, CvdRoles::COORDINATOR),
                    identify("Other", ALMOST_ALWAYS_FAIL, CvdRoles::OTHER),
                ],
            ),
        ],
    )
}

/// Keep the recipient already being worked on, or pick a fresh one.
fn choose_recipient(bb: &mut ActorState) -> Option<bool> {
    if let Some(current) = &bb.currently_notifying {
        if bb.case.potential(current).is_some() {
            return Some(true);
        }
    }
    let names: Vec<String> = bb
        .case
        .potential_participants
        .iter()
        .map(|p| p.name.clone())
        .collect();
    let chosen = names.choose(bb.rng()).cloned();
    let found = chosen.is_some();
    bb.currently_notifying = chosen;
    Some(found)
}

/// Prune recipients that already have the report.
fn recipient_already_notified(bb: &ActorState) -> bool {
    match &bb.currently_notifying {
        Some(name) => bb
            .case
            .potential(name)
            .map_or(true, |p| !p.is_unnotified()),
        None => false,
    }
}

fn remove_recipient(bb: &mut ActorState) -> Option<bool> {
    let Some(current) = bb.currently_notifying.take() else {
        return Some(true);
    };
    debug!(actor = %bb.name, participant = %current, "Removing from potential participants");
    if bb.case.remove_potential(&current).is_none() {
        warn!(actor = %bb.name, participant = %current, "Not in potential participants list");
    }
    Some(true)
}

fn prune_recipients() -> Spec {
    Spec::sequence(
        "PruneRecipients",
        vec![
            Spec::fallback(
                "DecideWhetherToPruneRecipient",
                vec![
                    Spec::check("RcptNotInQrmS", recipient_already_notified),
                    Spec::fuzzer("RecipientEffortExceeded", ALMOST_CERTAINLY_FAIL),
                ],
            ),
            Spec::action("RemoveRecipient", remove_recipient),
        ],
    )
}

fn ensure_ok_to_notify() -> Spec {
    Spec::fallback(
        "EnsureOkToNotify",
        vec![
            em_none_or_proposed_or_revise(),
            Spec::sequence(
                "EnsureRcptPolicyCompatibleWithExistingEmbargo",
                vec![
                    em_active_or_revise(),
                    Spec::fuzzer("PolicyCompatible", PROBABLY_SUCCEED),
                ],
            ),
        ],
    )
}

/// Send the initial report straight to the recipient's inbox.
fn report_to_new_participant(bb: &mut ActorState) -> Option<bool> {
    let Some(recipient) = bb.currently_notifying.clone() else {
        warn!(actor = %bb.name, "No recipient selected");
        return Some(false);
    };
    bb.reporting_effort_budget = bb.reporting_effort_budget.saturating_sub(1);
    let report = Message::new(MessageType::ReportSubmission, bb.name.clone())
        .to(recipient)
        .with_body(json!({ "report": "Initial report" }));
    bb.send(report);
    Some(true)
}

/// The newcomer inherits the case's embargo state and only the public half
/// of the case state.
fn bring_new_participant_up_to_speed(bb: &mut ActorState) -> Option<bool> {
    let Some(name) = bb.currently_notifying.clone() else {
        return Some(false);
    };
    let (q_em, public) = (bb.q_em, bb.q_cs.public_part());
    match bb.case.potential_mut(&name) {
        Some(participant) => {
            participant.q_em = q_em;
            participant.q_cs = public;
            Some(true)
        }
        None => Some(false),
    }
}

fn connect_new_participant_to_case(bb: &mut ActorState) -> Option<bool> {
    let Some(name) = bb.currently_notifying.take() else {
        return Some(false);
    };
    let Some(participant) = bb.case.potential_mut(&name) else {
        return Some(false);
    };
    participant.q_rm = RmState::Received;
    let record = participant.clone();
    bb.case.engage(&name);

    info!(actor = %bb.name, participant = %name, role = %record.role, "Participant joined case");
    match bb.add_participant.as_mut() {
        Some(add) => add(record),
        None => debug!(actor = %bb.name, "No add_participant hook set"),
    }
    Some(true)
}

fn notify_recipient() -> Spec {
    Spec::sequence(
        "NotifyRecipient",
        vec![
            ensure_ok_to_notify(),
            Spec::fuzzer("FindContact", USUALLY_SUCCEED),
            Spec::sequence(
                "EngageParticipant",
                vec![
                    Spec::action("ReportToNewParticipant", report_to_new_participant),
                    Spec::action("BringNewParticipantUpToSpeed", bring_new_participant_up_to_speed),
                    Spec::action("ConnectNewParticipantToCase", connect_new_participant_to_case),
                ],
            ),
        ],
    )
}

fn notify_others() -> Spec {
    Spec::fallback(
        "NotifyOthers",
        vec![
            Spec::fuzzer("NotificationsComplete", UNIFORM_SUCCEED_FAIL),
            Spec::sequence(
                "SelectAndProcessRecipient",
                vec![
                    Spec::action("ChooseRecipient", choose_recipient),
                    Spec::fallback(
                        "PruneOrNotifyRecipient",
                        vec![prune_recipients(), notify_recipient()],
                    ),
                ],
            ),
        ],
    )
}

pub fn maybe_report_to_others() -> Spec {
    Spec::sequence(
        "MaybeReportToOthers",
        vec![
            Spec::check("HaveReportToOthersCapability", |bb| {
                bb.capabilities.report_to_others
            }),
            Spec::fallback(
                "ReportToOthers",
                vec![
                    Spec::check("TotalEffortLimitMet", |bb| bb.reporting_effort_budget == 0),
                    Spec::sequence(
                        "IdentifyAndNotifyParticipants",
                        vec![identify_participants(), notify_others()],
                    ),
                ],
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::{CaseState, CsFlag};
    use crate::em::EmState;
    use crate::roster::Participant;
    use cvd_bt::{BehaviorTree, NodeStatus, ScriptedPolicy};
    use std::sync::{Arc, Mutex};

    fn coordinator(policy: ScriptedPolicy) -> ActorState {
        let mut bb = ActorState::new("coord", CvdRoles::COORDINATOR);
        bb.reseed(9);
        bb.set_policy(Box::new(policy));
        bb.q_rm = RmState::Accepted;
        bb
    }

    fn engage_everyone() -> ScriptedPolicy {
        ScriptedPolicy::new()
            .never("AllPartiesKnown")
            .always("MoreVendors")
            .never("MoreCoordinators")
            .never("MoreOthers")
            .never("NotificationsComplete")
            .never("RecipientEffortExceeded")
            .always("FindContact")
    }

    #[test]
    fn test_new_vendor_is_reported_to_and_joined() {
        let joined = Arc::new(Mutex::new(Vec::<Participant>::new()));
        let sink = joined.clone();

        let mut bb = coordinator(engage_everyone());
        bb.q_em = EmState::Active;
        bb.q_cs = CaseState::from_flags(&[CsFlag::VendorAware, CsFlag::FixReady]);
        bb.add_participant = Some(Box::new(move |p| sink.lock().unwrap().push(p)));
        bb.set_policy(Box::new(engage_everyone().always("PolicyCompatible")));

        let mut tree = BehaviorTree::new(maybe_report_to_others(), bb).unwrap();
        assert_eq!(tree.tick(), NodeStatus::Success);

        let bb = tree.blackboard();
        assert_eq!(bb.reporting_effort_budget, 199);
        assert_eq!(bb.msg_history.len(), 1);
        assert_eq!(bb.msg_history[0].msg_type, MessageType::ReportSubmission);
        assert_eq!(bb.msg_history[0].recipient.as_deref(), Some("vendor-1"));
        assert!(bb.case.is_participant("vendor-1"));
        assert!(bb.currently_notifying.is_none());

        let joined = joined.lock().unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].q_em, EmState::Active);
        // Vendor-side progress is not shared with newcomers.
        assert_eq!(joined[0].q_cs, CaseState::initial());
    }

    #[test]
    fn test_exhausted_budget_stops_reporting() {
        let mut bb = coordinator(engage_everyone());
        bb.reporting_effort_budget = 0;
        let mut tree = BehaviorTree::new(maybe_report_to_others(), bb).unwrap();
        assert_eq!(tree.tick(), NodeStatus::Success);
        assert!(tree.blackboard().msg_history.is_empty());
        assert!(tree.blackboard().case.potential_participants.is_empty());
    }

    #[test]
    fn test_already_notified_recipient_is_pruned() {
        let mut bb = coordinator(engage_everyone().never("MoreVendors"));
        let mut known = Participant::new("vendor-x", CvdRoles::VENDOR);
        known.q_rm = RmState::Received;
        bb.case.add_potential(known);

        let mut tree = BehaviorTree::new(maybe_report_to_others(), bb).unwrap();
        assert_eq!(tree.tick(), NodeStatus::Success);
        let bb = tree.blackboard();
        assert!(bb.case.potential_participants.is_empty());
        assert!(bb.msg_history.is_empty());
    }

    #[test]
    fn test_without_capability_nothing_happens() {
        let mut bb = coordinator(engage_everyone());
        bb.capabilities.report_to_others = false;
        let mut tree = BehaviorTree::new(maybe_report_to_others(), bb).unwrap();
        assert_eq!(tree.tick(), NodeStatus::Failure);
    }
}
