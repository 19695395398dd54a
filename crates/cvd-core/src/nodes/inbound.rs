//! Inbound message handling.
//!
//! Each category handler either recognizes an acknowledgement, handles the
//! message and acknowledges it, or replies with its category's error
//! message. A handler only runs for messages of its own category.

use crate::cs::CsFlag;
use crate::em::EmState;
use crate::message::{MessageCategory, MessageType};
use crate::nodes::case::{
    cs_has, cs_not_pxa, cs_public_and_exploit, cs_pxa, to_attacks_observed, to_exploit_public,
    to_public_aware, to_vendor_aware,
};
use crate::nodes::common::Spec;
use crate::nodes::embargo::{
    em_active_or_revise, em_in, revise_to_active, to_active, to_exited, to_none, to_proposed,
    to_revise,
};
use crate::nodes::messaging::{
    emit, follow_up_on_error, is_category, is_msg_type, log_message, pop_message, push_message,
    queue_not_empty, unset_current_message,
};
use crate::nodes::report::{rm_not_in, to_received};
use crate::nodes::roles::role_is_not_vendor;
use crate::rm::RmState;
use crate::workflow::embargo::terminate_embargo;

/// Hold the state, or move into it from the one state that leads there.
fn ensure_em(name: &str, target: EmState, from: EmState, transition: Spec) -> Spec {
    Spec::fallback(
        format!("Ensure{name}"),
        vec![
            em_in(target),
            Spec::sequence(format!("Recognize{name}"), vec![em_in(from), transition]),
        ],
    )
}

fn handle(name: &str, msg_type: MessageType, then: Spec) -> Spec {
    Spec::sequence(name, vec![is_msg_type(msg_type), then])
}

// ============================================================================
// Report Management
// ============================================================================

fn handle_rs() -> Spec {
    handle(
        "HandleRs",
        MessageType::ReportSubmission,
        Spec::sequence(
            "RecognizeReport",
            vec![
                Spec::fallback(
                    "EnsureRmReceived",
                    vec![rm_not_in(RmState::Start), to_received()],
                ),
                Spec::fallback(
                    "EnsureVendorAware",
                    vec![
                        role_is_not_vendor(),
                        cs_has(CsFlag::VendorAware),
                        Spec::sequence(
                            "BecomeVendorAware",
                            vec![to_vendor_aware(), emit(MessageType::VendorAware)],
                        ),
                    ],
                ),
            ],
        ),
    )
}

pub fn process_rm_messages() -> Spec {
    Spec::sequence(
        "ProcessRMMessagesBt",
        vec![
            is_category(MessageCategory::ReportManagement),
            Spec::fallback(
                "HandleRmMessage",
                vec![
                    is_msg_type(MessageType::ReportAck),
                    Spec::sequence(
                        "HandleAndAckRmMessage",
                        vec![
                            Spec::fallback(
                                "HandleAckableRmMessage",
                                vec![
                                    handle_rs(),
                                    handle("HandleRe", MessageType::ReportError, follow_up_on_error()),
                                    rm_not_in(RmState::Start),
                                ],
                            ),
                            emit(MessageType::ReportAck),
                        ],
                    ),
                    emit(MessageType::ReportError),
                ],
            ),
        ],
    )
}

// ============================================================================
// Embargo Management
// ============================================================================

fn handle_revision_response() -> Spec {
    Spec::sequence(
        "HandleRevisionResponse",
        vec![
            Spec::fallback(
                "IsEjOrEc",
                vec![
                    is_msg_type(MessageType::EmbargoRevisionRejected),
                    is_msg_type(MessageType::EmbargoRevisionAccepted),
                ],
            ),
            Spec::fallback(
                "EnsureEmActive",
                vec![
                    em_in(EmState::Active),
                    Spec::sequence(
                        "HandleEjOrEc",
                        vec![
                            em_in(EmState::Revise),
                            Spec::fallback(
                                "SelectEjOrEcResponse",
                                vec![
                                    handle("HandleEj", MessageType::EmbargoRevisionRejected, revise_to_active()),
                                    handle("HandleEc", MessageType::EmbargoRevisionAccepted, to_active()),
                                ],
                            ),
                        ],
                    ),
                ],
            ),
        ],
    )
}

fn handle_messages_in_pxa() -> Spec {
    Spec::sequence(
        "HandleCSpxa",
        vec![
            cs_pxa(),
            Spec::fallback(
                "HandleMessagesInpxa",
                vec![
                    handle(
                        "HandleEp",
                        MessageType::EmbargoProposal,
                        ensure_em("ProposalRecognized", EmState::Proposed, EmState::NoEmbargo, to_proposed()),
                    ),
                    handle(
                        "HandleEa",
                        MessageType::EmbargoAccepted,
                        ensure_em("EmbargoActivated", EmState::Active, EmState::Proposed, to_active()),
                    ),
                    handle(
                        "HandleEv",
                        MessageType::EmbargoRevisionProposal,
                        ensure_em("RevisionRecognized", EmState::Revise, EmState::Active, to_revise()),
                    ),
                    handle_revision_response(),
                ],
            ),
        ],
    )
}

pub fn process_em_messages() -> Spec {
    Spec::sequence(
        "ProcessEMMessagesBt",
        vec![
            is_category(MessageCategory::EmbargoManagement),
            Spec::fallback(
                "HandleEmMessage",
                vec![
                    is_msg_type(MessageType::EmbargoAck),
                    Spec::sequence(
                        "HandleAndAckEmMessage",
                        vec![
                            Spec::fallback(
                                "HandleAckableEmMessage",
                                vec![
                                    handle("HandleEe", MessageType::EmbargoError, follow_up_on_error()),
                                    handle(
                                        "HandleEt",
                                        MessageType::EmbargoTerminated,
                                        Spec::fallback(
                                            "EnsureEmbargoExited",
                                            vec![
                                                em_in(EmState::Exited),
                                                Spec::sequence(
                                                    "RecognizeEmbargoExit",
                                                    vec![em_active_or_revise(), to_exited()],
                                                ),
                                            ],
                                        ),
                                    ),
                                    handle(
                                        "HandleEr",
                                        MessageType::EmbargoRejected,
                                        ensure_em("RejectionRecognized", EmState::NoEmbargo, EmState::Proposed, to_none()),
                                    ),
                                    handle_messages_in_pxa(),
                                    Spec::sequence(
                                        "AvoidNonViableEmbargo",
                                        vec![cs_not_pxa(), terminate_embargo()],
                                    ),
                                ],
                            ),
                            emit(MessageType::EmbargoAck),
                        ],
                    ),
                    emit(MessageType::EmbargoError),
                ],
            ),
        ],
    )
}

// ============================================================================
// Case State
// ============================================================================

fn handle_cx() -> Spec {
    handle(
        "HandleCx",
        MessageType::ExploitPublished,
        Spec::fallback(
            "EnsureExploitAndPublic",
            vec![
                cs_public_and_exploit(),
                Spec::sequence(
                    "RecognizeExploitPublic",
                    vec![
                        to_exploit_public(),
                        Spec::fallback(
                            "EnsurePublicAware",
                            vec![
                                cs_has(CsFlag::PublicAware),
                                Spec::sequence(
                                    "BecomePublicAware",
                                    vec![to_public_aware(), emit(MessageType::PublicAware)],
                                ),
                            ],
                        ),
                    ],
                ),
            ],
        ),
    )
}

/// Public awareness, exploits and attacks all end the embargo.
fn handle_cp_cx_ca() -> Spec {
    Spec::sequence(
        "HandleCpCxCa",
        vec![
            Spec::fallback(
                "RecognizeCpCxCa",
                vec![
                    handle(
                        "HandleCp",
                        MessageType::PublicAware,
                        Spec::fallback("EnsureCsP", vec![cs_has(CsFlag::PublicAware), to_public_aware()]),
                    ),
                    handle_cx(),
                    handle(
                        "HandleCa",
                        MessageType::AttacksObserved,
                        Spec::fallback(
                            "EnsureCsA",
                            vec![
                                cs_has(CsFlag::AttacksObserved),
                                to_attacks_observed(),
                            ],
                        ),
                    ),
                ],
            ),
            terminate_embargo(),
        ],
    )
}

pub fn process_cs_messages() -> Spec {
    Spec::sequence(
        "ProcessCSMessagesBt",
        vec![
            is_category(MessageCategory::CaseState),
            Spec::fallback(
                "HandleCsMessage",
                vec![
                    is_msg_type(MessageType::CaseStateAck),
                    Spec::sequence(
                        "HandleAndAckCsMessage",
                        vec![
                            Spec::fallback(
                                "HandleAckableCsMessage",
                                vec![
                                    handle_cp_cx_ca(),
                                    is_msg_type(MessageType::VendorAware),
                                    is_msg_type(MessageType::FixReady),
                                    is_msg_type(MessageType::FixDeployed),
                                    handle("HandleCe", MessageType::CaseStateError, follow_up_on_error()),
                                ],
                            ),
                            emit(MessageType::CaseStateAck),
                        ],
                    ),
                    emit(MessageType::CaseStateError),
                ],
            ),
        ],
    )
}

// ============================================================================
// General
// ============================================================================

pub fn process_gm_messages() -> Spec {
    Spec::sequence(
        "ProcessMessagesOtherBt",
        vec![
            is_category(MessageCategory::General),
            Spec::fallback(
                "HandleGmMessage",
                vec![
                    is_msg_type(MessageType::GeneralAck),
                    Spec::sequence(
                        "HandleAndAckGmMessage",
                        vec![
                            Spec::fallback(
                                "HandleAckableGmMessage",
                                vec![
                                    is_msg_type(MessageType::GeneralInquiry),
                                    handle("HandleGe", MessageType::GeneralError, follow_up_on_error()),
                                ],
                            ),
                            emit(MessageType::GeneralAck),
                        ],
                    ),
                    emit(MessageType::GeneralError),
                ],
            ),
        ],
    )
}

// ============================================================================
// Receive loop
// ============================================================================

fn process_next_message() -> Spec {
    Spec::sequence(
        "ProcessNextMessage",
        vec![
            queue_not_empty(),
            pop_message(),
            log_message(),
            Spec::fallback(
                "HandleMessage",
                vec![
                    process_rm_messages(),
                    process_em_messages(),
                    process_cs_messages(),
                    process_gm_messages(),
                ],
            ),
            unset_current_message(),
        ],
    )
}

/// Drain the inbox in arrival order.
///
/// A message no handler accepts goes back to the head of the queue and the
/// loop stops for this tick. Nothing is received once the report is closed.
pub fn receive_messages() -> Spec {
    Spec::repeat_until_fail(
        "ReceiveMessagesBt",
        Spec::sequence(
            "ReceiveNextMessage",
            vec![
                rm_not_in(RmState::Closed),
                queue_not_empty(),
                Spec::fallback(
                    "ProcessMessage",
                    vec![
                        process_next_message(),
                        Spec::force_failure("RequeueMessage", push_message()),
                    ],
                ),
            ],
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::CaseState;
    use crate::message::Message;
    use crate::roles::CvdRoles;
    use crate::state::ActorState;
    use cvd_bt::{BehaviorTree, NodeStatus, ScriptedPolicy};

    fn deliver(mut bb: ActorState, types: &[MessageType]) -> ActorState {
        for t in types {
            bb.incoming_messages.push_back(Message::new(*t, "peer"));
        }
        bb.set_policy(Box::new(
            ScriptedPolicy::new()
                .always("FollowUpNotNeeded")
                .never("ExitEmbargoForOtherReason"),
        ));
        let mut tree = BehaviorTree::new(receive_messages(), bb).unwrap();
        assert_eq!(tree.tick(), NodeStatus::Success);
        tree.into_blackboard()
    }

    #[test]
    fn test_vendor_receiving_report() {
        let bb = deliver(ActorState::new("v", CvdRoles::VENDOR), &[MessageType::ReportSubmission]);
        assert_eq!(bb.q_rm, RmState::Received);
        assert!(bb.q_cs.vendor_aware());
        assert_eq!(
            bb.msgs_emitted_this_tick,
            vec![MessageType::VendorAware, MessageType::ReportAck]
        );
        assert!(bb.incoming_messages.is_empty());
        assert!(bb.current_message.is_none());
    }

    #[test]
    fn test_non_vendor_receiving_report_stays_unaware() {
        let bb = deliver(ActorState::new("c", CvdRoles::COORDINATOR), &[MessageType::ReportSubmission]);
        assert_eq!(bb.q_rm, RmState::Received);
        assert!(!bb.q_cs.vendor_aware());
        assert_eq!(bb.msgs_emitted_this_tick, vec![MessageType::ReportAck]);
    }

    #[test]
    fn test_rm_message_before_report_is_an_error() {
        let bb = deliver(ActorState::new("v", CvdRoles::VENDOR), &[MessageType::ReportValid]);
        assert_eq!(bb.q_rm, RmState::Start);
        assert_eq!(bb.msgs_emitted_this_tick, vec![MessageType::ReportError]);
    }

    #[test]
    fn test_acks_are_not_acked() {
        let bb = deliver(
            ActorState::new("v", CvdRoles::VENDOR),
            &[MessageType::ReportAck, MessageType::EmbargoAck, MessageType::CaseStateAck, MessageType::GeneralAck],
        );
        assert!(bb.msgs_emitted_this_tick.is_empty());
        assert_eq!(bb.msgs_received_this_tick.len(), 4);
    }

    #[test]
    fn test_embargo_proposal_then_acceptance() {
        let mut bb = ActorState::new("v", CvdRoles::VENDOR);
        bb.q_rm = RmState::Accepted;
        let bb = deliver(bb, &[MessageType::EmbargoProposal, MessageType::EmbargoAccepted]);
        assert_eq!(bb.q_em, EmState::Active);
        assert_eq!(bb.q_em_history, vec![EmState::Proposed, EmState::Active]);
        assert_eq!(bb.msgs_emitted_this_tick, vec![MessageType::EmbargoAck, MessageType::EmbargoAck]);
    }

    #[test]
    fn test_unexpected_embargo_message_is_an_error() {
        let mut bb = ActorState::new("v", CvdRoles::VENDOR);
        bb.q_em = EmState::Active;
        let bb = deliver(bb, &[MessageType::EmbargoProposal]);
        assert_eq!(bb.q_em, EmState::Active);
        assert_eq!(bb.msgs_emitted_this_tick, vec![MessageType::EmbargoError]);
    }

    #[test]
    fn test_exploit_published_ends_embargo() {
        let mut bb = ActorState::new("v", CvdRoles::VENDOR);
        bb.q_em = EmState::Active;
        let bb = deliver(bb, &[MessageType::ExploitPublished]);
        assert_eq!(bb.q_em, EmState::Exited);
        assert!(bb.q_cs.exploit_public());
        assert!(bb.q_cs.public_aware());
        assert_eq!(
            bb.msgs_emitted_this_tick,
            vec![MessageType::PublicAware, MessageType::EmbargoTerminated, MessageType::CaseStateAck]
        );
    }

    #[test]
    fn test_vendor_side_case_messages_are_acked_only() {
        let bb = deliver(ActorState::new("v", CvdRoles::VENDOR), &[MessageType::FixReady]);
        assert_eq!(bb.q_cs, CaseState::initial());
        assert_eq!(bb.msgs_emitted_this_tick, vec![MessageType::CaseStateAck]);
    }

    #[test]
    fn test_closed_actor_receives_nothing() {
        let mut bb = ActorState::new("v", CvdRoles::VENDOR);
        bb.q_rm = RmState::Closed;
        let bb = deliver(bb, &[MessageType::GeneralInquiry]);
        assert_eq!(bb.incoming_messages.len(), 1);
        assert!(bb.msgs_received_this_tick.is_empty());
    }
}
