//! End-to-end tests of the composed protocol tree.
//!
//! Actors here are driven through the public [`Actor`] API with seeded
//! RNGs and scripted decisions so that each run follows a known path.

use std::sync::{Arc, Mutex};

use cvd_bt::{BehaviorTree, NodeStatus, ScriptedPolicy};
use cvd_core::nodes::report::all_transitions;
use cvd_core::{
    Actor, ActorState, CaseState, CsFlag, CvdRoles, EmState, Message, MessageType, RmState,
};

// ============================================================================
// Helpers
// ============================================================================

fn recording_actor(name: &str, role: CvdRoles) -> (Actor, Arc<Mutex<Vec<Message>>>) {
    let outbox = Arc::new(Mutex::new(Vec::new()));
    let sink = outbox.clone();
    let actor = Actor::new(name, role)
        .unwrap()
        .with_seed(42)
        .with_emitter(move |msg| sink.lock().unwrap().push(msg));
    (actor, outbox)
}

fn emitted(outbox: &Arc<Mutex<Vec<Message>>>) -> Vec<MessageType> {
    outbox.lock().unwrap().iter().map(|m| m.msg_type).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

/// An all-roles actor handed one report works it through to closure via
/// the accepted path, deploying a fix on the way.
#[test]
fn test_all_roles_actor_closes_after_deploying_fix() {
    let policy = ScriptedPolicy::new()
        .always("EvaluateReportCredibility")
        .always("EvaluateReportValidity")
        .always("CreateFix")
        .always("DeployFix")
        .never("DeferReport");
    let mut actor = Actor::new("everyone", CvdRoles::FINDER_REPORTER_VENDOR_DEPLOYER_COORDINATOR)
        .unwrap()
        .with_seed(2024)
        .with_policy(policy);

    actor.deliver(Message::new(MessageType::ReportSubmission, "reporter"));
    let ticks = actor.run_until_closed(2000);

    assert!(actor.is_closed(), "still {} after {ticks} ticks", actor.q_rm());
    assert!(actor.q_cs().vfd_complete());

    let rm = &actor.state().q_rm_history;
    assert_eq!(rm.first(), Some(&RmState::Start));
    assert_eq!(rm.last(), Some(&RmState::Closed));
    assert_eq!(rm[rm.len() - 2], RmState::Accepted);
    assert!(!rm.contains(&RmState::Deferred));
    assert!(!rm.contains(&RmState::Invalid));

    let cs = &actor.state().q_cs_history;
    assert!(cs.iter().any(|s| s.vfd_complete()));
}

/// A published exploit ends an active embargo and makes the case public.
#[test]
fn test_exploit_published_exits_active_embargo() {
    let (actor, outbox) = recording_actor("vendor", CvdRoles::VENDOR);
    let mut actor = actor.with_policy(ScriptedPolicy::new().never("DiscoverVulnerability"));
    actor.state_mut().q_em = EmState::Active;

    actor.deliver(Message::new(MessageType::ExploitPublished, "world"));
    actor.tick();

    assert_eq!(actor.q_em(), EmState::Exited);
    assert!(actor.q_cs().exploit_public());
    assert!(actor.q_cs().public_aware());
    assert_eq!(
        emitted(&outbox),
        vec![
            MessageType::PublicAware,
            MessageType::EmbargoTerminated,
            MessageType::CaseStateAck,
        ]
    );
}

/// Closed is terminal for every RM transition except the no-op into Closed.
#[test]
fn test_closed_is_terminal() {
    for (target, spec) in all_transitions() {
        let mut bb = ActorState::new("closed", CvdRoles::VENDOR);
        bb.q_rm = RmState::Closed;
        let mut tree = BehaviorTree::new(spec, bb).unwrap();
        let status = tree.tick();

        if target == RmState::Closed {
            assert_eq!(status, NodeStatus::Success);
        } else {
            assert_eq!(status, NodeStatus::Failure, "Closed -> {target}");
        }
        assert_eq!(tree.blackboard().q_rm, RmState::Closed);
        assert!(tree.blackboard().q_rm_history.is_empty());
    }
}

// ============================================================================
// Messaging through the actor
// ============================================================================

/// Messages are handled in arrival order within a single tick.
#[test]
fn test_inbox_drains_in_order() {
    let (actor, outbox) = recording_actor("coord", CvdRoles::COORDINATOR);
    let mut actor = actor.with_policy(ScriptedPolicy::new().never("DiscoverVulnerability"));

    actor.deliver(Message::new(MessageType::GeneralInquiry, "a"));
    actor.deliver(Message::new(MessageType::ReportSubmission, "b"));
    actor.deliver(Message::new(MessageType::EmbargoProposal, "c"));
    actor.tick();

    assert!(actor.state().incoming_messages.is_empty());
    assert!(actor.state().current_message.is_none());
    let types = emitted(&outbox);
    assert_eq!(
        &types[..3],
        &[MessageType::GeneralAck, MessageType::ReportAck, MessageType::EmbargoAck]
    );
    assert!(actor.state().q_em_history.contains(&EmState::Proposed));
}

/// Every non-ack message gets exactly one ack or error reply.
#[test]
fn test_every_message_is_answered() {
    for msg_type in MessageType::ALL {
        let (actor, outbox) = recording_actor("vendor", CvdRoles::VENDOR);
        let mut actor = actor.with_policy(
            ScriptedPolicy::new()
                .never("DiscoverVulnerability")
                .always("FollowUpNotNeeded"),
        );
        actor.deliver(Message::new(msg_type, "peer"));
        actor.tick();

        let replies: Vec<MessageType> = emitted(&outbox)
            .into_iter()
            .filter(|t| t.is_ack() || t.is_error())
            .filter(|t| t.category() == msg_type.category())
            .collect();
        if msg_type.is_ack() {
            assert!(replies.is_empty(), "{msg_type} should not be answered");
        } else {
            assert_eq!(replies.len(), 1, "{msg_type} answered with {replies:?}");
        }
    }
}

/// Case-state messages never regress the receiver's case state.
#[test]
fn test_repeated_case_news_is_idempotent() {
    let (actor, _outbox) = recording_actor("vendor", CvdRoles::VENDOR);
    let mut actor = actor.with_policy(ScriptedPolicy::new().never("DiscoverVulnerability"));

    actor.deliver(Message::new(MessageType::AttacksObserved, "world"));
    actor.tick();
    let once = (actor.q_cs(), actor.state().q_cs_history.len());

    actor.deliver(Message::new(MessageType::AttacksObserved, "world"));
    actor.tick();
    assert_eq!((actor.q_cs(), actor.state().q_cs_history.len()), once);
    assert_eq!(
        actor.q_cs(),
        CaseState::from_flags(&[CsFlag::AttacksObserved])
    );
}

/// The per-tick state log captures the previous tick's traffic.
#[test]
fn test_state_log_records_traffic() {
    let (actor, _outbox) = recording_actor("vendor", CvdRoles::VENDOR);
    let mut actor = actor.with_policy(ScriptedPolicy::new().never("DiscoverVulnerability"));
    actor.deliver(Message::new(MessageType::GeneralInquiry, "peer"));
    actor.tick();
    actor.tick();

    let log = &actor.state().state_log;
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].msgs_received, vec![MessageType::GeneralInquiry]);
    assert_eq!(log[1].msgs_emitted, vec![MessageType::GeneralAck]);
    let json = serde_json::to_string(&log[1]).unwrap();
    assert!(json.contains("\"GI\""));
}
