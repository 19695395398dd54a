//! Queue primitives, message-type conditions and emitters.
//!
//! The current-message slot cycles `Idle -> Popped -> Idle`. At most one
//! message is in flight; a handler that cannot finish puts it back at the
//! head of the queue so ordering is preserved.

use cvd_bt::UNIFORM_SUCCEED_FAIL;
use tracing::debug;

use crate::message::{Message, MessageCategory, MessageType};
use crate::nodes::common::Spec;

pub fn queue_not_empty() -> Spec {
    Spec::check("MsgQueueNotEmpty", |bb| !bb.incoming_messages.is_empty())
}

/// Install the next queued message. Fails if one is already installed or the
/// queue is empty.
pub fn pop_message() -> Spec {
    Spec::action("PopMessage", |bb| {
        if bb.current_message.is_some() {
            return Some(false);
        }
        let Some(message) = bb.incoming_messages.pop_front() else {
            return Some(false);
        };
        debug!(actor = %bb.name, msg = %message.msg_type, from = %message.sender, "<-- Recv");
        bb.current_message = Some(message);
        Some(true)
    })
}

/// Return the installed message to the head of the queue. Succeeds when
/// nothing is installed.
pub fn push_message() -> Spec {
    Spec::action("PushMessage", |bb| {
        if let Some(message) = bb.current_message.take() {
            bb.incoming_messages.push_front(message);
        }
        Some(true)
    })
}

pub fn log_message() -> Spec {
    Spec::action("LogMsg", |bb| {
        if let Some(message) = &bb.current_message {
            bb.msgs_received_this_tick.push(message.msg_type);
        }
        Some(true)
    })
}

pub fn unset_current_message() -> Spec {
    Spec::action("UnsetCurrentMsg", |bb| {
        bb.current_message = None;
        Some(true)
    })
}

pub fn is_msg_type(msg_type: MessageType) -> Spec {
    Spec::check(format!("IsMsgType{}", msg_type.code()), move |bb| {
        bb.current_message
            .as_ref()
            .is_some_and(|m| m.msg_type == msg_type)
    })
}

pub fn is_category(category: MessageCategory) -> Spec {
    let name = match category {
        MessageCategory::ReportManagement => "IsRMMessage",
        MessageCategory::EmbargoManagement => "IsEMMessage",
        MessageCategory::CaseState => "IsCSMessage",
        MessageCategory::General => "IsGMMessage",
    };
    Spec::check(name, move |bb| {
        bb.current_message
            .as_ref()
            .is_some_and(|m| m.category() == category)
    })
}

/// Broadcast a message of `msg_type` to the case.
pub fn emit(msg_type: MessageType) -> Spec {
    Spec::action(format!("Emit_{}", msg_type.code()), move |bb| {
        let message = Message::new(msg_type, bb.name.clone());
        bb.send(message);
        Some(true)
    })
}

/// Stand-in for chasing up an error reply: half the time send a general
/// inquiry.
pub fn follow_up_on_error() -> Spec {
    Spec::fallback(
        "FollowUpOnErrorMessage",
        vec![
            Spec::fuzzer("FollowUpNotNeeded", UNIFORM_SUCCEED_FAIL),
            emit(MessageType::GeneralInquiry),
        ],
    )
}
