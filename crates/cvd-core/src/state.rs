//! The actor blackboard.
//!
//! One [`ActorState`] is owned by each actor's tree and handed by `&mut` to
//! every node on every tick. Nothing else in the tree holds state about the
//! case.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use cvd_bt::{Blackboard, Decision, Policy, WeightedRandom};

use crate::cs::CaseState;
use crate::em::EmState;
use crate::message::{Message, MessageType};
use crate::priority::ReportPriority;
use crate::rm::RmState;
use crate::roles::{Capabilities, CvdRoles};
use crate::roster::{CaseRoster, Participant};

/// Hands an outbound message to whatever transport the host provides.
pub type EmitFn = Box<dyn FnMut(Message) + Send>;

/// Wires a newly notified participant into the case.
pub type AddParticipantFn = Box<dyn FnMut(Participant) + Send>;

/// Default budget of notification attempts when reporting to others.
pub const DEFAULT_REPORTING_EFFORT_BUDGET: u32 = 200;

pub struct ActorState {
    pub name: String,
    pub role: CvdRoles,
    pub capabilities: Capabilities,

    pub q_rm: RmState,
    pub q_em: EmState,
    pub q_cs: CaseState,
    pub q_rm_history: Vec<RmState>,
    pub q_em_history: Vec<EmState>,
    pub q_cs_history: Vec<CaseState>,

    pub incoming_messages: VecDeque<Message>,
    pub current_message: Option<Message>,
    pub msgs_received_this_tick: Vec<MessageType>,
    pub msgs_emitted_this_tick: Vec<MessageType>,
    pub msg_history: Vec<Message>,

    pub priority: ReportPriority,
    pub prioritization_count: u32,
    pub reporting_effort_budget: u32,
    pub currently_notifying: Option<String>,
    pub case: CaseRoster,
    pub vul_id: Option<String>,

    pub state_log: Vec<StateSnapshot>,
    pub tick: u64,

    pub emit: Option<EmitFn>,
    pub add_participant: Option<AddParticipantFn>,

    rng: StdRng,
    policy: Box<dyn Policy>,
}

impl ActorState {
    pub fn new(name: impl Into<String>, role: CvdRoles) -> Self {
        Self {
            name: name.into(),
            role,
            capabilities: Capabilities::for_role(role),
            q_rm: RmState::default(),
            q_em: EmState::default(),
            q_cs: CaseState::initial(),
            q_rm_history: Vec::new(),
            q_em_history: Vec::new(),
            q_cs_history: Vec::new(),
            incoming_messages: VecDeque::new(),
            current_message: None,
            msgs_received_this_tick: Vec::new(),
            msgs_emitted_this_tick: Vec::new(),
            msg_history: Vec::new(),
            priority: ReportPriority::default(),
            prioritization_count: 0,
            reporting_effort_budget: DEFAULT_REPORTING_EFFORT_BUDGET,
            currently_notifying: None,
            case: CaseRoster::new(),
            vul_id: None,
            state_log: Vec::new(),
            tick: 0,
            emit: None,
            add_participant: None,
            rng: StdRng::from_entropy(),
            policy: Box::new(WeightedRandom),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn set_policy(&mut self, policy: Box<dyn Policy>) {
        self.policy = policy;
    }

    /// Record the current RM/EM/CS values as the first history entries.
    pub fn record_initial_states(&mut self) {
        self.q_rm_history.push(self.q_rm);
        self.q_em_history.push(self.q_em);
        self.q_cs_history.push(self.q_cs);
    }

    /// Build a message from this actor, hand it to the transport and keep a
    /// copy in the outbound history.
    pub fn send(&mut self, message: Message) {
        self.msgs_emitted_this_tick.push(message.msg_type);
        self.msg_history.push(message.clone());
        match self.emit.as_mut() {
            Some(emit) => emit(message),
            None => tracing::trace!(actor = %self.name, msg = %message.msg_type, "No emitter set"),
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            tick: self.tick,
            q_rm: self.q_rm,
            q_em: self.q_em,
            q_cs: self.q_cs,
            role: self.role,
            msgs_received: self.msgs_received_this_tick.clone(),
            msgs_emitted: self.msgs_emitted_this_tick.clone(),
        }
    }
}

impl Blackboard for ActorState {
    fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn decide(&mut self, decision: &Decision<'_>) -> Option<bool> {
        self.policy.decide(decision, &mut self.rng)
    }
}

impl fmt::Debug for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorState")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("q_rm", &self.q_rm)
            .field("q_em", &self.q_em)
            .field("q_cs", &self.q_cs.to_string())
            .field("queued", &self.incoming_messages.len())
            .field("current_message", &self.current_message.as_ref().map(|m| m.msg_type))
            .field("priority", &self.priority)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

/// One row of the per-tick state log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateSnapshot {
    pub tick: u64,
    pub q_rm: RmState,
    pub q_em: EmState,
    pub q_cs: CaseState,
    pub role: CvdRoles,
    pub msgs_received: Vec<MessageType>,
    pub msgs_emitted: Vec<MessageType>,
}
