//! A protocol participant: one compiled protocol tree plus its blackboard.

use cvd_bt::{BehaviorTree, NodeStatus, Policy};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cs::CaseState;
use crate::em::EmState;
use crate::error::CvdError;
use crate::message::{Message, MessageType};
use crate::priority::ReportPriority;
use crate::protocol::protocol_root;
use crate::rm::RmState;
use crate::roles::{Capabilities, CvdRoles};
use crate::roster::Participant;
use crate::state::ActorState;

pub struct Actor {
    tree: BehaviorTree<ActorState>,
}

impl Actor {
    /// Compile the protocol tree for a fresh actor in `Start`/`None`/`vfdpxa`.
    pub fn new(name: impl Into<String>, role: CvdRoles) -> Result<Self, CvdError> {
        let mut state = ActorState::new(name, role);
        state.record_initial_states();
        let tree = BehaviorTree::new(protocol_root(), state)?;
        Ok(Self { tree })
    }

    /// Route outbound messages through `emit`.
    pub fn with_emitter(mut self, emit: impl FnMut(Message) + Send + 'static) -> Self {
        self.state_mut().emit = Some(Box::new(emit));
        self
    }

    /// Called with each participant this actor brings into the case.
    pub fn with_add_participant(
        mut self,
        add: impl FnMut(Participant) + Send + 'static,
    ) -> Self {
        self.state_mut().add_participant = Some(Box::new(add));
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.state_mut().capabilities = capabilities;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.state_mut().reseed(seed);
        self
    }

    pub fn with_policy(mut self, policy: impl Policy + 'static) -> Self {
        self.state_mut().set_policy(Box::new(policy));
        self
    }

    pub fn name(&self) -> &str {
        &self.state().name
    }

    pub fn role(&self) -> CvdRoles {
        self.state().role
    }

    /// Queue an inbound message behind anything already waiting.
    pub fn deliver(&mut self, message: Message) {
        self.state_mut().incoming_messages.push_back(message);
    }

    /// Advance the protocol tree one step.
    pub fn tick(&mut self) -> NodeStatus {
        let before = (self.q_rm(), self.q_em(), self.q_cs());
        {
            let state = self.state_mut();
            state.tick += 1;
            debug!(
                actor = %state.name,
                tick = state.tick,
                q_rm = %before.0,
                q_em = %before.1,
                q_cs = %before.2,
                queued = state.incoming_messages.len(),
                "Pre-tick"
            );
        }

        let status = self.tree.tick();

        let after = (self.q_rm(), self.q_em(), self.q_cs());
        if after != before {
            debug!(
                actor = %self.name(),
                ?status,
                q_rm = %after.0,
                q_em = %after.1,
                q_cs = %after.2,
                "Post-tick state changed"
            );
        }
        if after.0.is_closed() && !before.0.is_closed() {
            info!(actor = %self.name(), tick = self.state().tick, "Report closed");
        }
        status
    }

    /// Tick until the report closes or `max_ticks` ticks have run. Returns
    /// the number of ticks taken.
    pub fn run_until_closed(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_closed() {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    pub fn state(&self) -> &ActorState {
        self.tree.blackboard()
    }

    pub fn state_mut(&mut self) -> &mut ActorState {
        self.tree.blackboard_mut()
    }

    pub fn is_closed(&self) -> bool {
        self.q_rm().is_closed()
    }

    pub fn q_rm(&self) -> RmState {
        self.state().q_rm
    }

    pub fn q_em(&self) -> EmState {
        self.state().q_em
    }

    pub fn q_cs(&self) -> CaseState {
        self.state().q_cs
    }

    /// Indented outline of the compiled tree.
    pub fn render(&self) -> String {
        self.tree.root().to_text()
    }

    pub fn summary(&self) -> ActorSummary {
        let state = self.state();
        ActorSummary {
            name: state.name.clone(),
            role: state.role,
            ticks: state.tick,
            closed: self.is_closed(),
            q_rm: state.q_rm,
            q_em: state.q_em,
            q_cs: state.q_cs,
            priority: state.priority,
            vul_id: state.vul_id.clone(),
            q_rm_history: state.q_rm_history.clone(),
            q_em_history: state.q_em_history.clone(),
            q_cs_history: state.q_cs_history.clone(),
            messages_sent: state.msg_history.len(),
            participants: state.case.participants.iter().map(|p| p.name.clone()).collect(),
        }
    }
}

/// End-of-run view of one actor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActorSummary {
    pub name: String,
    pub role: CvdRoles,
    pub ticks: u64,
    pub closed: bool,
    pub q_rm: RmState,
    pub q_em: EmState,
    pub q_cs: CaseState,
    pub priority: ReportPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vul_id: Option<String>,
    pub q_rm_history: Vec<RmState>,
    pub q_em_history: Vec<EmState>,
    pub q_cs_history: Vec<CaseState>,
    pub messages_sent: usize,
    pub participants: Vec<String>,
}

/// Stand-in for the outside world: a report while we have none, and
/// occasionally news that the case went public, was exploited or attacked.
pub fn random_inbound_message<R: Rng + ?Sized>(rng: &mut R, q_rm: RmState) -> Option<Message> {
    let msg_type = if q_rm == RmState::Start {
        if !rng.gen_bool(0.4) {
            return None;
        }
        MessageType::ReportSubmission
    } else {
        if !rng.gen_bool(0.05) {
            return None;
        }
        if rng.gen_bool(0.6) {
            MessageType::PublicAware
        } else if rng.gen_bool(0.6) {
            MessageType::AttacksObserved
        } else {
            MessageType::ExploitPublished
        }
    };
    Some(Message::new(msg_type, "world"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvd_bt::ScriptedPolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_actor_records_initial_states() {
        let actor = Actor::new("vendor", CvdRoles::VENDOR).unwrap();
        assert_eq!(actor.state().q_rm_history, vec![RmState::Start]);
        assert_eq!(actor.state().q_em_history, vec![EmState::NoEmbargo]);
        assert_eq!(actor.state().q_cs_history, vec![CaseState::initial()]);
        assert!(!actor.is_closed());
    }

    #[test]
    fn test_capabilities_override_role_defaults() {
        let policy = || ScriptedPolicy::new().always("DiscoverVulnerability");

        let mut finder = Actor::new("f", CvdRoles::FINDER).unwrap().with_policy(policy());
        finder.tick();
        assert_ne!(finder.q_rm(), RmState::Start);

        let mut idle = Actor::new("f", CvdRoles::FINDER)
            .unwrap()
            .with_capabilities(Capabilities::none())
            .with_policy(policy());
        for _ in 0..20 {
            idle.tick();
        }
        assert_eq!(idle.q_rm(), RmState::Start);
        assert!(idle.state().msg_history.is_empty());
    }

    #[test]
    fn test_tick_counts_and_snapshots() {
        let mut actor = Actor::new("c", CvdRoles::COORDINATOR).unwrap().with_seed(1);
        actor.tick();
        actor.tick();
        assert_eq!(actor.state().tick, 2);
        assert_eq!(actor.state().state_log.len(), 2);
        assert_eq!(actor.state().state_log[1].tick, 2);
    }

    #[test]
    fn test_render_names_the_root() {
        let actor = Actor::new("v", CvdRoles::VENDOR).unwrap();
        let text = actor.render();
        assert!(text.lines().next().unwrap().contains("CvdProtocolBt"));
        assert!(text.contains("ReceiveMessagesBt"));
    }

    #[test]
    fn test_random_inbound_before_report_is_submission() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            if let Some(msg) = random_inbound_message(&mut rng, RmState::Start) {
                assert_eq!(msg.msg_type, MessageType::ReportSubmission);
            }
        }
        for _ in 0..200 {
            if let Some(msg) = random_inbound_message(&mut rng, RmState::Accepted) {
                assert!(matches!(
                    msg.msg_type,
                    MessageType::PublicAware
                        | MessageType::AttacksObserved
                        | MessageType::ExploitPublished
                ));
            }
        }
    }
}
