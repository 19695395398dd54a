//! Synchronous simulation drivers.
//!
//! - Bot: one all-roles actor fed random outside events
//! - Case: several actors ticked in lock-step rounds, with every message
//!   emitted in a round delivered before the next round starts

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use cvd_core::{random_inbound_message, Actor, CvdRoles, Message, Participant};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::{SimConfig, SimMode};
use crate::report::SimReport;

/// Build an actor, seeding it when the run is seeded.
pub fn build_actor(name: &str, role: CvdRoles, seed: Option<u64>) -> Result<Actor> {
    let actor = Actor::new(name, role)?;
    Ok(match seed {
        Some(seed) => actor.with_seed(seed),
        None => actor,
    })
}

/// Give a newly joined actor the embargo and case state its notifier
/// handed over.
pub fn adopt_case_state(actor: &mut Actor, record: &Participant) {
    let state = actor.state_mut();
    if state.q_em != record.q_em {
        state.q_em = record.q_em;
        state.q_em_history.push(record.q_em);
    }
    if state.q_cs != record.q_cs {
        state.q_cs = record.q_cs;
        state.q_cs_history.push(record.q_cs);
    }
}

// ============================================================================
// Bot
// ============================================================================

pub const BOT_NAME: &str = "bot";

/// Run a single all-roles actor until it closes or hits the tick cap.
pub fn run_bot(config: &SimConfig) -> Result<SimReport> {
    let mut actor = build_actor(
        BOT_NAME,
        CvdRoles::FINDER_REPORTER_VENDOR_DEPLOYER_COORDINATOR,
        config.seed_for(0),
    )?;
    let mut world = match config.seed_for(1) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut delivered = 0;
    let mut rounds = 0;
    while rounds < config.max_ticks && !actor.is_closed() {
        if let Some(message) = random_inbound_message(&mut world, actor.q_rm()) {
            debug!(msg = %message.msg_type, "World event");
            actor.deliver(message);
            delivered += 1;
        }
        actor.tick();
        rounds += 1;
    }

    if !actor.is_closed() {
        info!(max_ticks = config.max_ticks, "Tick cap hit");
    }

    Ok(SimReport {
        mode: SimMode::Bot,
        rounds,
        delivered,
        undelivered: 0,
        dropped: 0,
        actors: vec![actor.summary()],
    })
}

// ============================================================================
// Lock-step case
// ============================================================================

/// Actors of one case in join order, with their shared outbox and join list.
pub struct CaseSimulation {
    actors: Vec<Actor>,
    index: HashMap<String, usize>,
    outbox: Arc<Mutex<Vec<Message>>>,
    joins: Arc<Mutex<Vec<Participant>>>,
    seed: Option<u64>,
    delivered: usize,
    undelivered: usize,
    /// Messages addressed to actors whose report is already closed.
    dropped: usize,
}

impl CaseSimulation {
    pub fn new(config: &SimConfig) -> Result<Self> {
        let mut sim = Self {
            actors: Vec::new(),
            index: HashMap::new(),
            outbox: Arc::new(Mutex::new(Vec::new())),
            joins: Arc::new(Mutex::new(Vec::new())),
            seed: config.seed,
            delivered: 0,
            undelivered: 0,
            dropped: 0,
        };
        for participant in &config.participants {
            sim.add_actor(&participant.name, participant.role)?;
        }
        Ok(sim)
    }

    fn add_actor(&mut self, name: &str, role: CvdRoles) -> Result<&mut Actor> {
        let position = self.actors.len();
        let seed = self.seed.map(|s| s.wrapping_add(position as u64));
        let outbox = self.outbox.clone();
        let joins = self.joins.clone();
        let actor = build_actor(name, role, seed)?
            .with_emitter(move |message| outbox.lock().push(message))
            .with_add_participant(move |record| joins.lock().push(record));

        self.index.insert(name.to_string(), position);
        self.actors.push(actor);
        Ok(&mut self.actors[position])
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.index.get(name).map(|&i| &self.actors[i])
    }

    pub fn actor_mut(&mut self, name: &str) -> Option<&mut Actor> {
        self.index.get(name).copied().map(move |i| &mut self.actors[i])
    }

    pub fn all_closed(&self) -> bool {
        self.actors.iter().all(Actor::is_closed)
    }

    /// Tick every open actor once, then admit newcomers and deliver the
    /// round's messages.
    pub fn round(&mut self) -> Result<()> {
        for actor in self.actors.iter_mut().filter(|a| !a.is_closed()) {
            actor.tick();
        }

        let joined: Vec<Participant> = std::mem::take(&mut *self.joins.lock());
        for record in joined {
            if self.index.contains_key(&record.name) {
                debug!(participant = %record.name, "Already in case");
                continue;
            }
            let actor = self.add_actor(&record.name, record.role)?;
            adopt_case_state(actor, &record);
            info!(participant = %record.name, role = %record.role, "Participant joined");
        }

        let messages: Vec<Message> = std::mem::take(&mut *self.outbox.lock());
        for message in messages {
            self.route(message);
        }
        Ok(())
    }

    fn route(&mut self, message: Message) {
        match message.recipient.clone() {
            Some(recipient) => match self.index.get(&recipient) {
                Some(&i) if self.actors[i].is_closed() => {
                    debug!(recipient = %recipient, msg = %message.msg_type, "Recipient closed");
                    self.dropped += 1;
                }
                Some(&i) => {
                    self.actors[i].deliver(message);
                    self.delivered += 1;
                }
                None => {
                    warn!(recipient = %recipient, msg = %message.msg_type, "Dropped message for unknown recipient");
                    self.undelivered += 1;
                }
            },
            None => {
                for actor in self.actors.iter_mut().filter(|a| a.name() != message.sender) {
                    if actor.is_closed() {
                        self.dropped += 1;
                    } else {
                        actor.deliver(message.clone());
                        self.delivered += 1;
                    }
                }
            }
        }
    }

    /// Run rounds until every actor closes or `max_rounds` have run.
    pub fn run(&mut self, max_rounds: u64) -> Result<u64> {
        let mut rounds = 0;
        while rounds < max_rounds && !self.all_closed() {
            self.round()?;
            rounds += 1;
        }
        if !self.all_closed() {
            info!(max_ticks = max_rounds, "Tick cap hit");
        }
        Ok(rounds)
    }

    pub fn report(&self, rounds: u64) -> SimReport {
        SimReport {
            mode: SimMode::Case,
            rounds,
            delivered: self.delivered,
            undelivered: self.undelivered,
            dropped: self.dropped,
            actors: self.actors.iter().map(Actor::summary).collect(),
        }
    }
}

pub fn run_case(config: &SimConfig) -> Result<SimReport> {
    let mut sim = CaseSimulation::new(config)?;
    let rounds = sim.run(config.max_ticks)?;
    Ok(sim.report(rounds))
}
