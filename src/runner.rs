//! Concurrent case simulation: one tokio task per actor.
//!
//! Each actor owns its tree and blackboard outright. The only thing tasks
//! share is the [`Router`], which hands messages to per-actor channels.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use cvd_core::{Actor, ActorSummary, Message, Participant};
use parking_lot::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{SimConfig, SimMode};
use crate::report::SimReport;
use crate::simulation::{adopt_case_state, build_actor};

#[derive(Default)]
struct RouterInner {
    mailboxes: HashMap<String, UnboundedSender<Message>>,
    /// Direct messages for participants that have not joined yet.
    pending: HashMap<String, Vec<Message>>,
    /// Participants whose task has finished.
    retired: HashSet<String>,
    delivered: usize,
    dropped: usize,
}

/// Name-to-mailbox directory shared by every actor task.
#[derive(Clone, Default)]
pub struct Router {
    inner: Arc<RwLock<RouterInner>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mailbox and flush anything already addressed to it. Returns
    /// false if the name is taken.
    pub fn register(&self, name: &str, mailbox: UnboundedSender<Message>) -> bool {
        let mut inner = self.inner.write();
        if inner.mailboxes.contains_key(name) || inner.retired.contains(name) {
            return false;
        }
        let waiting = inner.pending.remove(name).unwrap_or_default();
        for message in waiting {
            if mailbox.send(message).is_ok() {
                inner.delivered += 1;
            }
        }
        inner.mailboxes.insert(name.to_string(), mailbox);
        true
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.read().mailboxes.contains_key(name)
    }

    /// Close a finished participant's mailbox. Later messages for it are
    /// dropped rather than held.
    pub fn retire(&self, name: &str) {
        let mut inner = self.inner.write();
        inner.mailboxes.remove(name);
        inner.retired.insert(name.to_string());
    }

    /// Deliver a direct message to its recipient, or a broadcast to everyone
    /// still running except the sender.
    pub fn route(&self, message: Message) {
        let mut inner = self.inner.write();
        match message.recipient.clone() {
            Some(recipient) => {
                if inner.retired.contains(&recipient) {
                    debug!(recipient = %recipient, msg = %message.msg_type, "Recipient closed");
                    inner.dropped += 1;
                    return;
                }
                let sent = match inner.mailboxes.get(&recipient) {
                    Some(mailbox) => Some(mailbox.send(message.clone()).is_ok()),
                    None => None,
                };
                match sent {
                    Some(true) => inner.delivered += 1,
                    Some(false) => inner.dropped += 1,
                    None => {
                        debug!(recipient = %recipient, msg = %message.msg_type, "Holding message for recipient");
                        inner.pending.entry(recipient).or_default().push(message);
                    }
                }
            }
            None => {
                let (mut sent, mut failed) = (0, 0);
                for (name, mailbox) in &inner.mailboxes {
                    if *name == message.sender {
                        continue;
                    }
                    if mailbox.send(message.clone()).is_ok() {
                        sent += 1;
                    } else {
                        failed += 1;
                    }
                }
                inner.delivered += sent;
                inner.dropped += failed;
            }
        }
    }

    pub fn delivered(&self) -> usize {
        self.inner.read().delivered
    }

    /// Direct messages whose recipient never joined.
    pub fn undelivered(&self) -> usize {
        self.inner.read().pending.values().map(Vec::len).sum()
    }

    /// Messages for participants that had already finished.
    pub fn dropped(&self) -> usize {
        self.inner.read().dropped
    }
}

async fn drive_actor(
    mut actor: Actor,
    mut inbox: UnboundedReceiver<Message>,
    router: Router,
    max_ticks: u64,
) -> ActorSummary {
    for _ in 0..max_ticks {
        while let Ok(message) = inbox.try_recv() {
            actor.deliver(message);
        }
        actor.tick();
        if actor.is_closed() {
            break;
        }
        tokio::task::yield_now().await;
    }
    if !actor.is_closed() {
        info!(actor = %actor.name(), max_ticks, "Tick cap hit");
    }
    router.retire(actor.name());
    inbox.close();
    actor.summary()
}

struct Spawner {
    router: Router,
    joins: UnboundedSender<Participant>,
    seed: Option<u64>,
    spawned: usize,
    max_ticks: u64,
}

impl Spawner {
    fn spawn(
        &mut self,
        set: &mut JoinSet<ActorSummary>,
        record: &Participant,
        adopt: bool,
    ) -> Result<()> {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        if !self.router.register(&record.name, mailbox) {
            debug!(participant = %record.name, "Already in case");
            return Ok(());
        }

        let seed = self.seed.map(|s| s.wrapping_add(self.spawned as u64));
        self.spawned += 1;

        let emitter = self.router.clone();
        let joins = self.joins.clone();
        let mut actor = build_actor(&record.name, record.role, seed)?
            .with_emitter(move |message| emitter.route(message))
            .with_add_participant(move |participant| {
                if joins.send(participant).is_err() {
                    warn!("Join channel closed");
                }
            });
        if adopt {
            adopt_case_state(&mut actor, record);
        }

        set.spawn(drive_actor(actor, inbox, self.router.clone(), self.max_ticks));
        Ok(())
    }
}

/// Run every configured participant as its own task until all of them close
/// or hit the tick cap. Participants brought in mid-run get their own tasks.
pub async fn run_concurrent(config: &SimConfig) -> Result<SimReport> {
    let router = Router::new();
    let (joins_tx, mut joins) = mpsc::unbounded_channel::<Participant>();
    let mut spawner = Spawner {
        router: router.clone(),
        joins: joins_tx,
        seed: config.seed,
        spawned: 0,
        max_ticks: config.max_ticks,
    };

    let mut set = JoinSet::new();
    for participant in &config.participants {
        let record = Participant::new(participant.name.clone(), participant.role);
        spawner.spawn(&mut set, &record, false)?;
    }

    let mut actors = Vec::new();
    loop {
        tokio::select! {
            biased;
            Some(record) = joins.recv() => {
                info!(participant = %record.name, role = %record.role, "Participant joined");
                spawner.spawn(&mut set, &record, true)?;
            }
            next = set.join_next() => match next {
                Some(summary) => actors.push(summary?),
                None => break,
            },
        }
    }

    actors.sort_by(|a: &ActorSummary, b: &ActorSummary| a.name.cmp(&b.name));
    let rounds = actors.iter().map(|a| a.ticks).max().unwrap_or(0);
    let undelivered = router.undelivered();
    if undelivered > 0 {
        warn!(undelivered, "Direct messages never delivered");
    }

    Ok(SimReport {
        mode: SimMode::Concurrent,
        rounds,
        delivered: router.delivered(),
        undelivered,
        dropped: router.dropped(),
        actors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvd_core::MessageType;

    #[test]
    fn test_router_holds_direct_messages_until_join() {
        let router = Router::new();
        router.route(Message::new(MessageType::ReportSubmission, "a").to("late"));
        assert_eq!(router.undelivered(), 1);

        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(router.register("late", tx));
        assert_eq!(router.undelivered(), 0);
        assert_eq!(router.delivered(), 1);
        assert_eq!(rx.try_recv().unwrap().msg_type, MessageType::ReportSubmission);
    }

    #[test]
    fn test_router_broadcast_skips_sender() {
        let router = Router::new();
        let (a_tx, mut a_rx) = mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = mpsc::unbounded_channel();
        router.register("a", a_tx);
        router.register("b", b_tx);

        router.route(Message::new(MessageType::GeneralInquiry, "a"));
        assert!(a_rx.try_recv().is_err());
        assert!(b_rx.try_recv().is_ok());
        assert!(!router.register("a", mpsc::unbounded_channel().0));
    }

    #[test]
    fn test_router_drops_messages_for_retired_participants() {
        let router = Router::new();
        let (a_tx, _a_rx) = mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = mpsc::unbounded_channel();
        router.register("a", a_tx);
        router.register("b", b_tx);
        router.retire("b");

        router.route(Message::new(MessageType::ReportSubmission, "a").to("b"));
        router.route(Message::new(MessageType::GeneralInquiry, "a"));

        assert_eq!(router.undelivered(), 0);
        assert_eq!(router.dropped(), 1);
        assert_eq!(router.delivered(), 0);
        assert!(b_rx.try_recv().is_err());
        assert!(!router.is_registered("b"));
        assert!(!router.register("b", mpsc::unbounded_channel().0));
    }
}
