//! End-of-run report shared by every driver.

use std::fmt::Write;

use cvd_core::ActorSummary;
use serde::Serialize;

use crate::config::SimMode;

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub mode: SimMode,
    /// Rounds run (lock-step) or the longest actor's tick count.
    pub rounds: u64,
    pub delivered: usize,
    pub undelivered: usize,
    /// Messages not delivered because the recipient had already closed.
    pub dropped: usize,
    pub actors: Vec<ActorSummary>,
}

impl SimReport {
    pub fn all_closed(&self) -> bool {
        self.actors.iter().all(|a| a.closed)
    }

    pub fn actor(&self, name: &str) -> Option<&ActorSummary> {
        self.actors.iter().find(|a| a.name == name)
    }

    /// Plain-text table, one row per actor.
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "mode={} rounds={} delivered={} undelivered={} dropped={}",
            self.mode, self.rounds, self.delivered, self.undelivered, self.dropped
        );
        let _ = writeln!(
            out,
            "{:<16} {:<6} {:>6} {:<9} {:<8} {:<7} {:>5}  {}",
            "ACTOR", "ROLE", "TICKS", "RM", "EM", "CS", "SENT", "RM HISTORY"
        );
        for a in &self.actors {
            let history = a
                .q_rm_history
                .iter()
                .map(|s| s.code())
                .collect::<Vec<_>>()
                .join(">");
            let _ = writeln!(
                out,
                "{:<16} {:<6} {:>6} {:<9} {:<8} {:<7} {:>5}  {}",
                a.name,
                a.role.to_string(),
                a.ticks,
                a.q_rm.to_string(),
                a.q_em.to_string(),
                a.q_cs.to_string(),
                a.messages_sent,
                history
            );
        }
        out
    }
}
