//! Tests for the simulation drivers
//!
//! - Bot run stays within its tick cap and keeps consistent histories
//! - Lock-step case: a discovered report reaches the vendor
//! - Concurrent case: every participant runs to completion in its own task
//! - JSON report shape

use cvd_core::{CvdRoles, RmState};
use cvd_sim::config::{parse_participants, OutputFormat, SimConfig, SimMode};
use cvd_sim::runner::run_concurrent;
use cvd_sim::simulation::{run_bot, run_case, CaseSimulation};

fn config(mode: SimMode, max_ticks: u64) -> SimConfig {
    SimConfig {
        mode,
        max_ticks,
        seed: Some(1234),
        participants: parse_participants("finder:FR,vendor:V,coordinator:C").unwrap(),
        output: OutputFormat::Json,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Bot
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_bot_run_is_bounded_and_consistent() {
    let report = run_bot(&config(SimMode::Bot, 300)).unwrap();
    assert_eq!(report.actors.len(), 1);

    let bot = &report.actors[0];
    assert!(bot.ticks <= 300);
    assert_eq!(bot.role, CvdRoles::FINDER_REPORTER_VENDOR_DEPLOYER_COORDINATOR);
    assert_eq!(bot.q_rm_history.first(), Some(&RmState::Start));
    assert_eq!(bot.q_rm_history.last(), Some(&bot.q_rm));
    if bot.closed {
        assert_eq!(bot.q_rm, RmState::Closed);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Lock-step case
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_case_report_reaches_vendor() {
    let report = run_case(&config(SimMode::Case, 200)).unwrap();

    let finder = report.actor("finder").unwrap();
    assert_ne!(finder.q_rm, RmState::Start);

    let vendor = report.actor("vendor").unwrap();
    assert_ne!(vendor.q_rm_history, vec![RmState::Start]);
    assert!(vendor.q_cs.vendor_aware());
    assert!(report.delivered > 0);
}

#[test]
fn test_case_rounds_respect_cap() {
    let mut sim = CaseSimulation::new(&config(SimMode::Case, 5)).unwrap();
    let rounds = sim.run(5).unwrap();
    assert!(rounds <= 5);
    for actor in sim.actors() {
        assert!(actor.state().tick <= 5);
        assert_eq!(actor.state().state_log.len() as u64, actor.state().tick);
    }
}

#[test]
fn test_closed_actors_stop_receiving() {
    let mut config = config(SimMode::Case, 400);
    config.seed = Some(0);
    config.participants = parse_participants("finder:FR,vendor:V,coordinator:C,dep:D").unwrap();
    let mut sim = CaseSimulation::new(&config).unwrap();
    sim.run(400).unwrap();

    let queued_at_close: Vec<(String, usize)> = sim
        .actors()
        .iter()
        .filter(|a| a.is_closed())
        .map(|a| (a.name().to_string(), a.state().incoming_messages.len()))
        .collect();

    for _ in 0..50 {
        sim.round().unwrap();
    }

    for (name, queued) in queued_at_close {
        let actor = sim.actor(&name).unwrap();
        assert_eq!(actor.state().incoming_messages.len(), queued, "{name} kept receiving");
    }
}

#[test]
fn test_case_report_serializes() {
    let report = run_case(&config(SimMode::Case, 20)).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["mode"], "case");
    assert!(json["dropped"].is_u64());
    assert!(json["actors"].as_array().unwrap().len() >= 3);
    assert!(json["actors"][0]["q_rm_history"].is_array());
}

// ═══════════════════════════════════════════════════════════════════════════
// Concurrent case
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_concurrent_runs_every_participant() {
    let report = run_concurrent(&config(SimMode::Concurrent, 150)).await.unwrap();

    for name in ["finder", "vendor", "coordinator"] {
        let actor = report.actor(name).unwrap();
        assert!(actor.ticks <= 150, "{name} ran {} ticks", actor.ticks);
    }
    assert_ne!(report.actor("finder").unwrap().q_rm, RmState::Start);
    assert!(report.rounds <= 150);
}
