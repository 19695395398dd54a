//! CVD protocol simulator
//!
//! Runs coordinated vulnerability disclosure cases between simulated
//! participants, each driven by its own behavior tree.
//!
//! ## Modes
//!
//! - `bot` - one actor holding every role, fed random outside events
//! - `case` - the configured participants ticked in lock-step rounds
//! - `concurrent` - one tokio task per participant
//!
//! Configuration comes from `CVD_*` environment variables (see `config.rs`).

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cvd_sim::config::{OutputFormat, SimConfig, SimMode};
use cvd_sim::{runner, simulation};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the filter reads RUST_LOG
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cvd_sim=info,cvd_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SimConfig::from_env()?;

    info!("Starting CVD simulation");
    info!("Mode: {}", config.mode);
    info!("Max ticks: {}", config.max_ticks);
    if let Some(seed) = config.seed {
        info!("Seed: {}", seed);
    }

    let report = match config.mode {
        SimMode::Bot => simulation::run_bot(&config)?,
        SimMode::Case => simulation::run_case(&config)?,
        SimMode::Concurrent => runner::run_concurrent(&config).await?,
    };

    info!(
        rounds = report.rounds,
        all_closed = report.all_closed(),
        "Simulation finished"
    );

    match config.output {
        OutputFormat::Table => print!("{}", report.to_table()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
