//! CVD protocol simulator - Library
//!
//! Re-exports the simulation drivers for integration testing and external use.

pub mod config;
pub mod report;
pub mod runner;
pub mod simulation;

pub use config::{OutputFormat, SimConfig, SimMode};
pub use report::SimReport;
