//! Configuration module - Environment-based configuration
//!
//! Every setting has a default so a bare `cvd-sim` run works out of the box.

use std::env;
use std::fmt;
use std::str::FromStr;

use cvd_core::CvdRoles;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown simulation mode: {0}")]
    UnknownMode(String),

    #[error("Unknown output format: {0}")]
    UnknownOutput(String),

    #[error("Participant entry '{0}' is not of the form name:ROLES")]
    MalformedParticipant(String),

    #[error("Participant '{name}' has invalid roles: {source}")]
    InvalidRoles {
        name: String,
        source: cvd_core::CvdError,
    },

    #[error("Duplicate participant name: {0}")]
    DuplicateParticipant(String),

    #[error("Case simulations need at least one participant")]
    NoParticipants,
}

/// Which driver runs the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimMode {
    /// One all-roles actor fed random outside events.
    Bot,
    /// Several actors ticked in lock-step rounds.
    Case,
    /// One tokio task per actor.
    Concurrent,
}

impl FromStr for SimMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bot" => Ok(SimMode::Bot),
            "case" => Ok(SimMode::Case),
            "concurrent" => Ok(SimMode::Concurrent),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for SimMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SimMode::Bot => "bot",
            SimMode::Case => "case",
            SimMode::Concurrent => "concurrent",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::UnknownOutput(other.to_string())),
        }
    }
}

/// One configured case participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantConfig {
    pub name: String,
    pub role: CvdRoles,
}

pub const DEFAULT_PARTICIPANTS: &str = "finder:FR,vendor:V,coordinator:C";

/// Parse a `name:ROLES` list such as `finder:FR,vendor:VD`.
pub fn parse_participants(raw: &str) -> Result<Vec<ParticipantConfig>, ConfigError> {
    let mut participants: Vec<ParticipantConfig> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, roles) = entry
            .split_once(':')
            .ok_or_else(|| ConfigError::MalformedParticipant(entry.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::MalformedParticipant(entry.to_string()));
        }
        let role = roles
            .trim()
            .parse::<CvdRoles>()
            .map_err(|source| ConfigError::InvalidRoles {
                name: name.to_string(),
                source,
            })?;
        if participants.iter().any(|p| p.name == name) {
            return Err(ConfigError::DuplicateParticipant(name.to_string()));
        }
        participants.push(ParticipantConfig {
            name: name.to_string(),
            role,
        });
    }
    Ok(participants)
}

/// Simulation configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub mode: SimMode,
    pub max_ticks: u64,
    pub seed: Option<u64>,
    pub participants: Vec<ParticipantConfig>,
    pub output: OutputFormat,
}

impl SimConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = get("CVD_MODE")
            .unwrap_or_else(|| "bot".to_string())
            .parse()?;
        let max_ticks = get("CVD_MAX_TICKS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1000);
        let seed = get("CVD_SEED").and_then(|v| v.trim().parse().ok());
        let participants = parse_participants(
            &get("CVD_PARTICIPANTS").unwrap_or_else(|| DEFAULT_PARTICIPANTS.to_string()),
        )?;
        let output = get("CVD_OUTPUT")
            .unwrap_or_else(|| "table".to_string())
            .parse()?;

        if mode != SimMode::Bot && participants.is_empty() {
            return Err(ConfigError::NoParticipants);
        }

        Ok(Self {
            mode,
            max_ticks,
            seed,
            participants,
            output,
        })
    }

    /// Seed for the `index`th actor, if runs are seeded.
    pub fn seed_for(&self, index: usize) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(index as u64))
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mode: SimMode::Bot,
            max_ticks: 1000,
            seed: None,
            participants: parse_participants(DEFAULT_PARTICIPANTS).unwrap_or_default(),
            output: OutputFormat::Table,
        }
    }
}
