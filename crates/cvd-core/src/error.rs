//! Error types for the protocol crate.

use cvd_bt::BtError;
use thiserror::Error;

/// Errors raised while assembling actors or parsing protocol values.
///
/// Guard failures during a tick are never errors; they surface as
/// `NodeStatus::Failure`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CvdError {
    #[error("Behavior tree construction failed: {0}")]
    Tree(#[from] BtError),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Unknown role letter: {0:?}")]
    UnknownRole(char),

    #[error("Unknown state: {0}")]
    UnknownState(String),
}
