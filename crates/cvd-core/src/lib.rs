//! # cvd-core
//!
//! The multiparty Coordinated Vulnerability Disclosure protocol, expressed as
//! behavior trees over a per-actor blackboard.
//!
//! This crate provides:
//! - The three protocol state axes: Report Management, Embargo Management
//!   and Case State
//! - The message taxonomy and per-actor inbound queue
//! - Inbound handlers that acknowledge or reject each message
//! - The report and embargo workflows an actor runs on its own initiative
//! - An [`Actor`] that ticks the composed protocol tree

pub mod actor;
pub mod cs;
pub mod em;
pub mod error;
pub mod message;
pub mod nodes;
pub mod priority;
pub mod protocol;
pub mod rm;
pub mod roles;
pub mod roster;
pub mod state;
pub mod workflow;

pub use actor::*;
pub use cs::*;
pub use em::*;
pub use error::*;
pub use message::*;
pub use priority::*;
pub use protocol::{protocol_root, snapshot};
pub use rm::*;
pub use roles::*;
pub use roster::*;
pub use state::*;
