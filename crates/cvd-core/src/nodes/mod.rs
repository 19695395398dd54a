//! Reusable protocol sub-trees: state conditions and transitions, queue
//! primitives, inbound handlers and discovery.

pub mod case;
pub mod common;
pub mod discovery;
pub mod embargo;
pub mod inbound;
pub mod messaging;
pub mod report;
pub mod roles;

pub use common::Spec;
pub use discovery::discover_vulnerability;
pub use inbound::receive_messages;
