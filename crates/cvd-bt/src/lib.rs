//! # cvd-bt
//!
//! Behavior tree execution engine used by the CVD protocol simulator.
//!
//! Trees are declared as [`NodeSpec`] descriptors and compiled once into a
//! concrete [`Node`] tree, which is then ticked many times against a single
//! mutable blackboard. The engine is single-threaded and cooperative:
//! `Running` is the only suspension signal and no node ever blocks.

pub mod blackboard;
pub mod error;
pub mod fuzzer;
pub mod leaf;
pub mod node;
pub mod render;
pub mod spec;
pub mod status;
pub mod tree;

pub use blackboard::*;
pub use error::*;
pub use fuzzer::*;
pub use leaf::*;
pub use node::*;
pub use spec::*;
pub use status::*;
pub use tree::*;
