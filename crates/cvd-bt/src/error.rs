//! Error types for tree construction.

use thiserror::Error;

/// Errors raised while compiling a [`NodeSpec`](crate::NodeSpec) into a tree.
///
/// These are configuration defects. Ticking a compiled tree never produces
/// one: disallowed transitions and empty queues are plain `Failure` results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BtError {
    #[error("Leaf node '{node}' cannot have children (found {found})")]
    LeafWithChildren { node: String, found: usize },

    #[error("Decorator '{node}' needs exactly one child (found {found})")]
    DecoratorArity { node: String, found: usize },

    #[error("Parallel node '{node}' needs at least 2 children (found {found})")]
    ParallelTooFewChildren { node: String, found: usize },

    #[error("Parallel node '{node}' threshold {min_success} outside [1, {children}]")]
    ParallelThreshold {
        node: String,
        min_success: usize,
        children: usize,
    },
}
