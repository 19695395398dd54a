//! Declarative tree descriptors and the builder that compiles them.
//!
//! A [`NodeSpec`] is a tagged description of one node plus the ordered
//! descriptors of its children. Sub-trees that appear in several places are
//! produced by calling the same constructor function again, so every use gets
//! its own node instances. [`TreeBuilder`] checks arity rules and hands out
//! node identities from its own counter.

use crate::blackboard::Blackboard;
use crate::error::BtError;
use crate::fuzzer::{Fuzzer, Weight};
use crate::leaf::{ActionFn, ConditionFn, Leaf};
use crate::node::{Node, NodeId, NodeKind};

/// Single-child transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoratorKind {
    /// Swap success and failure; running passes through.
    Invert,
    /// Tick the child for its side effects, then succeed.
    ForceSuccess,
    /// Tick the child for its side effects, then fail.
    ForceFailure,
    /// Tick the child for its side effects, then report running.
    ForceRunning,
    /// Anything but failure becomes success.
    RunningIsSuccess,
    /// Anything but success becomes failure.
    RunningIsFailure,
    /// Re-tick up to `n` times within one call until the child stops failing.
    RetryN { n: usize, reset: bool },
    /// Re-tick up to `n` times while the child keeps succeeding.
    RepeatN { n: usize, reset: bool },
    /// Re-tick until the child fails, then succeed.
    RepeatUntilFail { reset: bool },
}

impl DecoratorKind {
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            DecoratorKind::RetryN { .. }
                | DecoratorKind::RepeatN { .. }
                | DecoratorKind::RepeatUntilFail { .. }
        )
    }

    /// Whether the loop counter is cleared before every tick.
    pub fn resets(&self) -> bool {
        match self {
            DecoratorKind::RetryN { reset, .. }
            | DecoratorKind::RepeatN { reset, .. }
            | DecoratorKind::RepeatUntilFail { reset } => *reset,
            _ => false,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            DecoratorKind::Invert => "^",
            DecoratorKind::ForceSuccess => "S",
            DecoratorKind::ForceFailure => "F",
            DecoratorKind::ForceRunning => "R",
            DecoratorKind::RunningIsSuccess | DecoratorKind::RunningIsFailure => "d",
            DecoratorKind::RetryN { .. }
            | DecoratorKind::RepeatN { .. }
            | DecoratorKind::RepeatUntilFail { .. } => "l",
        }
    }
}

/// The tag of a node descriptor.
pub enum SpecKind<B> {
    Sequence,
    Fallback,
    Parallel { min_success: usize },
    Decorator(DecoratorKind),
    Leaf(Box<dyn Leaf<B>>),
}

/// Declarative description of a node and its children.
pub struct NodeSpec<B> {
    name: String,
    kind: SpecKind<B>,
    children: Vec<NodeSpec<B>>,
}

impl<B> NodeSpec<B> {
    pub fn new(name: impl Into<String>, kind: SpecKind<B>) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NodeSpec<B>>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_child(mut self, child: NodeSpec<B>) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[NodeSpec<B>] {
        &self.children
    }

    // --- Composites ---

    pub fn sequence(name: impl Into<String>, children: Vec<NodeSpec<B>>) -> Self {
        Self::new(name, SpecKind::Sequence).with_children(children)
    }

    pub fn fallback(name: impl Into<String>, children: Vec<NodeSpec<B>>) -> Self {
        Self::new(name, SpecKind::Fallback).with_children(children)
    }

    pub fn parallel(
        name: impl Into<String>,
        min_success: usize,
        children: Vec<NodeSpec<B>>,
    ) -> Self {
        Self::new(name, SpecKind::Parallel { min_success }).with_children(children)
    }

    // --- Decorators ---

    pub fn decorate(name: impl Into<String>, kind: DecoratorKind, child: NodeSpec<B>) -> Self {
        Self::new(name, SpecKind::Decorator(kind)).with_child(child)
    }

    pub fn invert(name: impl Into<String>, child: NodeSpec<B>) -> Self {
        Self::decorate(name, DecoratorKind::Invert, child)
    }

    pub fn force_success(name: impl Into<String>, child: NodeSpec<B>) -> Self {
        Self::decorate(name, DecoratorKind::ForceSuccess, child)
    }

    pub fn force_failure(name: impl Into<String>, child: NodeSpec<B>) -> Self {
        Self::decorate(name, DecoratorKind::ForceFailure, child)
    }

    pub fn repeat_until_fail(name: impl Into<String>, child: NodeSpec<B>) -> Self {
        Self::decorate(name, DecoratorKind::RepeatUntilFail { reset: true }, child)
    }

    // --- Leaves ---

    pub fn leaf(name: impl Into<String>, leaf: impl Leaf<B> + 'static) -> Self {
        Self::new(name, SpecKind::Leaf(Box::new(leaf)))
    }

    /// Action leaf from a closure returning success/failure/running.
    pub fn action<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&mut B) -> Option<bool> + Send + 'static,
    {
        Self::leaf(name, ActionFn::new(f))
    }

    /// Condition leaf from a read-only predicate.
    pub fn check<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&B) -> bool + Send + 'static,
    {
        Self::leaf(name, ConditionFn::new(f))
    }

    /// Leaf that always succeeds without touching the blackboard.
    pub fn succeed(name: impl Into<String>) -> Self
    where
        B: 'static,
    {
        Self::action(name, |_| Some(true))
    }
}

impl<B: Blackboard> NodeSpec<B> {
    /// Stochastic leaf settled by the blackboard's decision policy.
    pub fn fuzzer(name: impl Into<String>, weight: Weight) -> Self {
        let name = name.into();
        let leaf = Fuzzer::new(name.clone(), weight);
        Self::new(name, SpecKind::Leaf(Box::new(leaf)))
    }

    /// Compile with a fresh builder.
    pub fn build(self) -> Result<Node<B>, BtError> {
        TreeBuilder::new().build(self)
    }
}

/// Compiles descriptors into trees, numbering nodes as it goes.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    next_id: u64,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue numbering from `first` (used to keep ids unique across trees).
    pub fn starting_at(first: u64) -> Self {
        Self { next_id: first }
    }

    /// Number of identities handed out so far.
    pub fn issued(&self) -> u64 {
        self.next_id
    }

    pub fn build<B: Blackboard>(&mut self, spec: NodeSpec<B>) -> Result<Node<B>, BtError> {
        let NodeSpec {
            name,
            kind,
            children,
        } = spec;

        let found = children.len();
        let kind = match kind {
            SpecKind::Sequence => NodeKind::Sequence,
            SpecKind::Fallback => NodeKind::Fallback,
            SpecKind::Parallel { min_success } => {
                if found < 2 {
                    return Err(BtError::ParallelTooFewChildren { node: name, found });
                }
                if min_success == 0 || min_success > found {
                    return Err(BtError::ParallelThreshold {
                        node: name,
                        min_success,
                        children: found,
                    });
                }
                NodeKind::Parallel { min_success }
            }
            SpecKind::Decorator(kind) => {
                if found != 1 {
                    return Err(BtError::DecoratorArity { node: name, found });
                }
                NodeKind::Decorator { kind, count: 0 }
            }
            SpecKind::Leaf(leaf) => {
                if found != 0 {
                    return Err(BtError::LeafWithChildren { node: name, found });
                }
                NodeKind::Leaf(leaf)
            }
        };

        self.next_id += 1;
        let id = NodeId(self.next_id);

        let children = children
            .into_iter()
            .map(|child| self.build(child))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Node::from_parts(id, name, kind, children))
    }
}
