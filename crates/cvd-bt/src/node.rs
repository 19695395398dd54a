//! Compiled tree nodes and their tick semantics.

use rand::seq::SliceRandom;
use std::fmt;
use tracing::trace;

use crate::blackboard::Blackboard;
use crate::leaf::Leaf;
use crate::spec::DecoratorKind;
use crate::status::NodeStatus;

/// Identity handed out by the [`TreeBuilder`](crate::TreeBuilder). Only used
/// to tell apart same-named nodes in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) enum NodeKind<B> {
    Sequence,
    Fallback,
    Parallel { min_success: usize },
    Decorator { kind: DecoratorKind, count: usize },
    Leaf(Box<dyn Leaf<B>>),
}

/// A node of a compiled tree. Parents own their children; the blackboard is
/// passed down by reference on every tick and setup call.
pub struct Node<B> {
    id: NodeId,
    name: String,
    kind: NodeKind<B>,
    children: Vec<Node<B>>,
    status: Option<NodeStatus>,
}

impl<B> Node<B> {
    pub(crate) fn from_parts(
        id: NodeId,
        name: String,
        kind: NodeKind<B>,
        children: Vec<Node<B>>,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            children,
            status: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with the identity suffix, unique within one builder's output.
    pub fn label(&self) -> String {
        format!("{}_{}", self.name, self.id)
    }

    /// Result of the most recent tick, `None` if never ticked.
    pub fn status(&self) -> Option<NodeStatus> {
        self.status
    }

    pub fn children(&self) -> &[Node<B>] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Tick counter of a loop decorator.
    pub fn loop_count(&self) -> Option<usize> {
        match &self.kind {
            NodeKind::Decorator { kind, count } if kind.is_loop() => Some(*count),
            _ => None,
        }
    }

    /// Short marker for the node kind used in rendered trees.
    pub fn prefix(&self) -> &'static str {
        match &self.kind {
            NodeKind::Sequence => ">",
            NodeKind::Fallback => "?",
            NodeKind::Parallel { .. } => "=",
            NodeKind::Decorator { kind, .. } => kind.prefix(),
            NodeKind::Leaf(leaf) => leaf.kind().prefix(),
        }
    }

    /// First node named `name` in depth-first order.
    pub fn find(&self, name: &str) -> Option<&Node<B>> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Number of nodes in this sub-tree.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }

    /// Forget the last tick result of every node in this sub-tree.
    pub fn clear_status(&mut self) {
        self.status = None;
        for child in &mut self.children {
            child.clear_status();
        }
    }
}

impl<B: Blackboard> Node<B> {
    /// Run leaf setup hooks in this sub-tree, depth first.
    pub fn setup(&mut self, bb: &mut B) {
        if let NodeKind::Leaf(leaf) = &mut self.kind {
            leaf.setup(bb);
        }
        for child in &mut self.children {
            child.setup(bb);
        }
    }

    /// Tick this node: pre-tick hook, core logic, post-tick hook, then the
    /// result is stored as the node's status.
    pub fn tick(&mut self, bb: &mut B, depth: usize) -> NodeStatus {
        trace!(depth, node = %self.name, id = self.id.0, "tick");
        self.pre_tick();
        let status = self.tick_core(bb, depth);
        self.post_tick(depth, status);
        self.status = Some(status);
        status
    }

    fn pre_tick(&mut self) {
        if let NodeKind::Decorator { kind, count } = &mut self.kind {
            if kind.resets() {
                *count = 0;
            }
        }
    }

    fn post_tick(&self, depth: usize, status: NodeStatus) {
        trace!(depth, node = %self.name, id = self.id.0, %status, "ticked");
    }

    fn tick_core(&mut self, bb: &mut B, depth: usize) -> NodeStatus {
        let Node { kind, children, .. } = self;
        match kind {
            NodeKind::Sequence => {
                for child in children.iter_mut() {
                    match child.tick(bb, depth + 1) {
                        NodeStatus::Success => continue,
                        other => return other,
                    }
                }
                NodeStatus::Success
            }
            NodeKind::Fallback => {
                for child in children.iter_mut() {
                    match child.tick(bb, depth + 1) {
                        NodeStatus::Failure => continue,
                        other => return other,
                    }
                }
                NodeStatus::Failure
            }
            NodeKind::Parallel { min_success } => {
                tick_parallel(*min_success, children, bb, depth)
            }
            NodeKind::Decorator { kind, count } => {
                tick_decorator(*kind, count, &mut children[0], bb, depth)
            }
            NodeKind::Leaf(leaf) => NodeStatus::from_outcome(leaf.func(bb)),
        }
    }
}

/// Ticks children in a freshly shuffled order and stops as soon as either
/// threshold is crossed. Children after the deciding one are not ticked.
fn tick_parallel<B: Blackboard>(
    min_success: usize,
    children: &mut [Node<B>],
    bb: &mut B,
    depth: usize,
) -> NodeStatus {
    let total = children.len();
    let max_failures = total - min_success;

    let mut order: Vec<usize> = (0..total).collect();
    order.shuffle(bb.rng());

    let mut successes = 0;
    let mut failures = 0;
    for index in order {
        match children[index].tick(bb, depth + 1) {
            NodeStatus::Success => {
                successes += 1;
                if successes >= min_success {
                    return NodeStatus::Success;
                }
            }
            NodeStatus::Failure => {
                failures += 1;
                if failures > max_failures {
                    return NodeStatus::Failure;
                }
            }
            NodeStatus::Running => {}
        }
    }
    NodeStatus::Running
}

fn tick_decorator<B: Blackboard>(
    kind: DecoratorKind,
    count: &mut usize,
    child: &mut Node<B>,
    bb: &mut B,
    depth: usize,
) -> NodeStatus {
    match kind {
        DecoratorKind::Invert => match child.tick(bb, depth + 1) {
            NodeStatus::Success => NodeStatus::Failure,
            NodeStatus::Failure => NodeStatus::Success,
            NodeStatus::Running => NodeStatus::Running,
        },
        DecoratorKind::ForceSuccess => {
            child.tick(bb, depth + 1);
            NodeStatus::Success
        }
        DecoratorKind::ForceFailure => {
            child.tick(bb, depth + 1);
            NodeStatus::Failure
        }
        DecoratorKind::ForceRunning => {
            child.tick(bb, depth + 1);
            NodeStatus::Running
        }
        DecoratorKind::RunningIsSuccess => match child.tick(bb, depth + 1) {
            NodeStatus::Failure => NodeStatus::Failure,
            _ => NodeStatus::Success,
        },
        DecoratorKind::RunningIsFailure => match child.tick(bb, depth + 1) {
            NodeStatus::Success => NodeStatus::Success,
            _ => NodeStatus::Failure,
        },
        DecoratorKind::RetryN { n, .. } => {
            for _ in 0..n {
                let status = child.tick(bb, depth + 1);
                *count += 1;
                if !status.is_failure() {
                    return status;
                }
            }
            NodeStatus::Failure
        }
        DecoratorKind::RepeatN { n, .. } => {
            for _ in 0..n {
                let status = child.tick(bb, depth + 1);
                *count += 1;
                if !status.is_success() {
                    return status;
                }
            }
            NodeStatus::Success
        }
        DecoratorKind::RepeatUntilFail { .. } => loop {
            let status = child.tick(bb, depth + 1);
            *count += 1;
            match status {
                NodeStatus::Failure => return NodeStatus::Success,
                // No node may block; hand control back and resume next tick.
                NodeStatus::Running => return NodeStatus::Running,
                NodeStatus::Success => {}
            }
        },
    }
}

impl<B> fmt::Debug for Node<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status)
            .field("children", &self.children)
            .finish()
    }
}
