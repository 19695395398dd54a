//! Leaf behaviour.

use std::fmt;

/// What a leaf represents, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Action,
    Condition,
    Fuzzer,
}

impl LeafKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            LeafKind::Action => "a",
            LeafKind::Condition => "c",
            LeafKind::Fuzzer => "z",
        }
    }
}

/// Behaviour of a leaf node.
///
/// `func` returns `Some(true)` for success, `Some(false)` for failure and
/// `None` for running. Leaves may keep state across ticks in their own
/// fields; the node instance persists for the lifetime of the tree.
pub trait Leaf<B>: Send {
    fn kind(&self) -> LeafKind {
        LeafKind::Action
    }

    /// Called once before the first tick.
    fn setup(&mut self, _bb: &mut B) {}

    fn func(&mut self, bb: &mut B) -> Option<bool>;
}

/// Action leaf backed by a closure.
pub struct ActionFn<F> {
    f: F,
}

impl<F> ActionFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<B, F> Leaf<B> for ActionFn<F>
where
    F: FnMut(&mut B) -> Option<bool> + Send,
{
    fn func(&mut self, bb: &mut B) -> Option<bool> {
        (self.f)(bb)
    }
}

impl<F> fmt::Debug for ActionFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionFn")
    }
}

/// Condition leaf backed by a read-only predicate. Never returns running.
pub struct ConditionFn<F> {
    f: F,
}

impl<F> ConditionFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<B, F> Leaf<B> for ConditionFn<F>
where
    F: Fn(&B) -> bool + Send,
{
    fn kind(&self) -> LeafKind {
        LeafKind::Condition
    }

    fn func(&mut self, bb: &mut B) -> Option<bool> {
        Some((self.f)(bb))
    }
}

impl<F> fmt::Debug for ConditionFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConditionFn")
    }
}
