//! The contract every blackboard type offers to the engine.

use rand::rngs::StdRng;

use crate::fuzzer::Decision;

/// Shared mutable state visible to every node of one tree.
///
/// The engine only needs two things from it: a random source (for the
/// shuffled child order of `Parallel` nodes) and a way to settle stochastic
/// decisions. Everything else is domain state read and written by leaves.
pub trait Blackboard {
    /// Random source used for child shuffling and default decisions.
    fn rng(&mut self) -> &mut StdRng;

    /// Settle a decision that stands in for a human or an external event.
    ///
    /// The default samples the decision's weight. Blackboards that carry a
    /// [`Policy`](crate::Policy) route the call through it instead.
    fn decide(&mut self, decision: &Decision<'_>) -> Option<bool> {
        decision.weight.sample(self.rng())
    }
}
