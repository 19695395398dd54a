//! Stochastic leaves and the decision policy seam.
//!
//! Fuzzer leaves stand in for decisions nobody has automated yet (a human
//! analyst, an outside event). Each one names a [`Decision`] with a default
//! [`Weight`]; the blackboard settles it, by default through
//! [`WeightedRandom`]. Swapping in another [`Policy`] changes who decides
//! without touching the tree.

use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;

use crate::blackboard::Blackboard;
use crate::leaf::{Leaf, LeafKind};

/// Default outcome distribution of a stochastic decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weight {
    Always,
    Never,
    Running,
    /// Half `Success`, half `Running`.
    SuccessOrRunning,
    /// Succeeds with the given probability, fails otherwise.
    Chance(f64),
}

impl Weight {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<bool> {
        match *self {
            Weight::Always => Some(true),
            Weight::Never => Some(false),
            Weight::Running => None,
            Weight::SuccessOrRunning => {
                if rng.gen_bool(0.5) {
                    Some(true)
                } else {
                    None
                }
            }
            Weight::Chance(p) => Some(rng.gen::<f64>() < p),
        }
    }

    /// Probability of a `Success` outcome.
    pub fn success_probability(&self) -> f64 {
        match *self {
            Weight::Always => 1.0,
            Weight::Never | Weight::Running => 0.0,
            Weight::SuccessOrRunning => 0.5,
            Weight::Chance(p) => p,
        }
    }
}

// ============================================================================
// Named weights
// ============================================================================

pub const ALWAYS_SUCCEED: Weight = Weight::Always;
pub const ALWAYS_FAIL: Weight = Weight::Never;
pub const ALWAYS_RUNNING: Weight = Weight::Running;
pub const SUCCESS_OR_RUNNING: Weight = Weight::SuccessOrRunning;
pub const ONE_NINETY_NINE_IN_TWO_HUNDRED: Weight = Weight::Chance(0.995);
pub const NINETY_NINE_IN_ONE_HUNDRED: Weight = Weight::Chance(0.99);
pub const FORTY_NINE_IN_FIFTY: Weight = Weight::Chance(0.98);
pub const TWENTY_NINE_IN_THIRTY: Weight = Weight::Chance(29.0 / 30.0);
pub const NINETEEN_IN_TWENTY: Weight = Weight::Chance(0.95);
pub const ALMOST_CERTAINLY_SUCCEED: Weight = Weight::Chance(0.93);
pub const ALMOST_ALWAYS_SUCCEED: Weight = Weight::Chance(0.9);
pub const USUALLY_SUCCEED: Weight = Weight::Chance(0.75);
pub const OFTEN_SUCCEED: Weight = Weight::Chance(0.7);
pub const PROBABLY_SUCCEED: Weight = Weight::Chance(2.0 / 3.0);
pub const UNIFORM_SUCCEED_FAIL: Weight = Weight::Chance(0.5);
pub const PROBABLY_FAIL: Weight = Weight::Chance(1.0 / 3.0);
pub const OFTEN_FAIL: Weight = Weight::Chance(0.3);
pub const USUALLY_FAIL: Weight = Weight::Chance(0.25);
pub const ALMOST_ALWAYS_FAIL: Weight = Weight::Chance(0.1);
pub const ALMOST_CERTAINLY_FAIL: Weight = Weight::Chance(0.07);
pub const ONE_IN_TWENTY: Weight = Weight::Chance(0.05);
pub const ONE_IN_THIRTY: Weight = Weight::Chance(1.0 / 30.0);
pub const ONE_IN_FIFTY: Weight = Weight::Chance(0.02);
pub const ONE_IN_ONE_HUNDRED: Weight = Weight::Chance(0.01);
pub const ONE_IN_TWO_HUNDRED: Weight = Weight::Chance(0.005);

/// A named decision point together with its default weight.
#[derive(Debug, Clone, Copy)]
pub struct Decision<'a> {
    pub name: &'a str,
    pub weight: Weight,
}

impl<'a> Decision<'a> {
    pub fn new(name: &'a str, weight: Weight) -> Self {
        Self { name, weight }
    }
}

/// Whoever settles decisions for a blackboard.
pub trait Policy: Send {
    fn decide(&mut self, decision: &Decision<'_>, rng: &mut StdRng) -> Option<bool>;
}

/// Samples every decision from its default weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRandom;

impl Policy for WeightedRandom {
    fn decide(&mut self, decision: &Decision<'_>, rng: &mut StdRng) -> Option<bool> {
        decision.weight.sample(rng)
    }
}

/// Pins selected decisions to fixed outcomes and samples the rest.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPolicy {
    overrides: HashMap<String, Option<bool>>,
}

impl ScriptedPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `outcome` for the decision called `name`.
    pub fn with(mut self, name: impl Into<String>, outcome: Option<bool>) -> Self {
        self.overrides.insert(name.into(), outcome);
        self
    }

    pub fn always(self, name: impl Into<String>) -> Self {
        self.with(name, Some(true))
    }

    pub fn never(self, name: impl Into<String>) -> Self {
        self.with(name, Some(false))
    }

    pub fn is_scripted(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }
}

impl Policy for ScriptedPolicy {
    fn decide(&mut self, decision: &Decision<'_>, rng: &mut StdRng) -> Option<bool> {
        match self.overrides.get(decision.name) {
            Some(outcome) => *outcome,
            None => decision.weight.sample(rng),
        }
    }
}

/// Leaf whose outcome is a stochastic decision.
#[derive(Debug, Clone)]
pub struct Fuzzer {
    name: String,
    weight: Weight,
}

impl Fuzzer {
    pub fn new(name: impl Into<String>, weight: Weight) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }
}

impl<B: Blackboard> Leaf<B> for Fuzzer {
    fn kind(&self) -> LeafKind {
        LeafKind::Fuzzer
    }

    fn func(&mut self, bb: &mut B) -> Option<bool> {
        bb.decide(&Decision::new(&self.name, self.weight))
    }
}
