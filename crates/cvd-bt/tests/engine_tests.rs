//! Integration tests for the behavior tree engine.
//!
//! These exercise the composite short-circuit rules over many child layouts,
//! the Parallel threshold bound under different seeds, and fuzzer leaves
//! routed through a blackboard-held policy.

use cvd_bt::{
    BehaviorTree, Blackboard, Decision, NodeSpec, NodeStatus, Policy, ScriptedPolicy,
    WeightedRandom, ALMOST_ALWAYS_FAIL, ALWAYS_SUCCEED, UNIFORM_SUCCEED_FAIL,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Helpers
// ============================================================================

/// Blackboard that records which leaves ran and owns a decision policy.
struct Trace {
    rng: StdRng,
    policy: Box<dyn Policy>,
    ticked: Vec<usize>,
}

impl Trace {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            policy: Box::new(WeightedRandom),
            ticked: Vec::new(),
        }
    }

    fn with_policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }
}

impl Blackboard for Trace {
    fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn decide(&mut self, decision: &Decision<'_>) -> Option<bool> {
        self.policy.decide(decision, &mut self.rng)
    }
}

fn leaf(index: usize, status: NodeStatus) -> NodeSpec<Trace> {
    NodeSpec::action(format!("leaf{index}"), move |bb: &mut Trace| {
        bb.ticked.push(index);
        match status {
            NodeStatus::Success => Some(true),
            NodeStatus::Failure => Some(false),
            NodeStatus::Running => None,
        }
    })
}

// ============================================================================
// Composite properties
// ============================================================================

/// `[Success]*k + [X] + ...` gives X and never ticks past position k+1.
#[test]
fn test_sequence_prefix_property() {
    for k in 0..5 {
        for x in [NodeStatus::Failure, NodeStatus::Running] {
            let mut children: Vec<_> = (0..k).map(|i| leaf(i, NodeStatus::Success)).collect();
            children.push(leaf(k, x));
            children.push(leaf(k + 1, NodeStatus::Success));
            children.push(leaf(k + 2, NodeStatus::Failure));

            let mut tree =
                BehaviorTree::new(NodeSpec::sequence("Seq", children), Trace::new(0)).unwrap();
            assert_eq!(tree.tick(), x);
            assert_eq!(tree.blackboard().ticked, (0..=k).collect::<Vec<_>>());
        }
    }
}

/// Dual of the sequence property with success and failure swapped.
#[test]
fn test_fallback_prefix_property() {
    for k in 0..5 {
        for x in [NodeStatus::Success, NodeStatus::Running] {
            let mut children: Vec<_> = (0..k).map(|i| leaf(i, NodeStatus::Failure)).collect();
            children.push(leaf(k, x));
            children.push(leaf(k + 1, NodeStatus::Failure));

            let mut tree =
                BehaviorTree::new(NodeSpec::fallback("Sel", children), Trace::new(0)).unwrap();
            assert_eq!(tree.tick(), x);
            assert_eq!(tree.blackboard().ticked, (0..=k).collect::<Vec<_>>());
        }
    }
}

#[test]
fn test_parallel_all_success_evaluates_at_most_m() {
    for seed in 0..20 {
        for n in 2..6 {
            for m in 1..=n {
                let children = (0..n).map(|i| leaf(i, NodeStatus::Success)).collect();
                let spec = NodeSpec::parallel("Par", m, children);
                let mut tree = BehaviorTree::new(spec, Trace::new(seed)).unwrap();

                assert_eq!(tree.tick(), NodeStatus::Success);
                assert_eq!(tree.blackboard().ticked.len(), m);
            }
        }
    }
}

#[test]
fn test_parallel_order_is_shuffled() {
    let mut orders = std::collections::HashSet::new();
    for seed in 0..30 {
        let children = (0..4).map(|i| leaf(i, NodeStatus::Failure)).collect();
        let mut tree =
            BehaviorTree::new(NodeSpec::parallel("Par", 4, children), Trace::new(seed)).unwrap();
        tree.tick();
        orders.insert(tree.blackboard().ticked.first().copied());
    }
    assert!(orders.len() > 1, "first child ticked was always the same");
}

#[test]
fn test_same_seed_same_run() {
    let run = |seed| {
        let children = (0..6)
            .map(|i| {
                NodeSpec::sequence(
                    format!("s{i}"),
                    vec![
                        NodeSpec::fuzzer(format!("coin{i}"), UNIFORM_SUCCEED_FAIL),
                        leaf(i, NodeStatus::Success),
                    ],
                )
            })
            .collect();
        let mut tree =
            BehaviorTree::new(NodeSpec::parallel("Par", 3, children), Trace::new(seed)).unwrap();
        let status = tree.tick();
        (status, tree.blackboard().ticked.clone())
    };
    assert_eq!(run(11), run(11));
}

// ============================================================================
// Fuzzers and policies
// ============================================================================

#[test]
fn test_scripted_policy_steers_fuzzers() {
    let spec = NodeSpec::sequence(
        "Root",
        vec![
            NodeSpec::fuzzer("RareEvent", ALMOST_ALWAYS_FAIL),
            NodeSpec::invert("NotUsual", NodeSpec::fuzzer("UsualEvent", ALWAYS_SUCCEED)),
            leaf(0, NodeStatus::Success),
        ],
    );
    let policy = ScriptedPolicy::new()
        .always("RareEvent")
        .never("UsualEvent");
    let mut tree = BehaviorTree::new(spec, Trace::new(5).with_policy(policy)).unwrap();

    for _ in 0..10 {
        assert_eq!(tree.tick(), NodeStatus::Success);
    }
    assert_eq!(tree.blackboard().ticked.len(), 10);
}

#[test]
fn test_nodes_persist_across_ticks() {
    let spec = NodeSpec::fallback(
        "Root",
        vec![leaf(0, NodeStatus::Failure), leaf(1, NodeStatus::Running)],
    );
    let mut tree = BehaviorTree::new(spec, Trace::new(0)).unwrap();
    assert_eq!(tree.tick(), NodeStatus::Running);
    assert_eq!(tree.tick(), NodeStatus::Running);
    assert_eq!(tree.blackboard().ticked, vec![0, 1, 0, 1]);
    assert_eq!(tree.root().children()[1].status(), Some(NodeStatus::Running));
}
