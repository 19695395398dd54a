//! A compiled tree bundled with the blackboard it runs against.

use crate::blackboard::Blackboard;
use crate::error::BtError;
use crate::node::Node;
use crate::spec::{NodeSpec, TreeBuilder};
use crate::status::NodeStatus;

/// Root node plus the single blackboard shared by every node in it.
pub struct BehaviorTree<B> {
    root: Node<B>,
    blackboard: B,
    is_setup: bool,
    status: Option<NodeStatus>,
    ticks: u64,
}

impl<B: Blackboard> BehaviorTree<B> {
    pub fn new(spec: NodeSpec<B>, blackboard: B) -> Result<Self, BtError> {
        Self::with_builder(&mut TreeBuilder::new(), spec, blackboard)
    }

    /// Compile with a caller-supplied builder so node ids stay unique across
    /// several trees.
    pub fn with_builder(
        builder: &mut TreeBuilder,
        spec: NodeSpec<B>,
        blackboard: B,
    ) -> Result<Self, BtError> {
        Ok(Self {
            root: builder.build(spec)?,
            blackboard,
            is_setup: false,
            status: None,
            ticks: 0,
        })
    }

    /// Run every leaf's setup hook. Idempotent.
    pub fn setup(&mut self) {
        if self.is_setup {
            return;
        }
        self.root.setup(&mut self.blackboard);
        self.is_setup = true;
    }

    /// Tick the root once, setting the tree up first if needed.
    pub fn tick(&mut self) -> NodeStatus {
        self.setup();
        let status = self.root.tick(&mut self.blackboard, 0);
        self.ticks += 1;
        self.status = Some(status);
        status
    }

    pub fn root(&self) -> &Node<B> {
        &self.root
    }

    pub fn blackboard(&self) -> &B {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut B {
        &mut self.blackboard
    }

    pub fn status(&self) -> Option<NodeStatus> {
        self.status
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn into_blackboard(self) -> B {
        self.blackboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::Leaf;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Bb {
        rng: StdRng,
        setups: usize,
        ticks: usize,
    }

    impl Blackboard for Bb {
        fn rng(&mut self) -> &mut StdRng {
            &mut self.rng
        }
    }

    struct CountingLeaf;

    impl Leaf<Bb> for CountingLeaf {
        fn setup(&mut self, bb: &mut Bb) {
            bb.setups += 1;
        }

        fn func(&mut self, bb: &mut Bb) -> Option<bool> {
            bb.ticks += 1;
            Some(true)
        }
    }

    #[test]
    fn test_setup_runs_once_before_first_tick() {
        let spec = NodeSpec::sequence(
            "Root",
            vec![NodeSpec::leaf("A", CountingLeaf), NodeSpec::leaf("B", CountingLeaf)],
        );
        let bb = Bb {
            rng: StdRng::seed_from_u64(0),
            setups: 0,
            ticks: 0,
        };
        let mut tree = BehaviorTree::new(spec, bb).unwrap();

        assert_eq!(tree.tick(), NodeStatus::Success);
        assert_eq!(tree.tick(), NodeStatus::Success);
        assert_eq!(tree.blackboard().setups, 2);
        assert_eq!(tree.blackboard().ticks, 4);
        assert_eq!(tree.ticks(), 2);
        assert_eq!(tree.status(), Some(NodeStatus::Success));
    }
}
