//! Transitive dependencies of every node in a block.
//!
//! A node depends on its inputs and its chain, and on everything those
//! depend on. Blocks may list a node before the nodes it reads, so each
//! closure is computed by its own walk rather than in id order.

use rustc_hash::FxHashSet;
use tessel_ir::{BlockDag, NodeId};

#[derive(Clone, Debug, Default)]
pub struct DependencyMap {
    deps: Vec<FxHashSet<NodeId>>,
}

impl DependencyMap {
    pub fn new(dag: &BlockDag) -> Self {
        let deps = dag.ids().map(|id| closure(dag, id)).collect();
        Self { deps }
    }

    /// Every node `node` transitively depends on. Includes `node` itself
    /// only when it sits on a cycle.
    pub fn of(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.deps
            .get(node.index())
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}

/// Nodes reachable from `start` through inputs and chains. References
/// past the end of the block are ignored.
fn closure(dag: &BlockDag, start: NodeId) -> FxHashSet<NodeId> {
    let mut seen = FxHashSet::default();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        let node = dag.node(id);
        for &pred in node.inputs.iter().chain(node.chain.iter()) {
            if pred.index() < dag.len() && seen.insert(pred) {
                stack.push(pred);
            }
        }
    }
    seen
}
