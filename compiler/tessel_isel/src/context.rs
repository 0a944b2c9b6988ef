//! Per-block selection state.

use std::sync::atomic::{AtomicU32, Ordering};

use tessel_ir::{AsmPart, BlockDag, DagNode, NodeId, TypeMap, ValueType};

use crate::deps::DependencyMap;

/// Everything selection needs to know about one block.
pub struct BlockCx<'a> {
    pub dag: &'a BlockDag,
    pub types: &'a TypeMap,
    pub deps: DependencyMap,
    next_temp: AtomicU32,
}

impl<'a> BlockCx<'a> {
    pub fn new(dag: &'a BlockDag, types: &'a TypeMap) -> Self {
        Self {
            dag,
            types,
            deps: DependencyMap::new(dag),
            next_temp: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &'a DagNode {
        self.dag.node(id)
    }

    /// Type of the value `id` yields.
    #[inline]
    pub fn type_of(&self, id: NodeId) -> Option<ValueType> {
        self.types.of_node(self.dag.node(id))
    }

    /// `id`'s value as an operand, if it is a typed producer.
    pub fn value_of(&self, id: NodeId) -> Option<AsmPart> {
        let value = self.node(id).value()?;
        Some(AsmPart::value(value, self.type_of(id)?))
    }

    /// A fresh temporary, unique within the block.
    pub fn fresh_temp(&self, ty: ValueType) -> AsmPart {
        AsmPart::Temp {
            id: self.next_temp.fetch_add(1, Ordering::Relaxed),
            ty,
            half: None,
        }
    }
}
