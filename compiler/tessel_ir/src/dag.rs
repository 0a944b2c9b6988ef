//! Per-basic-block dependency DAG.
//!
//! The DAG is built by an earlier phase and is read-only here. Nodes live
//! in an arena owned by [`BlockDag`] and are addressed by [`NodeId`]; two
//! nodes are "the same node" exactly when their ids are equal.
//!
//! # Chains
//!
//! Besides data inputs, a side-effecting node (load, store, call) may carry
//! a `chain` edge to the node it must be ordered after. Chains are what the
//! tile validator checks to keep a tile from reordering side effects.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::op::{NodeShape, Operation};
use crate::ty::ValueType;

// ── ID newtypes ─────────────────────────────────────────────────────

/// Node index within a [`BlockDag`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identifier of the value a producer node yields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ValueId(u32);

impl ValueId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

// ── Nodes ───────────────────────────────────────────────────────────

/// Leaf payload of nodes whose meaning is not expressed by inputs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Immediate {
    /// Literal integer (`CONSTANT`).
    Int(i64),
    /// Link-time symbol: a global's address (`CONSTANT`) or a direct call
    /// target (`CALL`/`CALLV`).
    Symbol(String),
    /// Function argument index (`ARG`).
    Arg(u32),
    /// Frame offset of a stack slot (`SLOT`).
    Slot { offset: i32 },
}

/// Producer or terminator payload of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Producer { value: ValueId },
    Terminator { targets: SmallVec<[String; 2]> },
}

/// One operation in a block DAG.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DagNode {
    pub op: Operation,
    pub kind: NodeKind,
    pub inputs: SmallVec<[NodeId; 2]>,
    pub chain: Option<NodeId>,
    pub imm: Option<Immediate>,
}

impl DagNode {
    /// The value this node yields, if it is a producer.
    #[inline]
    pub fn value(&self) -> Option<ValueId> {
        match self.kind {
            NodeKind::Producer { value } => Some(value),
            NodeKind::Terminator { .. } => None,
        }
    }

    #[inline]
    pub fn is_producer(&self) -> bool {
        matches!(self.kind, NodeKind::Producer { .. })
    }

    /// Branch targets of a terminator; empty for producers.
    pub fn targets(&self) -> &[String] {
        match &self.kind {
            NodeKind::Terminator { targets } => targets,
            NodeKind::Producer { .. } => &[],
        }
    }

    /// Condition input of a `BRANCH`.
    pub fn condition(&self) -> Option<NodeId> {
        if self.op == Operation::Branch {
            self.inputs.first().copied()
        } else {
            None
        }
    }

    /// Literal integer payload, if this is an integer `CONSTANT`.
    pub fn literal(&self) -> Option<i64> {
        match (self.op, &self.imm) {
            (Operation::Constant, Some(Immediate::Int(v))) => Some(*v),
            _ => None,
        }
    }
}

/// Where a block lives, for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockContext {
    pub module: String,
    pub function: String,
    pub block: String,
}

/// The dependency DAG of one basic block.
#[derive(Clone, Debug, Default)]
pub struct BlockDag {
    nodes: Vec<DagNode>,
    context: BlockContext,
}

impl BlockDag {
    pub fn new(context: BlockContext) -> Self {
        Self {
            nodes: Vec::new(),
            context,
        }
    }

    /// Append a node. Inputs and chains may name nodes that are added
    /// later; nothing downstream relies on id order.
    pub fn push(&mut self, node: DagNode) -> NodeId {
        let id = NodeId::new(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &DagNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(|i| NodeId::new(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &DagNode)> {
        self.ids().zip(self.nodes.iter())
    }

    #[inline]
    pub fn context(&self) -> &BlockContext {
        &self.context
    }
}

/// Externally inferred types of the values a block produces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeMap {
    types: FxHashMap<ValueId, ValueType>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: ValueId, ty: ValueType) {
        self.types.insert(value, ty);
    }

    #[inline]
    pub fn get(&self, value: ValueId) -> Option<ValueType> {
        self.types.get(&value).copied()
    }

    /// Type of the value a node yields; `None` for terminators and
    /// values the map does not know.
    pub fn of_node(&self, node: &DagNode) -> Option<ValueType> {
        node.value().and_then(|v| self.get(v))
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Builds a [`BlockDag`] together with its [`TypeMap`].
///
/// Value ids are allocated sequentially, so `%N` names in output are
/// stable for a given construction order.
pub struct DagBuilder {
    dag: BlockDag,
    types: TypeMap,
    next_value: u32,
}

impl DagBuilder {
    pub fn new(context: BlockContext) -> Self {
        Self {
            dag: BlockDag::new(context),
            types: TypeMap::new(),
            next_value: 0,
        }
    }

    fn fresh_value(&mut self, ty: ValueType) -> ValueId {
        let value = ValueId::new(self.next_value);
        self.next_value += 1;
        self.types.insert(value, ty);
        value
    }

    /// Add a producer node.
    pub fn producer(
        &mut self,
        op: Operation,
        ty: ValueType,
        inputs: &[NodeId],
        imm: Option<Immediate>,
        chain: Option<NodeId>,
    ) -> NodeId {
        debug_assert_eq!(op.info().shape, NodeShape::Producer, "{op} is not a producer");
        let value = self.fresh_value(ty);
        self.dag.push(DagNode {
            op,
            kind: NodeKind::Producer { value },
            inputs: inputs.iter().copied().collect(),
            chain,
            imm,
        })
    }

    /// Add a terminator node.
    pub fn terminator(
        &mut self,
        op: Operation,
        inputs: &[NodeId],
        targets: &[&str],
        imm: Option<Immediate>,
        chain: Option<NodeId>,
    ) -> NodeId {
        debug_assert_eq!(op.info().shape, NodeShape::Terminator, "{op} is not a terminator");
        self.dag.push(DagNode {
            op,
            kind: NodeKind::Terminator {
                targets: targets.iter().map(|t| (*t).to_owned()).collect(),
            },
            inputs: inputs.iter().copied().collect(),
            chain,
            imm,
        })
    }

    /// Add a block-local function argument.
    pub fn arg(&mut self, index: u32, ty: ValueType) -> NodeId {
        self.producer(Operation::Arg, ty, &[], Some(Immediate::Arg(index)), None)
    }

    /// Add an integer literal.
    pub fn int(&mut self, value: i64, ty: ValueType) -> NodeId {
        self.producer(Operation::Constant, ty, &[], Some(Immediate::Int(value)), None)
    }

    /// Add a global's address (a link-time constant).
    pub fn global(&mut self, symbol: &str) -> NodeId {
        self.producer(
            Operation::Constant,
            ValueType::POINTER,
            &[],
            Some(Immediate::Symbol(symbol.to_owned())),
            None,
        )
    }

    /// Add a binary or unary producer.
    pub fn op(&mut self, op: Operation, ty: ValueType, inputs: &[NodeId]) -> NodeId {
        self.producer(op, ty, inputs, None, None)
    }

    pub fn load(&mut self, ty: ValueType, address: NodeId, chain: Option<NodeId>) -> NodeId {
        self.producer(Operation::Load, ty, &[address], None, chain)
    }

    pub fn store(&mut self, address: NodeId, value: NodeId, chain: Option<NodeId>) -> NodeId {
        self.terminator(Operation::Store, &[address, value], &[], None, chain)
    }

    pub fn finish(self) -> (BlockDag, TypeMap) {
        (self.dag, self.types)
    }
}
