//! Shared types for the Tessel instruction selector.
//!
//! This crate provides:
//!
//! - **Block DAG** ([`BlockDag`], [`DagNode`], [`NodeId`]) - the per-block
//!   dependency graph instruction selection consumes, with chain edges for
//!   side-effect ordering, and the externally inferred [`TypeMap`].
//! - **Operation table** ([`Operation`], [`OpInfo`]) - names, shapes,
//!   arities and commutativity, shared by the pattern compiler and the
//!   matcher.
//! - **Assembly parts** ([`AsmPart`]) - the template and output vocabulary
//!   of tiles.
//!
//! Nothing here knows about patterns; `tessel_patterns` and `tessel_isel`
//! build on these types.

pub mod asm;
pub mod dag;
pub mod op;
mod ty;

pub use asm::{AsmPart, Condition, Half, Instruction, Memory, Reference, Register};
pub use dag::{
    BlockContext, BlockDag, DagBuilder, DagNode, Immediate, NodeId, NodeKind, TypeMap, ValueId,
};
pub use op::{NodeShape, OpInfo, Operation};
pub use ty::ValueType;
