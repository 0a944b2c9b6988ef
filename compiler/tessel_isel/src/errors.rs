//! Selection errors.

use tessel_ir::{BlockDag, NodeId, Operation};

/// A node no intrinsic and no pattern could cover.
///
/// Fatal for the enclosing function: there is no legal lowering of the
/// block without a tile for every node.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error(
    "no tile covers node {node} ({op}) in block `{block}` of function `{function}` \
     in module `{module}`"
)]
pub struct CoverageError {
    pub node: NodeId,
    pub op: Operation,
    pub block: String,
    pub function: String,
    pub module: String,
}

impl CoverageError {
    pub fn new(dag: &BlockDag, node: NodeId) -> Self {
        let context = dag.context();
        Self {
            node,
            op: dag.node(node).op,
            block: context.block.clone(),
            function: context.function.clone(),
            module: context.module.clone(),
        }
    }
}

/// Why one combination of a template substitution was dropped.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubstError {
    #[error("`{ident}` is not bound in the match")]
    Unbound { ident: String },
    #[error("`{ident}` names no identifier of pattern `{group}`")]
    UnknownIdentifier { ident: String, group: String },
    #[error("`{ident}` is not a subpattern, so `.{member}` cannot be selected")]
    NotASubpattern { ident: String, member: String },
    #[error("`{ident}` has no chosen instantiation")]
    NoInstantiation { ident: String },
    #[error("output of `{ident}` has {parts} parts; only single-part outputs are operands")]
    MultiPartOperand { ident: String, parts: usize },
    #[error("node {node} yields no typed value")]
    NoValue { node: NodeId },
    #[error("cannot take a half of `{part}`")]
    CannotSplit { part: String },
    #[error("temporaries are only visible in their own template")]
    NestedTemporary,
    #[error("invalid memory operand `{part}`: {reason}")]
    InvalidMemory { part: String, reason: &'static str },
}
