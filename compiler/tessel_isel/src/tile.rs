//! Tiles: the selector's output.

use std::collections::BTreeSet;
use std::fmt;

use tessel_ir::{AsmPart, NodeId};

/// Operations lowered by a fixed rule instead of a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    Arg,
    Constant,
    Slot,
    Select,
    /// `SELECT` fused with the comparison producing its condition.
    SelectCompare,
    Call,
    Jump,
    Branch,
    Return,
    Entry,
}

/// Where a tile came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TileSource {
    Intrinsic(IntrinsicKind),
    Pattern { group: String, ordinal: usize },
}

impl fmt::Display for TileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileSource::Intrinsic(kind) => write!(f, "intrinsic {kind:?}"),
            TileSource::Pattern { group, ordinal } => write!(f, "{group}#{ordinal}"),
        }
    }
}

/// A validated, fully substituted lowering of the subtree rooted at `root`.
///
/// `covered` nodes are computed by the tile; `inputs` are produced by other
/// tiles and only read here. Tiles are never mutated after selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub root: NodeId,
    pub covered: BTreeSet<NodeId>,
    pub inputs: BTreeSet<NodeId>,
    pub parts: Vec<AsmPart>,
    pub source: TileSource,
}

impl Tile {
    /// The parts rendered one per line, for display and tests.
    pub fn asm(&self) -> Vec<String> {
        self.parts.iter().map(ToString::to_string).collect()
    }

    /// Same lowering regardless of where it came from.
    pub fn same_lowering(&self, other: &Tile) -> bool {
        self.parts == other.parts && self.covered == other.covered && self.inputs == other.inputs
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]:", self.root, self.source)?;
        for (i, part) in self.parts.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { "; " })?;
            write!(f, "{part}")?;
        }
        Ok(())
    }
}
