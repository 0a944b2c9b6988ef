//! Structural checks on instantiated tiles.
//!
//! A tile is emitted as one unit, so everything it covers executes at the
//! same point in the schedule. That is only sound when the covered nodes
//! agree on a single ordering dependency and nothing the tile reads is
//! itself ordered after part of the tile.

use tessel_ir::NodeId;

use crate::context::BlockCx;
use crate::tile::Tile;

/// Why a tile was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("top-level part `{part}` is not an instruction or label")]
    NotStandalone { part: String },
    #[error("covered nodes {nodes:?} each chain to a node outside the tile")]
    ConflictingChains { nodes: Vec<NodeId> },
    #[error("input {input} depends on {via}, which is chained into the tile")]
    ChainIntoTile { input: NodeId, via: NodeId },
}

/// Accept or reject `tile`.
pub fn validate(tile: &Tile, cx: &BlockCx<'_>) -> Result<(), Rejection> {
    if let Some(part) = tile.parts.iter().find(|p| !p.is_standalone()) {
        return Err(Rejection::NotStandalone {
            part: part.to_string(),
        });
    }

    let external: Vec<NodeId> = tile
        .covered
        .iter()
        .copied()
        .filter(|&n| {
            cx.node(n)
                .chain
                .is_some_and(|target| !tile.covered.contains(&target))
        })
        .collect();
    if external.len() > 1 {
        return Err(Rejection::ConflictingChains { nodes: external });
    }

    for &input in &tile.inputs {
        let chained_in = std::iter::once(input)
            .chain(cx.deps.of(input))
            .find(|&n| cx.node(n).chain.is_some_and(|target| tile.covered.contains(&target)));
        if let Some(via) = chained_in {
            return Err(Rejection::ChainIntoTile { input, via });
        }
    }

    Ok(())
}
