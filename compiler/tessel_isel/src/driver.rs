//! Per-node tile selection over whole blocks.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tessel_ir::{BlockDag, NodeId, Operation, TypeMap};
use tessel_patterns::PatternTables;
use tracing::{debug, trace};

use crate::config::SelectConfig;
use crate::context::BlockCx;
use crate::errors::CoverageError;
use crate::instantiate::{Instantiation, Instantiations};
use crate::intrinsics;
use crate::matcher::Matcher;
use crate::tile::Tile;
use crate::validate::validate;

/// Every node of a block with its legal tiles. Each list is non-empty.
pub type BlockTiles = BTreeMap<NodeId, Vec<Tile>>;

/// Selects tiles against a fixed set of pattern tables.
pub struct Selector<'t> {
    tables: &'t PatternTables,
    config: SelectConfig,
}

impl<'t> Selector<'t> {
    pub fn new(tables: &'t PatternTables, config: SelectConfig) -> Self {
        Self { tables, config }
    }

    pub fn config(&self) -> &SelectConfig {
        &self.config
    }

    /// Tiles for every node of one block.
    ///
    /// # Errors
    ///
    /// Fails on the first node that neither an intrinsic nor any pattern
    /// covers.
    pub fn select_block(
        &self,
        dag: &BlockDag,
        types: &TypeMap,
    ) -> Result<BlockTiles, CoverageError> {
        let cx = BlockCx::new(dag, types);
        let mut result = BlockTiles::new();
        for id in dag.ids() {
            let tiles = self.select_node(&cx, id);
            if tiles.is_empty() {
                return Err(CoverageError::new(dag, id));
            }
            result.insert(id, tiles);
        }
        debug!(
            function = %dag.context().function,
            block = %dag.context().block,
            nodes = dag.len(),
            "block selected"
        );
        Ok(result)
    }

    /// Blocks are independent, so they are selected in parallel.
    ///
    /// # Errors
    ///
    /// Any block's [`CoverageError`] fails the whole function.
    pub fn select_function(
        &self,
        blocks: &[(BlockDag, TypeMap)],
    ) -> Result<Vec<BlockTiles>, CoverageError> {
        blocks
            .par_iter()
            .map(|(dag, types)| self.select_block(dag, types))
            .collect()
    }

    /// Tiles for one node: intrinsics first, then every candidate pattern.
    /// Possibly empty.
    pub fn select_node(&self, cx: &BlockCx<'_>, id: NodeId) -> Vec<Tile> {
        let node = cx.node(id);
        let mut tiles = Vec::new();

        for tile in intrinsics::lower(cx, id).into_iter().flatten() {
            self.offer(cx, &mut tiles, tile);
        }

        let stored_value = match node.op {
            Operation::Store => node.inputs.get(1).map(|&value| cx.node(value).op),
            _ => None,
        };
        let matcher = Matcher::new(self.tables, cx);
        for pattern in self.tables.candidates(node.op, stored_value) {
            if self.config.is_full(tiles.len()) {
                break;
            }
            if !pattern.produces_instructions() {
                continue;
            }
            let Some(data) = matcher.match_pattern(id, pattern) else {
                continue;
            };
            for inst in Instantiations::new(cx, &data) {
                if self.config.is_full(tiles.len()) {
                    break;
                }
                self.offer(cx, &mut tiles, Instantiation::into_tile(inst));
            }
        }

        debug!(node = %id, op = %node.op, tiles = tiles.len(), "node selected");
        tiles
    }

    /// Keep `tile` unless the node is full, the tile is invalid, or an
    /// equivalent tile is already kept.
    fn offer(&self, cx: &BlockCx<'_>, tiles: &mut Vec<Tile>, tile: Tile) {
        if self.config.is_full(tiles.len()) {
            trace!(%tile, "tile cap reached");
            return;
        }
        if let Err(reason) = validate(&tile, cx) {
            trace!(%tile, %reason, "rejected tile");
            return;
        }
        if self.config.dedup && tiles.iter().any(|kept| kept.same_lowering(&tile)) {
            trace!(%tile, "duplicate tile");
            return;
        }
        tiles.push(tile);
    }
}
