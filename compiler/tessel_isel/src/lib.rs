//! Instruction selection over block DAGs.
//!
//! For every node of a block, [`Selector`] collects the legal *tiles*:
//! ways that node and a covering subtree of its operands lower to
//! assembly parts. Choosing among them is left to the cover selector.
//!
//! Per node the pipeline is:
//!
//! 1. **Intrinsics** ([`intrinsics`]) for leaves, `SELECT`, calls and
//!    control flow.
//! 2. **Matching** ([`Matcher`]) of every candidate pattern from the
//!    [`PatternTables`](tessel_patterns::PatternTables) indexes.
//! 3. **Instantiation** ([`Instantiations`]) of each match, one tile per
//!    combination of subpattern choices.
//! 4. **Validation** ([`validate()`]) against chain ordering.
//!
//! A node left without tiles is a [`CoverageError`].

mod config;
mod context;
mod deps;
mod driver;
mod errors;
mod instantiate;
pub mod intrinsics;
mod match_data;
mod matcher;
mod slice;
mod stack;
mod tile;
mod validate;

#[cfg(test)]
mod test_helpers;

pub use config::{parse_select_options, SelectConfig};
pub use context::BlockCx;
pub use deps::DependencyMap;
pub use driver::{BlockTiles, Selector};
pub use errors::{CoverageError, SubstError};
pub use instantiate::{Instantiation, Instantiations};
pub use match_data::MatchData;
pub use matcher::Matcher;
pub use slice::slice;
pub use tile::{IntrinsicKind, Tile, TileSource};
pub use validate::{validate, Rejection};
