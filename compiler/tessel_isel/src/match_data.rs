//! Match records.

use std::collections::{BTreeMap, BTreeSet};

use tessel_ir::NodeId;
use tessel_patterns::Pattern;

/// The result of matching one pattern at one node.
///
/// Subpattern identifiers map to *every* alternative that matched there;
/// the instantiator expands that ambiguity. `covered` and `inputs` hold
/// only this pattern's own nodes; subpattern nodes live in the submatches.
#[derive(Clone, Debug)]
pub struct MatchData<'p> {
    pub pattern: &'p Pattern,
    pub root: NodeId,
    pub bindings: BTreeMap<String, NodeId>,
    pub submatches: BTreeMap<String, Vec<MatchData<'p>>>,
    pub covered: BTreeSet<NodeId>,
    pub inputs: BTreeSet<NodeId>,
}

impl<'p> MatchData<'p> {
    pub fn new(pattern: &'p Pattern, root: NodeId) -> Self {
        Self {
            pattern,
            root,
            bindings: BTreeMap::new(),
            submatches: BTreeMap::new(),
            covered: BTreeSet::new(),
            inputs: BTreeSet::new(),
        }
    }

    /// A candidate copy to try an alternative on. Discard it on failure.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Adopt a candidate that matched.
    pub fn commit(&mut self, candidate: Self) {
        *self = candidate;
    }

    /// The node `ident` resolves to: the root of its first submatch, or
    /// the node bound to it.
    pub fn resolve(&self, ident: &str) -> Option<NodeId> {
        self.submatches
            .get(ident)
            .and_then(|alts| alts.first())
            .map(|m| m.root)
            .or_else(|| self.bindings.get(ident).copied())
    }
}
