//! Structural matching of patterns against DAG subtrees.
//!
//! Matching is all-or-nothing per attempt. A failed attempt leaves garbage
//! only in the [`MatchData`] it was given, and every such record is either
//! a fresh one (top level, subpattern alternative) or a fork (commutative
//! retry) that the caller drops on failure.
//!
//! # Backreferences
//!
//! A backreference matches by node *identity*, not by structure: it
//! succeeds only on the very node the referenced identifier matched. This
//! assumes common-subexpression elimination already merged equal subtrees;
//! without it, `(SUB x x)`-style patterns miss structurally equal operands.

use tessel_ir::{NodeId, Operation};
use tessel_patterns::{Pattern, PatternNode, PatternTables};
use tracing::trace;

use crate::context::BlockCx;
use crate::match_data::MatchData;
use crate::stack::ensure_sufficient_stack;

pub struct Matcher<'a> {
    tables: &'a PatternTables,
    cx: &'a BlockCx<'a>,
}

impl<'a> Matcher<'a> {
    pub fn new(tables: &'a PatternTables, cx: &'a BlockCx<'a>) -> Self {
        Self { tables, cx }
    }

    /// Match `pattern` rooted at `node`.
    pub fn match_pattern(&self, node: NodeId, pattern: &'a Pattern) -> Option<MatchData<'a>> {
        let mut data = MatchData::new(pattern, node);
        if self.try_match(node, &pattern.root, &mut data) {
            Some(data)
        } else {
            trace!(%node, group = %pattern.group, ordinal = pattern.ordinal, "no match");
            None
        }
    }

    /// Match one pattern node against `node`, recording into `data`.
    pub fn try_match(
        &self,
        node: NodeId,
        pat: &'a PatternNode,
        data: &mut MatchData<'a>,
    ) -> bool {
        ensure_sufficient_stack(|| self.try_match_inner(node, pat, data))
    }

    fn try_match_inner(
        &self,
        node: NodeId,
        pat: &'a PatternNode,
        data: &mut MatchData<'a>,
    ) -> bool {
        let dag_node = self.cx.node(node);
        if let Some(required) = pat.required_type() {
            if self.cx.type_of(node) != Some(required) {
                return false;
            }
        }

        match pat {
            PatternNode::Node { ident, op, args, .. } => {
                if dag_node.op != *op {
                    return false;
                }
                if dag_node.inputs.len() != args.len() {
                    return false;
                }

                let matched = if op.is_commutative() && args.len() == 2 {
                    self.match_commutative(&dag_node.inputs, args, data)
                } else {
                    dag_node
                        .inputs
                        .iter()
                        .zip(args)
                        .all(|(&input, arg)| self.try_match(input, arg, data))
                };
                if !matched {
                    return false;
                }

                data.covered.insert(node);
                if let Some(ident) = ident {
                    data.bindings.insert(ident.clone(), node);
                }
                true
            }

            PatternNode::Local { ident, .. } => {
                if !dag_node.is_producer() {
                    return false;
                }
                if let Some(ident) = ident {
                    data.bindings.insert(ident.clone(), node);
                }
                data.inputs.insert(node);
                true
            }

            PatternNode::Constant { ident, value, .. } => {
                if dag_node.op != Operation::Constant || !dag_node.is_producer() {
                    return false;
                }
                if let Some(required) = value {
                    if dag_node.literal() != Some(*required) {
                        return false;
                    }
                }
                if let Some(ident) = ident {
                    data.bindings.insert(ident.clone(), node);
                }
                data.covered.insert(node);
                true
            }

            PatternNode::Subpattern { ident, group } => {
                let matches: Vec<_> = self
                    .tables
                    .group(group)
                    .iter()
                    .filter_map(|alt| self.match_pattern(node, alt))
                    .collect();
                if matches.is_empty() {
                    return false;
                }
                data.submatches.insert(ident.clone(), matches);
                true
            }

            PatternNode::Backreference { ident } => data.resolve(ident) == Some(node),
        }
    }

    /// Try `(a, b)` in the given order on a fork; if that fails, `(b, a)`
    /// on a fresh fork. Only a fork that matched is committed.
    fn match_commutative(
        &self,
        inputs: &[NodeId],
        args: &'a [PatternNode],
        data: &mut MatchData<'a>,
    ) -> bool {
        let [first, second] = inputs else {
            return false;
        };
        for (x, y) in [(*first, *second), (*second, *first)] {
            let mut candidate = data.fork();
            if self.try_match(x, &args[0], &mut candidate)
                && self.try_match(y, &args[1], &mut candidate)
            {
                data.commit(candidate);
                return true;
            }
        }
        false
    }
}
