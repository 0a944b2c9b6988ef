//! Read-only registry of compiled patterns.
//!
//! Built once, then shared by reference with every selector. Three views
//! over the same `Arc<Pattern>`s:
//!
//! - by group name, in definition order (subpattern inclusion);
//! - by root operation (candidate lookup for a node);
//! - `STORE` patterns whose stored value is itself an operation, keyed by
//!   that operation, so a store node only scans stores of its value's kind.

use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;
use tessel_ir::Operation;
use tracing::debug;

use crate::compile::compile_document;
use crate::errors::CompileError;
use crate::model::Pattern;
use crate::parse::parse_document;

/// The bundled x86 pattern set.
pub const BUILTIN_SOURCE: &str = include_str!("../patterns/x86.isel");

#[derive(Debug, Default)]
pub struct PatternTables {
    groups: FxHashMap<String, Vec<Arc<Pattern>>>,
    group_order: Vec<String>,
    by_root: FxHashMap<Operation, Vec<Arc<Pattern>>>,
    store_by_value: FxHashMap<Operation, Vec<Arc<Pattern>>>,
    len: usize,
}

impl PatternTables {
    /// Parse and compile a pattern-definition document.
    pub fn from_source(source: &str) -> Result<Self, CompileError> {
        let document = parse_document(source).map_err(CompileError::Syntax)?;
        let patterns = compile_document(&document)?;
        Ok(Self::from_patterns(patterns))
    }

    /// Index already-compiled patterns.
    ///
    /// Only patterns rooted at an operation whose template stands alone are
    /// selection candidates; every pattern stays reachable through its group.
    pub fn from_patterns(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        let mut tables = Self::default();

        for pattern in patterns {
            let pattern = Arc::new(pattern);
            tables.len += 1;

            if !tables.groups.contains_key(&pattern.group) {
                tables.group_order.push(pattern.group.clone());
            }
            tables
                .groups
                .entry(pattern.group.clone())
                .or_default()
                .push(Arc::clone(&pattern));

            let Some(root) = pattern.root_op() else {
                continue;
            };
            if !pattern.produces_instructions() {
                continue;
            }
            match pattern.stored_value_op() {
                Some(value_op) => tables
                    .store_by_value
                    .entry(value_op)
                    .or_default()
                    .push(pattern),
                None => tables.by_root.entry(root).or_default().push(pattern),
            }
        }

        debug!(
            groups = tables.group_order.len(),
            patterns = tables.len,
            rooted = tables.by_root.values().map(Vec::len).sum::<usize>(),
            stores_by_value = tables.store_by_value.values().map(Vec::len).sum::<usize>(),
            "built pattern tables"
        );
        tables
    }

    /// The bundled pattern set, compiled on first use.
    pub fn builtin() -> Result<&'static PatternTables, CompileError> {
        static BUILTIN: OnceLock<Result<PatternTables, CompileError>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| PatternTables::from_source(BUILTIN_SOURCE))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Alternatives of a group, in definition order.
    pub fn group(&self, name: &str) -> &[Arc<Pattern>] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Group names in order of first definition.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.group_order.iter().map(String::as_str)
    }

    /// Candidates rooted at `op`, excluding store-of-operation patterns.
    pub fn by_root(&self, op: Operation) -> &[Arc<Pattern>] {
        self.by_root.get(&op).map(Vec::as_slice).unwrap_or_default()
    }

    /// `STORE` patterns whose stored value is an `op` node.
    pub fn store_by_value(&self, op: Operation) -> &[Arc<Pattern>] {
        self.store_by_value.get(&op).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every pattern worth trying on a node with operation `op`.
    ///
    /// `stored_value` is the operation of the value a `STORE` writes.
    pub fn candidates(
        &self,
        op: Operation,
        stored_value: Option<Operation>,
    ) -> impl Iterator<Item = &Arc<Pattern>> {
        let stores: &[Arc<Pattern>] = match (op, stored_value) {
            (Operation::Store, Some(value_op)) => self.store_by_value(value_op),
            _ => &[],
        };
        self.by_root(op).iter().chain(stores)
    }

    /// Every pattern, grouped, in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Pattern>> {
        self.group_order.iter().flat_map(|name| self.group(name))
    }

    /// Total number of patterns.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests;
