//! Compiled instruction-selection patterns.
//!
//! A [`Pattern`] pairs a tree of [`PatternNode`]s (what it matches) with a
//! template of [`AsmPart`]s (what it emits). Patterns are immutable once
//! built and shared between threads through the pattern tables.

use std::fmt;

use rustc_hash::FxHashMap;
use tessel_ir::{AsmPart, Operation, ValueType};

/// One node of a pattern tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternNode {
    /// An operation node with argument patterns, one per operand.
    Node {
        ident: Option<String>,
        ty: Option<ValueType>,
        op: Operation,
        args: Vec<PatternNode>,
    },
    /// Any producer of a compatible type, left for another tile to compute.
    Local {
        ident: Option<String>,
        ty: Option<ValueType>,
    },
    /// A `CONSTANT` producer; `value: None` matches any literal.
    Constant {
        ident: Option<String>,
        ty: Option<ValueType>,
        value: Option<i64>,
    },
    /// Try every alternative of `group` and keep all that match.
    Subpattern { ident: String, group: String },
    /// Must be the very node a previously matched identifier bound.
    Backreference { ident: String },
}

impl PatternNode {
    /// Identifier this node introduces, if any. Backreferences refer to an
    /// identifier; they do not introduce one.
    pub fn ident(&self) -> Option<&str> {
        match self {
            PatternNode::Node { ident, .. }
            | PatternNode::Local { ident, .. }
            | PatternNode::Constant { ident, .. } => ident.as_deref(),
            PatternNode::Subpattern { ident, .. } => Some(ident),
            PatternNode::Backreference { .. } => None,
        }
    }

    /// Required produced type, if the node constrains it.
    pub fn required_type(&self) -> Option<ValueType> {
        match self {
            PatternNode::Node { ty, .. }
            | PatternNode::Local { ty, .. }
            | PatternNode::Constant { ty, .. } => *ty,
            PatternNode::Subpattern { .. } | PatternNode::Backreference { .. } => None,
        }
    }

    /// Pre-order walk over this node and its arguments.
    pub fn walk(&self, f: &mut impl FnMut(&PatternNode)) {
        f(self);
        if let PatternNode::Node { args, .. } = self {
            for arg in args {
                arg.walk(f);
            }
        }
    }
}

/// A compiled conversion: pattern tree plus output template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    pub root: PatternNode,
    pub template: Vec<AsmPart>,
    /// Name of the group this pattern is an alternative of.
    pub group: String,
    /// Position within the group, counting from 0.
    pub ordinal: usize,
    idents: FxHashMap<String, PatternNode>,
}

impl Pattern {
    pub fn new(
        group: impl Into<String>,
        ordinal: usize,
        root: PatternNode,
        template: Vec<AsmPart>,
    ) -> Self {
        let mut idents = FxHashMap::default();
        root.walk(&mut |node| {
            if let Some(ident) = node.ident() {
                idents
                    .entry(ident.to_owned())
                    .or_insert_with(|| node.clone());
            }
        });
        Self {
            root,
            template,
            group: group.into(),
            ordinal,
            idents,
        }
    }

    /// Every identifier introduced by the pattern and the subtree that
    /// introduced it.
    #[inline]
    pub fn subpattern_map(&self) -> &FxHashMap<String, PatternNode> {
        &self.idents
    }

    /// Subtree that introduced `ident`.
    #[inline]
    pub fn lookup(&self, ident: &str) -> Option<&PatternNode> {
        self.idents.get(ident)
    }

    /// Whether the template can stand alone as a tile: every top-level
    /// part is an instruction or label.
    pub fn produces_instructions(&self) -> bool {
        self.template.iter().all(AsmPart::is_standalone)
    }

    /// Root operation, if the pattern is rooted at an operation node.
    pub fn root_op(&self) -> Option<Operation> {
        match &self.root {
            PatternNode::Node { op, .. } => Some(*op),
            _ => None,
        }
    }

    /// For `STORE`-rooted patterns, the operation of the stored value when
    /// the value argument is itself an operation node.
    pub fn stored_value_op(&self) -> Option<Operation> {
        match &self.root {
            PatternNode::Node {
                op: Operation::Store,
                args,
                ..
            } => match args.get(1) {
                Some(PatternNode::Node { op, .. }) => Some(*op),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A `<tmp…>` template reference: `tmp`, `tmp16`, `tmp_a`, `tmp8_lo`.
///
/// Each distinct name denotes one temporary per instantiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TempRef {
    /// Explicit width; `None` means "the root's type".
    pub width: Option<ValueType>,
}

impl TempRef {
    pub fn parse(name: &str) -> Option<TempRef> {
        let rest = name.strip_prefix("tmp")?;
        let (digits, key) = match rest.find('_') {
            Some(at) => (&rest[..at], Some(&rest[at + 1..])),
            None => (rest, None),
        };
        if key.is_some_and(str::is_empty) {
            return None;
        }
        let width = if digits.is_empty() {
            None
        } else {
            let bits: u32 = digits.parse().ok()?;
            match ValueType::from_bits(bits) {
                Some(ty) if bits >= 8 => Some(ty),
                _ => return None,
            }
        };
        Some(TempRef { width })
    }
}

/// Names that have a fixed meaning in templates and cannot be captured.
pub fn is_reserved(name: &str) -> bool {
    matches!(name, "out" | "lo" | "hi") || TempRef::parse(name).is_some()
}

// ── Display ─────────────────────────────────────────────────────────

fn write_capture(f: &mut fmt::Formatter<'_>, ident: Option<&String>) -> fmt::Result {
    match ident {
        Some(ident) => write!(f, "<{ident}> "),
        None => Ok(()),
    }
}

fn write_type(f: &mut fmt::Formatter<'_>, ty: Option<ValueType>) -> fmt::Result {
    match ty {
        Some(ty) => write!(f, "{ty} "),
        None => Ok(()),
    }
}

impl fmt::Display for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternNode::Node {
                ident, ty, op, args,
            } => {
                f.write_str("(")?;
                write_capture(f, ident.as_ref())?;
                write_type(f, *ty)?;
                write!(f, "{op}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            PatternNode::Local { ident, ty } => {
                f.write_str("(")?;
                write_capture(f, ident.as_ref())?;
                write_type(f, *ty)?;
                f.write_str("LOCAL)")
            }
            PatternNode::Constant { ident, ty, value } => {
                f.write_str("(")?;
                write_capture(f, ident.as_ref())?;
                write_type(f, *ty)?;
                f.write_str("CONSTANT")?;
                if let Some(v) = value {
                    write!(f, " {v}")?;
                }
                f.write_str(")")
            }
            PatternNode::Subpattern { ident, group } if ident == group => f.write_str(group),
            PatternNode::Subpattern { ident, group } => write!(f, "<{ident}> {group}"),
            PatternNode::Backreference { ident } => f.write_str(ident),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}: {} ->", self.group, self.ordinal, self.root)?;
        for part in &self.template {
            write!(f, " [{part}]")?;
        }
        Ok(())
    }
}
