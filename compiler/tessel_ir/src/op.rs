//! Operation tags and their static shape table.
//!
//! The table answers the questions the pattern compiler and matcher ask
//! about an operation: its canonical name, whether it yields a value, how
//! many inputs a pattern may match against, and whether those inputs
//! commute.

use std::fmt;

/// Whether nodes with this operation yield a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeShape {
    /// Yields a named, typed value.
    Producer,
    /// Consumes values without yielding one (stores, void calls, branches).
    Terminator,
}

/// Static description of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpInfo {
    pub name: &'static str,
    pub shape: NodeShape,
    /// Number of inputs a pattern matches against.
    ///
    /// `None` marks variadic shapes that only intrinsics lower.
    pub arity: Option<usize>,
    pub commutative: bool,
}

/// Operation tag of a DAG node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    // Leaf producers
    Arg,
    Constant,
    Slot,

    // Memory
    Load,

    // Binary arithmetic
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Sar,

    // Unary
    Neg,
    Not,
    ZExt,
    SExt,
    Trunc,

    // Comparisons (yield I1)
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,

    // Variadic producers
    Select,
    Call,

    // Terminators
    Store,
    CallVoid,
    Jump,
    Branch,
    Return,
    Entry,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Operation; 40] = [
        Operation::Arg,
        Operation::Constant,
        Operation::Slot,
        Operation::Load,
        Operation::Add,
        Operation::Sub,
        Operation::Mul,
        Operation::SDiv,
        Operation::UDiv,
        Operation::SRem,
        Operation::URem,
        Operation::And,
        Operation::Or,
        Operation::Xor,
        Operation::Shl,
        Operation::Shr,
        Operation::Sar,
        Operation::Neg,
        Operation::Not,
        Operation::ZExt,
        Operation::SExt,
        Operation::Trunc,
        Operation::Eq,
        Operation::Ne,
        Operation::Slt,
        Operation::Sle,
        Operation::Sgt,
        Operation::Sge,
        Operation::Ult,
        Operation::Ule,
        Operation::Ugt,
        Operation::Uge,
        Operation::Select,
        Operation::Call,
        Operation::Store,
        Operation::CallVoid,
        Operation::Jump,
        Operation::Branch,
        Operation::Return,
        Operation::Entry,
    ];

    /// Shape table lookup.
    pub const fn info(self) -> OpInfo {
        use NodeShape::{Producer, Terminator};

        const fn op(
            name: &'static str,
            shape: NodeShape,
            arity: Option<usize>,
            commutative: bool,
        ) -> OpInfo {
            OpInfo {
                name,
                shape,
                arity,
                commutative,
            }
        }

        match self {
            Operation::Arg => op("ARG", Producer, Some(0), false),
            Operation::Constant => op("CONSTANT", Producer, Some(0), false),
            Operation::Slot => op("SLOT", Producer, Some(0), false),
            Operation::Load => op("LOAD", Producer, Some(1), false),
            Operation::Add => op("ADD", Producer, Some(2), true),
            Operation::Sub => op("SUB", Producer, Some(2), false),
            Operation::Mul => op("MUL", Producer, Some(2), true),
            Operation::SDiv => op("SDIV", Producer, Some(2), false),
            Operation::UDiv => op("UDIV", Producer, Some(2), false),
            Operation::SRem => op("SREM", Producer, Some(2), false),
            Operation::URem => op("UREM", Producer, Some(2), false),
            Operation::And => op("AND", Producer, Some(2), true),
            Operation::Or => op("OR", Producer, Some(2), true),
            Operation::Xor => op("XOR", Producer, Some(2), true),
            Operation::Shl => op("SHL", Producer, Some(2), false),
            Operation::Shr => op("SHR", Producer, Some(2), false),
            Operation::Sar => op("SAR", Producer, Some(2), false),
            Operation::Neg => op("NEG", Producer, Some(1), false),
            Operation::Not => op("NOT", Producer, Some(1), false),
            Operation::ZExt => op("ZEXT", Producer, Some(1), false),
            Operation::SExt => op("SEXT", Producer, Some(1), false),
            Operation::Trunc => op("TRUNC", Producer, Some(1), false),
            Operation::Eq => op("EQ", Producer, Some(2), true),
            Operation::Ne => op("NE", Producer, Some(2), true),
            Operation::Slt => op("SLT", Producer, Some(2), false),
            Operation::Sle => op("SLE", Producer, Some(2), false),
            Operation::Sgt => op("SGT", Producer, Some(2), false),
            Operation::Sge => op("SGE", Producer, Some(2), false),
            Operation::Ult => op("ULT", Producer, Some(2), false),
            Operation::Ule => op("ULE", Producer, Some(2), false),
            Operation::Ugt => op("UGT", Producer, Some(2), false),
            Operation::Uge => op("UGE", Producer, Some(2), false),
            Operation::Select => op("SELECT", Producer, None, false),
            Operation::Call => op("CALL", Producer, None, false),
            Operation::Store => op("STORE", Terminator, Some(2), false),
            Operation::CallVoid => op("CALLV", Terminator, None, false),
            Operation::Jump => op("JUMP", Terminator, Some(0), false),
            Operation::Branch => op("BRANCH", Terminator, Some(1), false),
            Operation::Return => op("RETURN", Terminator, None, false),
            Operation::Entry => op("ENTRY", Terminator, Some(0), false),
        }
    }

    /// Resolve the canonical upper-case name used in pattern files.
    pub fn from_name(name: &str) -> Option<Operation> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        self.info().name
    }

    #[inline]
    pub const fn arity(self) -> Option<usize> {
        self.info().arity
    }

    #[inline]
    pub const fn is_commutative(self) -> bool {
        self.info().commutative
    }

    #[inline]
    pub fn is_producer(self) -> bool {
        self.info().shape == NodeShape::Producer
    }

    /// Whether this is one of the comparison operations.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Operation::Eq
                | Operation::Ne
                | Operation::Slt
                | Operation::Sle
                | Operation::Sgt
                | Operation::Sge
                | Operation::Ult
                | Operation::Ule
                | Operation::Ugt
                | Operation::Uge
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
