//! Assembly-like parts produced by instruction selection.
//!
//! [`AsmPart`] serves two roles:
//!
//! - **Templates**: pattern authors write parts that may contain
//!   [`AsmPart::Reference`] placeholders naming pattern identifiers.
//! - **Output**: substitution replaces every reference with a concrete
//!   [`AsmPart::Value`], [`AsmPart::Temp`], [`AsmPart::Imm`],
//!   [`AsmPart::Symbol`] or a nested part from a subpattern.
//!
//! The matcher never invents parts; it only substitutes into templates.

use std::fmt;

use smallvec::SmallVec;

use crate::dag::ValueId;
use crate::ty::ValueType;

/// Which half of a split value an operand refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Half {
    Low,
    High,
}

impl Half {
    pub const fn suffix(self) -> &'static str {
        match self {
            Half::Low => "lo",
            Half::High => "hi",
        }
    }
}

/// Condition code attached to conditional instructions (`J`, `SET`, `CMOV`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    B,
    Be,
    A,
    Ae,
}

impl Condition {
    pub fn from_name(name: &str) -> Option<Condition> {
        Some(match name {
            "eq" | "e" => Condition::Eq,
            "ne" => Condition::Ne,
            "lt" | "l" => Condition::Lt,
            "le" => Condition::Le,
            "gt" | "g" => Condition::Gt,
            "ge" => Condition::Ge,
            "b" => Condition::B,
            "be" => Condition::Be,
            "a" => Condition::A,
            "ae" => Condition::Ae,
            _ => return None,
        })
    }

    /// Mnemonic suffix (`JNE`, `SETL`, `CMOVAE`).
    pub const fn suffix(self) -> &'static str {
        match self {
            Condition::Eq => "E",
            Condition::Ne => "NE",
            Condition::Lt => "L",
            Condition::Le => "LE",
            Condition::Gt => "G",
            Condition::Ge => "GE",
            Condition::B => "B",
            Condition::Be => "BE",
            Condition::A => "A",
            Condition::Ae => "AE",
        }
    }
}

/// Machine register, interned against a fixed table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Register(&'static str);

impl Register {
    const TABLE: [&'static str; 24] = [
        "eax", "ebx", "ecx", "edx", "esi", "edi", "ebp", "esp", // 32-bit
        "ax", "bx", "cx", "dx", "si", "di", "bp", "sp", // 16-bit
        "al", "bl", "cl", "dl", "ah", "bh", "ch", "dh", // 8-bit
    ];

    pub const EAX: Register = Register("eax");
    pub const EDX: Register = Register("edx");
    pub const ESP: Register = Register("esp");
    pub const EBP: Register = Register("ebp");

    /// Resolve a register name; `None` if the name is not a register.
    pub fn from_name(name: &str) -> Option<Register> {
        Self::TABLE
            .into_iter()
            .find(|r| *r == name)
            .map(Register)
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

/// An instruction with at most two operands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub mnemonic: String,
    pub condition: Option<Condition>,
    pub operands: Vec<AsmPart>,
}

impl Instruction {
    pub fn new(mnemonic: impl Into<String>, operands: impl IntoIterator<Item = AsmPart>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            condition: None,
            operands: operands.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Memory operand: `[base + index*scale + offset]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Memory {
    pub base: Option<Box<AsmPart>>,
    pub index: Option<Box<AsmPart>>,
    /// 1, 2, 4 or 8.
    pub scale: u8,
    pub offset: Option<Box<AsmPart>>,
}

impl Memory {
    pub fn base(part: AsmPart) -> Self {
        Self {
            base: Some(Box::new(part)),
            scale: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_offset(mut self, part: AsmPart) -> Self {
        self.offset = Some(Box::new(part));
        self
    }

    #[must_use]
    pub fn with_index(mut self, part: AsmPart, scale: u8) -> Self {
        self.index = Some(Box::new(part));
        self.scale = scale;
        self
    }

    /// A memory form holding only a (possibly scaled) index: what the
    /// indexed-addressing shorthand `<i>*4` compiles to.
    pub fn is_scaled_index(&self) -> bool {
        self.index.is_some() && self.base.is_none() && self.offset.is_none()
    }

    /// A memory form holding exactly one base component and nothing else.
    pub fn is_lone_base(&self) -> bool {
        self.base.is_some() && self.index.is_none() && self.offset.is_none()
    }
}

/// Reference to a pattern identifier inside a template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Dotted identifier chain; the first element names an identifier of
    /// the pattern, later elements walk into subpattern captures.
    pub path: SmallVec<[String; 2]>,
    pub half: Option<Half>,
    pub ty: Option<ValueType>,
}

impl Reference {
    pub fn new(path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            half: None,
            ty: None,
        }
    }

    /// First identifier of the chain.
    pub fn head(&self) -> &str {
        self.path.first().map_or("", String::as_str)
    }
}

/// A templated or concrete assembly part.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AsmPart {
    Instruction(Instruction),
    Label(String),
    Memory(Memory),
    /// Template-only placeholder.
    Reference(Reference),
    Register(Register),
    /// A value produced by a DAG node (a virtual register).
    Value {
        value: ValueId,
        ty: ValueType,
        half: Option<Half>,
    },
    /// A temporary allocated during template substitution.
    Temp {
        id: u32,
        ty: ValueType,
        half: Option<Half>,
    },
    /// Compile-time constant.
    Imm { value: i64, ty: Option<ValueType> },
    /// Link-time constant.
    Symbol(String),
}

impl AsmPart {
    /// Whether this part may stand alone at the top level of a tile.
    #[inline]
    pub fn is_standalone(&self) -> bool {
        matches!(self, AsmPart::Instruction(_) | AsmPart::Label(_))
    }

    /// Whether this part names storage (register, value or temporary).
    pub fn is_register_like(&self) -> bool {
        matches!(
            self,
            AsmPart::Register(_) | AsmPart::Value { .. } | AsmPart::Temp { .. }
        )
    }

    /// Whether this part is a compile- or link-time constant.
    pub fn is_constant(&self) -> bool {
        matches!(self, AsmPart::Imm { .. } | AsmPart::Symbol(_))
    }

    pub fn imm(value: i64) -> Self {
        AsmPart::Imm { value, ty: None }
    }

    pub fn value(value: ValueId, ty: ValueType) -> Self {
        AsmPart::Value {
            value,
            ty,
            half: None,
        }
    }
}

// ── Display ─────────────────────────────────────────────────────────

fn write_half(f: &mut fmt::Formatter<'_>, half: Option<Half>) -> fmt::Result {
    match half {
        Some(h) => write!(f, ".{}", h.suffix()),
        None => Ok(()),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic)?;
        if let Some(cond) = self.condition {
            f.write_str(cond.suffix())?;
        }
        for (i, op) in self.operands.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{op}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        let mut first = true;
        if let Some(base) = &self.base {
            write!(f, "{base}")?;
            first = false;
        }
        if let Some(index) = &self.index {
            if !first {
                f.write_str(" + ")?;
            }
            write!(f, "{index}")?;
            if self.scale != 1 {
                write!(f, "*{}", self.scale)?;
            }
            first = false;
        }
        if let Some(offset) = &self.offset {
            match offset.as_ref() {
                AsmPart::Imm { value, .. } if *value < 0 && !first => {
                    write!(f, " - {}", value.unsigned_abs())?;
                }
                other => {
                    if !first {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{other}")?;
                }
            }
        }
        f.write_str("]")
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.path.join("."))?;
        write_half(f, self.half)?;
        if let Some(ty) = self.ty {
            write!(f, ":{ty}")?;
        }
        f.write_str(">")
    }
}

impl fmt::Display for AsmPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmPart::Instruction(inst) => write!(f, "{inst}"),
            AsmPart::Label(name) => write!(f, "@{name}"),
            AsmPart::Memory(mem) => write!(f, "{mem}"),
            AsmPart::Reference(r) => write!(f, "{r}"),
            AsmPart::Register(r) => f.write_str(r.name()),
            AsmPart::Value { value, half, .. } => {
                write!(f, "{value}")?;
                write_half(f, *half)
            }
            AsmPart::Temp { id, half, .. } => {
                write!(f, "t{id}")?;
                write_half(f, *half)
            }
            AsmPart::Imm { value, .. } => write!(f, "{value}"),
            AsmPart::Symbol(name) => f.write_str(name),
        }
    }
}
