//! Value types carried by DAG producers and assembly operands.

use std::fmt;

/// Integer width of a produced value.
///
/// The selector only distinguishes widths; signedness lives in the
/// operation (`SDIV` vs `UDIV`, `SLT` vs `ULT`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    I1,
    I8,
    I16,
    I32,
    I64,
}

impl ValueType {
    /// Pointer-sized type of the target.
    pub const POINTER: ValueType = ValueType::I32;

    /// Width in bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            ValueType::I1 => 1,
            ValueType::I8 => 8,
            ValueType::I16 => 16,
            ValueType::I32 => 32,
            ValueType::I64 => 64,
        }
    }

    /// Type of a half-width slice of this type.
    ///
    /// Returns `None` for types that cannot be split (`I1`, `I8`).
    pub const fn half(self) -> Option<ValueType> {
        match self {
            ValueType::I16 => Some(ValueType::I8),
            ValueType::I32 => Some(ValueType::I16),
            ValueType::I64 => Some(ValueType::I32),
            ValueType::I1 | ValueType::I8 => None,
        }
    }

    /// Look up a type by bit width.
    pub const fn from_bits(bits: u32) -> Option<ValueType> {
        match bits {
            1 => Some(ValueType::I1),
            8 => Some(ValueType::I8),
            16 => Some(ValueType::I16),
            32 => Some(ValueType::I32),
            64 => Some(ValueType::I64),
            _ => None,
        }
    }

    /// Parse the upper-case spelling used in pattern files (`I32`).
    pub fn from_name(name: &str) -> Option<ValueType> {
        match name {
            "I1" => Some(ValueType::I1),
            "I8" => Some(ValueType::I8),
            "I16" => Some(ValueType::I16),
            "I32" => Some(ValueType::I32),
            "I64" => Some(ValueType::I64),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ValueType::I1 => "I1",
            ValueType::I8 => "I8",
            ValueType::I16 => "I16",
            ValueType::I32 => "I32",
            ValueType::I64 => "I64",
        }
    }

    /// Mask selecting the low `bits()` bits of a 64-bit word.
    #[inline]
    pub const fn mask(self) -> u64 {
        match self {
            ValueType::I64 => u64::MAX,
            other => (1u64 << other.bits()) - 1,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
