//! Half-width slices of operands (`.lo` / `.hi`).

use tessel_ir::{AsmPart, Half};

use crate::errors::SubstError;

fn cannot_split(part: &AsmPart) -> SubstError {
    SubstError::CannotSplit {
        part: part.to_string(),
    }
}

/// Sign-extend the low `bits` bits of `raw`.
fn sign_extend(raw: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

/// Take one half of a value, temporary or typed constant.
///
/// Constants fold: the low half of the `I64` constant `0x1_0000_0002` is
/// the `I32` constant `2`. Link-time symbols, registers and already-halved
/// operands cannot be split.
pub fn slice(part: &AsmPart, half: Half) -> Result<AsmPart, SubstError> {
    match part {
        AsmPart::Value {
            value,
            ty,
            half: None,
        } => {
            let ty = ty.half().ok_or_else(|| cannot_split(part))?;
            Ok(AsmPart::Value {
                value: *value,
                ty,
                half: Some(half),
            })
        }
        AsmPart::Temp { id, ty, half: None } => {
            let ty = ty.half().ok_or_else(|| cannot_split(part))?;
            Ok(AsmPart::Temp {
                id: *id,
                ty,
                half: Some(half),
            })
        }
        AsmPart::Imm {
            value,
            ty: Some(ty),
        } => {
            let narrow = ty.half().ok_or_else(|| cannot_split(part))?;
            let raw = (*value as u64) & ty.mask();
            let bits = narrow.bits();
            let raw = match half {
                Half::Low => raw & narrow.mask(),
                Half::High => (raw >> bits) & narrow.mask(),
            };
            Ok(AsmPart::Imm {
                value: sign_extend(raw, bits),
                ty: Some(narrow),
            })
        }
        _ => Err(cannot_split(part)),
    }
}
